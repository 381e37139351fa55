//! The history walker: attribute every target path to the newest commit
//! that changed it.
//!
//! Commits arrive from the repository newest-first. For each commit the
//! walker diffs the commit's tree against the union of its parents' trees,
//! level by level, descending only into subtrees that (a) changed and
//! (b) still contain unattributed paths. A changed blob whose path is still
//! wanted is a definitive attribution: that file was last touched here.
//!
//! Two properties carry the performance:
//!
//! - the [`PrefixTree`] of remaining paths prunes unchanged and finished
//!   subtrees in O(1) per entry, and the walk stops outright once it is
//!   empty — no further commits are fetched;
//! - entry sets are memoized per `(prefix, tree oid)` and shared by `Arc`,
//!   so merge commits that reach the same tree through several parents pay
//!   for it once.
//!
//! Merge semantics: an entry counts as changed only when its
//! `(path, is_tree, oid)` triple appears under the commit but under none of
//! its parents. A merge that introduces no content of its own therefore
//! attributes nothing. The `is_tree` flag is part of the identity on
//! purpose — replacing a file with a directory (or back) is a change even
//! when nothing else moved, and a blob parent is never recursed into.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use gitmit_git::{CommitNode, CommitWalk, GitError, GitOid, Repository};
use tracing::debug;

use crate::path::TreePath;
use crate::prefix_tree::PrefixTree;

/// One entry of a tree at some commit, with its path extended by the
/// subtree prefix it was found under.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PathEntry {
    /// Full path of the entry from the repository root.
    pub path: TreePath,
    /// Whether the entry is a subtree. Part of the identity: a blob and a
    /// tree at the same path are different entries.
    pub is_tree: bool,
    /// Object id of the entry.
    pub oid: GitOid,
}

/// The children of one subtree at one commit.
pub type EntrySet = HashSet<PathEntry>;

/// A commit that attributed at least one target path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitRecord {
    /// The commit's oid.
    pub id: GitOid,
    /// Committer time, seconds since the unix epoch.
    pub seconds: i64,
    /// The target paths first changed at this commit.
    pub paths: Vec<TreePath>,
}

/// Pull-based iterator over the commits that attribute target paths.
///
/// Yields one [`CommitRecord`] per commit that changed at least one
/// still-wanted path; commits that change nothing of interest are skipped
/// silently. Iteration ends as soon as every target is attributed or
/// history runs out, whichever comes first.
pub struct FileCommitTimes<'a> {
    repo: &'a dyn Repository,
    commits: CommitWalk<'a>,
    remaining: PrefixTree,
    entries: HashMap<(TreePath, GitOid), Arc<EntrySet>>,
    empty: Arc<EntrySet>,
    visited: usize,
}

impl<'a> FileCommitTimes<'a> {
    /// Start a walk for the given `/`-separated target paths.
    pub fn new<I, S>(repo: &'a dyn Repository, targets: I) -> Result<Self, GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut remaining = PrefixTree::new();
        remaining.fill(targets);
        let commits = repo.commits()?;
        Ok(Self {
            repo,
            commits,
            remaining,
            entries: HashMap::new(),
            empty: Arc::new(EntrySet::new()),
            visited: 0,
        })
    }

    /// The prefixed entry set of the tree at `oid`, memoized per
    /// `(prefix, oid)` for the lifetime of the walk.
    ///
    /// Objects that are missing, are not trees, or fail to decode all read
    /// as the shared empty set — oddities deep in history degrade to "no
    /// entries here" rather than aborting the run.
    fn entry_set(&mut self, prefix: &TreePath, oid: GitOid) -> Arc<EntrySet> {
        let key = (prefix.clone(), oid);
        if let Some(cached) = self.entries.get(&key) {
            return Arc::clone(cached);
        }

        let set = match self.repo.tree_entries(oid) {
            Ok(Some(children)) => Arc::new(
                children
                    .into_iter()
                    .map(|entry| PathEntry {
                        path: prefix.child(&entry.name),
                        is_tree: entry.is_tree,
                        oid: entry.oid,
                    })
                    .collect(),
            ),
            Ok(None) => Arc::clone(&self.empty),
            Err(error) => {
                debug!(%oid, %error, "unreadable tree treated as empty");
                Arc::clone(&self.empty)
            }
        };
        self.entries.insert(key, Arc::clone(&set));
        set
    }

    /// Diff the tree at `current` against the union of `parents` at
    /// `prefix`: returns the union of the parents' entries plus the entries
    /// whose triple appears under `current` but under no parent.
    ///
    /// A prefix with no remaining targets short-circuits to nothing.
    fn diff_at(
        &mut self,
        prefix: &TreePath,
        current: GitOid,
        parents: &[GitOid],
    ) -> (Arc<EntrySet>, Vec<PathEntry>) {
        if !self.remaining.contains(prefix) {
            return (Arc::clone(&self.empty), Vec::new());
        }

        let parent_entries = match parents {
            [] => Arc::clone(&self.empty),
            [parent] => self.entry_set(prefix, *parent),
            many => {
                let mut union = EntrySet::new();
                for parent in many {
                    union.extend(self.entry_set(prefix, *parent).iter().cloned());
                }
                Arc::new(union)
            }
        };

        let current_entries = self.entry_set(prefix, current);
        let changes: Vec<PathEntry> = current_entries
            .difference(&parent_entries)
            .cloned()
            .collect();
        (parent_entries, changes)
    }

    /// Process one commit: walk its changed entries top-down and remove
    /// every attributed path from the remaining set.
    fn attribute(&mut self, commit: &CommitNode) -> Vec<TreePath> {
        let mut parent_trees = Vec::with_capacity(commit.parents.len());
        for parent in &commit.parents {
            match self.repo.tree_of(*parent) {
                Ok(Some(tree)) => parent_trees.push(tree),
                Ok(None) => debug!(commit = %parent, "parent without a tree, skipping"),
                Err(error) => debug!(commit = %parent, %error, "unreadable parent, skipping"),
            }
        }

        let mut attributed = Vec::new();
        let mut queue: VecDeque<(Vec<PathEntry>, Arc<EntrySet>)> = VecDeque::new();
        let (parent_entries, changes) = self.diff_at(&TreePath::root(), commit.tree, &parent_trees);
        queue.push_back((changes, parent_entries));

        while let Some((changes, parent_entries)) = queue.pop_front() {
            for entry in changes {
                if entry.is_tree {
                    if self.remaining.contains(&entry.path) {
                        // Only parents that still are trees at this path may
                        // seed the next level; a blob parent would poison
                        // the recursion.
                        let parent_trees: Vec<GitOid> = parent_entries
                            .iter()
                            .filter(|p| p.is_tree && p.path == entry.path)
                            .map(|p| p.oid)
                            .collect();
                        let (deeper_parents, deeper_changes) =
                            self.diff_at(&entry.path, entry.oid, &parent_trees);
                        queue.push_back((deeper_changes, deeper_parents));
                    }
                } else if let Some((dir, file)) = entry.path.split_last() {
                    if self.remaining.remove(&dir, file) {
                        attributed.push(entry.path.clone());
                        if self.remaining.is_empty() {
                            return attributed;
                        }
                    }
                }
            }
        }
        attributed
    }
}

impl Iterator for FileCommitTimes<'_> {
    type Item = Result<CommitRecord, GitError>;

    fn next(&mut self) -> Option<Self::Item> {
        // Checked before every fetch: once the remaining set is empty no
        // further commit is pulled from the repository.
        while !self.remaining.is_empty() {
            let commit = match self.commits.next()? {
                Ok(commit) => commit,
                Err(error) => return Some(Err(error)),
            };
            self.visited += 1;
            if self.visited % 1000 == 0 {
                debug!(commits = self.visited, "still walking history");
            }

            let paths = self.attribute(&commit);
            if !paths.is_empty() {
                return Some(Ok(CommitRecord {
                    id: commit.id,
                    seconds: commit.seconds,
                    paths,
                }));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::BTreeSet;

    use gitmit_git::TreeEntry;

    use super::*;

    // -- An in-memory repository double ------------------------------------

    #[derive(Default)]
    struct FakeRepository {
        commits: Vec<CommitNode>,
        trees: HashMap<GitOid, Vec<TreeEntry>>,
        commit_trees: HashMap<GitOid, GitOid>,
        broken_trees: HashSet<GitOid>,
        fetched: Cell<usize>,
    }

    impl FakeRepository {
        fn push_commit(&mut self, id: GitOid, seconds: i64, tree: GitOid, parents: Vec<GitOid>) {
            self.commit_trees.insert(id, tree);
            self.commits.push(CommitNode {
                id,
                seconds,
                tree,
                parents,
            });
        }
    }

    impl Repository for FakeRepository {
        fn tracked_files(&self) -> Result<BTreeSet<String>, GitError> {
            Ok(BTreeSet::new())
        }

        fn head_id(&self) -> Result<GitOid, GitError> {
            Ok(self.commits.first().map_or(oid(0), |c| c.id))
        }

        fn tree_entries(&self, tree: GitOid) -> Result<Option<Vec<TreeEntry>>, GitError> {
            if self.broken_trees.contains(&tree) {
                return Err(GitError::Backend {
                    message: format!("tree {tree} is corrupt"),
                });
            }
            Ok(self.trees.get(&tree).cloned())
        }

        fn tree_of(&self, commit: GitOid) -> Result<Option<GitOid>, GitError> {
            Ok(self.commit_trees.get(&commit).copied())
        }

        fn commits(&self) -> Result<CommitWalk<'_>, GitError> {
            Ok(Box::new(self.commits.iter().map(move |commit| {
                self.fetched.set(self.fetched.get() + 1);
                Ok(commit.clone())
            })))
        }
    }

    // -- Construction helpers ----------------------------------------------

    fn oid(n: u8) -> GitOid {
        GitOid::from_bytes([n; 20])
    }

    fn blob(name: &str, n: u8) -> TreeEntry {
        TreeEntry {
            name: name.to_owned(),
            is_tree: false,
            oid: oid(n),
        }
    }

    fn tree(name: &str, n: u8) -> TreeEntry {
        TreeEntry {
            name: name.to_owned(),
            is_tree: true,
            oid: oid(n),
        }
    }

    fn paths(record: &CommitRecord) -> Vec<String> {
        let mut out: Vec<String> = record.paths.iter().map(ToString::to_string).collect();
        out.sort();
        out
    }

    fn collect(repo: &FakeRepository, targets: &[&str]) -> Vec<CommitRecord> {
        FileCommitTimes::new(repo, targets.iter().copied())
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    /// Five commits, oldest to newest:
    /// `two` → `one` → `three/four` → `five` → `six`+`seven`.
    fn linear_history() -> FakeRepository {
        let mut repo = FakeRepository::default();
        repo.trees.insert(oid(31), vec![blob("four", 3)]);
        repo.trees.insert(oid(11), vec![blob("two", 1)]);
        repo.trees
            .insert(oid(12), vec![blob("two", 1), blob("one", 2)]);
        repo.trees.insert(
            oid(13),
            vec![blob("two", 1), blob("one", 2), tree("three", 31)],
        );
        repo.trees.insert(
            oid(14),
            vec![
                blob("two", 1),
                blob("one", 2),
                tree("three", 31),
                blob("five", 4),
            ],
        );
        repo.trees.insert(
            oid(15),
            vec![
                blob("two", 1),
                blob("one", 2),
                tree("three", 31),
                blob("five", 4),
                blob("six", 5),
                blob("seven", 6),
            ],
        );

        // Newest first, the order the walk produces.
        repo.push_commit(oid(25), 1_459_036_362, oid(15), vec![oid(24)]);
        repo.push_commit(oid(24), 1_459_034_839, oid(14), vec![oid(23)]);
        repo.push_commit(oid(23), 1_459_034_833, oid(13), vec![oid(22)]);
        repo.push_commit(oid(22), 1_459_034_798, oid(12), vec![oid(21)]);
        repo.push_commit(oid(21), 1_459_034_782, oid(11), vec![]);
        repo
    }

    // -- Attribution over linear history -----------------------------------

    #[test]
    fn yields_commit_oid_time_and_changed_paths() {
        let repo = linear_history();
        let records = collect(
            &repo,
            &["five", "three/four", "one", "two", "seven", "six"],
        );

        let summary: Vec<(GitOid, i64, Vec<String>)> = records
            .iter()
            .map(|r| (r.id, r.seconds, paths(r)))
            .collect();
        assert_eq!(
            summary,
            vec![
                (oid(25), 1_459_036_362, vec!["seven".to_owned(), "six".to_owned()]),
                (oid(24), 1_459_034_839, vec!["five".to_owned()]),
                (oid(23), 1_459_034_833, vec!["three/four".to_owned()]),
                (oid(22), 1_459_034_798, vec!["one".to_owned()]),
                (oid(21), 1_459_034_782, vec!["two".to_owned()]),
            ]
        );
    }

    #[test]
    fn stops_fetching_once_every_target_is_attributed() {
        let repo = linear_history();
        let records = collect(&repo, &["three/four"]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, oid(23));
        assert_eq!(paths(&records[0]), vec!["three/four".to_owned()]);
        // The two newer commits were examined, the two older ones never
        // requested.
        assert_eq!(repo.fetched.get(), 3);
    }

    #[test]
    fn only_wanted_paths_are_yielded() {
        let repo = linear_history();
        let records = collect(&repo, &["three/four", "six", "two"]);

        let summary: Vec<(GitOid, Vec<String>)> =
            records.iter().map(|r| (r.id, paths(r))).collect();
        assert_eq!(
            summary,
            vec![
                (oid(25), vec!["six".to_owned()]),
                (oid(23), vec!["three/four".to_owned()]),
                (oid(21), vec!["two".to_owned()]),
            ]
        );
    }

    #[test]
    fn empty_target_set_fetches_nothing() {
        let repo = linear_history();
        let records = collect(&repo, &[]);
        assert!(records.is_empty());
        assert_eq!(repo.fetched.get(), 0);
    }

    // -- Merge semantics ----------------------------------------------------

    /// Root `r` adds `a`; branch `p2` adds `b`; mainline `p1` adds `c`;
    /// merge `m` joins them.
    fn merged_history(merge_tree: GitOid) -> FakeRepository {
        let mut repo = FakeRepository::default();
        repo.trees.insert(oid(41), vec![blob("a", 1)]);
        repo.trees.insert(oid(42), vec![blob("a", 1), blob("b", 2)]);
        repo.trees.insert(oid(43), vec![blob("a", 1), blob("c", 3)]);
        repo.trees.insert(
            oid(44),
            vec![blob("a", 1), blob("b", 2), blob("c", 3)],
        );
        repo.trees.insert(
            oid(45),
            vec![blob("a", 1), blob("b", 2), blob("c", 3), blob("d", 4)],
        );

        repo.push_commit(oid(54), 4_000, merge_tree, vec![oid(53), oid(52)]);
        repo.push_commit(oid(53), 3_000, oid(43), vec![oid(51)]);
        repo.push_commit(oid(52), 2_000, oid(42), vec![oid(51)]);
        repo.push_commit(oid(51), 1_000, oid(41), vec![]);
        repo
    }

    #[test]
    fn merge_without_new_content_attributes_nothing() {
        let repo = merged_history(oid(44));
        let records = collect(&repo, &["a", "b", "c"]);

        let summary: Vec<(GitOid, Vec<String>)> =
            records.iter().map(|r| (r.id, paths(r))).collect();
        assert_eq!(
            summary,
            vec![
                (oid(53), vec!["c".to_owned()]),
                (oid(52), vec!["b".to_owned()]),
                (oid(51), vec!["a".to_owned()]),
            ]
        );
    }

    #[test]
    fn merge_with_new_content_attributes_exactly_the_new_paths() {
        let repo = merged_history(oid(45));
        let records = collect(&repo, &["a", "b", "c", "d"]);

        assert_eq!(records[0].id, oid(54));
        assert_eq!(records[0].seconds, 4_000);
        assert_eq!(paths(&records[0]), vec!["d".to_owned()]);
        // Pre-existing paths keep their original commits.
        let rest: Vec<GitOid> = records[1..].iter().map(|r| r.id).collect();
        assert_eq!(rest, vec![oid(53), oid(52), oid(51)]);
    }

    // -- File/directory replacement ----------------------------------------

    #[test]
    fn blob_replaced_by_tree_descends_without_a_parent_tree() {
        let mut repo = FakeRepository::default();
        repo.trees.insert(oid(31), vec![blob("inner", 5)]);
        repo.trees
            .insert(oid(11), vec![blob("other", 1), blob("thing", 9)]);
        repo.trees
            .insert(oid(12), vec![blob("other", 1), tree("thing", 31)]);
        repo.push_commit(oid(22), 2_000, oid(12), vec![oid(21)]);
        repo.push_commit(oid(21), 1_000, oid(11), vec![]);

        let records = collect(&repo, &["other", "thing/inner"]);
        let summary: Vec<(GitOid, Vec<String>)> =
            records.iter().map(|r| (r.id, paths(r))).collect();
        assert_eq!(
            summary,
            vec![
                (oid(22), vec!["thing/inner".to_owned()]),
                (oid(21), vec!["other".to_owned()]),
            ]
        );
    }

    #[test]
    fn tree_replaced_by_blob_is_attributed_to_the_replacing_commit() {
        let mut repo = FakeRepository::default();
        repo.trees.insert(oid(31), vec![blob("inner", 5)]);
        repo.trees
            .insert(oid(11), vec![blob("other", 1), tree("thing", 31)]);
        repo.trees
            .insert(oid(12), vec![blob("other", 1), blob("thing", 9)]);
        repo.push_commit(oid(22), 2_000, oid(12), vec![oid(21)]);
        repo.push_commit(oid(21), 1_000, oid(11), vec![]);

        let records = collect(&repo, &["other", "thing"]);
        let summary: Vec<(GitOid, Vec<String>)> =
            records.iter().map(|r| (r.id, paths(r))).collect();
        assert_eq!(
            summary,
            vec![
                (oid(22), vec!["thing".to_owned()]),
                (oid(21), vec!["other".to_owned()]),
            ]
        );
    }

    // -- Degraded objects ---------------------------------------------------

    #[test]
    fn unreadable_subtree_degrades_to_no_attribution() {
        let mut repo = FakeRepository::default();
        repo.trees.insert(oid(11), vec![tree("sub", 31), blob("a", 1)]);
        repo.push_commit(oid(21), 1_000, oid(11), vec![]);
        repo.broken_trees.insert(oid(31));

        // `sub/x` can never be attributed; `a` still is. No error escapes.
        let records = collect(&repo, &["sub/x", "a"]);
        assert_eq!(records.len(), 1);
        assert_eq!(paths(&records[0]), vec!["a".to_owned()]);
    }

    #[test]
    fn missing_parent_commit_reads_as_rootlike() {
        // A grafted parent that cannot be resolved contributes no entries,
        // so everything in the child reads as changed there.
        let mut repo = FakeRepository::default();
        repo.trees.insert(oid(11), vec![blob("a", 1)]);
        repo.push_commit(oid(21), 1_000, oid(11), vec![oid(99)]);

        let records = collect(&repo, &["a"]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, oid(21));
    }
}
