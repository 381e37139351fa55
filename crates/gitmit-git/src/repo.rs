//! The [`Repository`] trait — the read-only view of a git repository that
//! history attribution is computed from.
//!
//! The gitmit core never touches a git library directly; it programs against
//! this trait. Besides keeping the backend swappable, that makes the walker
//! testable against an in-memory repository double — including assertions
//! about *how many* commits were fetched, which is how the early-termination
//! guarantee is verified.

use std::collections::BTreeSet;

use crate::error::GitError;
use crate::types::{CommitNode, GitOid, TreeEntry};

/// A pull-based stream of commits, newest first.
///
/// Items are fetched lazily: a consumer that stops asking stops the
/// underlying traversal.
pub type CommitWalk<'a> = Box<dyn Iterator<Item = Result<CommitNode, GitError>> + 'a>;

/// Read-only repository access.
///
/// # Object safety
///
/// The trait is object-safe: callers hold a `&dyn Repository`.
pub trait Repository {
    /// Every path currently tracked by the index, as `/`-separated strings
    /// relative to the repository root.
    ///
    /// Files deleted in the working tree but still in the index are
    /// included; files whose deletion has been staged are not. The latter is
    /// a documented limitation of reading the index rather than HEAD's tree.
    fn tracked_files(&self) -> Result<BTreeSet<String>, GitError>;

    /// The commit HEAD currently points at.
    ///
    /// Fails when HEAD does not resolve (empty repository, broken ref).
    fn head_id(&self) -> Result<GitOid, GitError>;

    /// The immediate children of the tree object at `oid`.
    ///
    /// Returns `Ok(None)` when `oid` does not resolve to a tree — the object
    /// is missing, or it is a blob. Hard decode failures are reported as
    /// errors; the walker degrades those to "empty tree" itself.
    fn tree_entries(&self, oid: GitOid) -> Result<Option<Vec<TreeEntry>>, GitError>;

    /// The root tree of the commit at `oid`, or `None` when the object is
    /// missing or not a commit (grafted or shallow history).
    fn tree_of(&self, commit: GitOid) -> Result<Option<GitOid>, GitError>;

    /// Walk commits reachable from HEAD, newest committer time first.
    ///
    /// Commits that are topologically incomparable are ordered by committer
    /// time descending; consumers must not depend on a finer tie-break.
    fn commits(&self) -> Result<CommitWalk<'_>, GitError>;
}
