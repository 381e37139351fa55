//! The set of paths still waiting for attribution, stored as a trie.
//!
//! The walker's central question is "does this subtree still contain
//! anything I care about?", asked once per changed tree entry on every
//! commit. The trie keeps a flat cache from directory prefix to node so the
//! answer is a single hash lookup, and removing the last file under a deep
//! prefix collapses every newly-empty ancestor out of the cache — which is
//! what lets the tree diff prune whole branches on all later commits.
//!
//! Nodes live in an arena and point at their parents by index, so the
//! upward collapse needs no reference-counted cycle. Slots of collapsed
//! nodes are not reclaimed; the tree only shrinks within a run.

use std::collections::{HashMap, HashSet};

use crate::path::TreePath;

struct Node {
    name: TreePath,
    parent: Option<usize>,
    files: HashSet<String>,
    folders: HashMap<String, usize>,
}

/// A trie over the remaining target paths with O(1) prefix containment.
pub struct PrefixTree {
    nodes: Vec<Node>,
    /// Flat cache: directory prefix → arena index. A prefix is "live" iff it
    /// is a key here; the tree as a whole is empty iff the cache is.
    cache: HashMap<TreePath, usize>,
}

impl PrefixTree {
    /// An empty tree. Nothing is live until [`fill`](Self::fill) runs —
    /// not even the root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: TreePath::root(),
                parent: None,
                files: HashSet::new(),
                folders: HashMap::new(),
            }],
            cache: HashMap::new(),
        }
    }

    /// Insert `/`-separated paths, creating folder nodes for every directory
    /// prefix and registering each visited node (the root included) in the
    /// flat cache.
    pub fn fill<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            let full = TreePath::from_slash(path.as_ref());
            let Some((dir, file)) = full.split_last() else {
                continue;
            };

            self.cache.insert(TreePath::root(), 0);
            let mut idx = 0;
            let mut prefix = TreePath::root();
            for component in dir.components() {
                prefix = prefix.child(component);
                let existing = self.nodes[idx].folders.get(component).copied();
                idx = if let Some(child) = existing {
                    child
                } else {
                    let child = self.nodes.len();
                    self.nodes.push(Node {
                        name: prefix.clone(),
                        parent: Some(idx),
                        files: HashSet::new(),
                        folders: HashMap::new(),
                    });
                    self.nodes[idx].folders.insert(component.clone(), child);
                    self.cache.insert(prefix.clone(), child);
                    child
                };
            }
            self.nodes[idx].files.insert(file.to_owned());
        }
    }

    /// Does this directory prefix still contain any remaining path?
    #[must_use]
    pub fn contains(&self, prefix: &TreePath) -> bool {
        self.cache.contains_key(prefix)
    }

    /// `true` once every path has been removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Remove `file` from the folder at `prefix`.
    ///
    /// Returns `false` when the prefix is not live or the file is not
    /// present — the caller uses this to tell "a path we wanted" apart from
    /// incidental churn in the same directory. When the removal empties the
    /// node, collapse upward until a non-empty ancestor is reached.
    pub fn remove(&mut self, prefix: &TreePath, file: &str) -> bool {
        let Some(&idx) = self.cache.get(prefix) else {
            return false;
        };
        if !self.nodes[idx].files.remove(file) {
            return false;
        }
        self.collapse(idx);
        true
    }

    fn collapse(&mut self, mut idx: usize) {
        loop {
            let node = &self.nodes[idx];
            if !node.files.is_empty() || !node.folders.is_empty() {
                break;
            }
            let name = node.name.clone();
            let parent = node.parent;
            self.cache.remove(&name);
            let Some(parent_idx) = parent else {
                break;
            };
            if let Some(last) = name.components().last() {
                self.nodes[parent_idx].folders.remove(last);
            }
            idx = parent_idx;
        }
    }
}

impl Default for PrefixTree {
    fn default() -> Self {
        Self::new()
    }
}
