//! The gix-backed implementation of [`Repository`].

use std::collections::BTreeSet;
use std::path::Path;

use gix::bstr::ByteSlice;
use gix::revision::walk::Sorting;
use gix::traverse::commit::simple::CommitTimeOrder;

use crate::error::GitError;
use crate::repo::{CommitWalk, Repository};
use crate::types::{CommitNode, GitOid, TreeEntry};

/// A [`Repository`] implementation backed by
/// [gix](https://github.com/GitoxideLabs/gitoxide).
///
/// Construct via [`GixRepository::open`].
pub struct GixRepository {
    repo: gix::Repository,
}

impl GixRepository {
    /// Open the git repository at or above `path`.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = gix::open(path).map_err(|e| GitError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::debug!(git_dir = %repo.git_dir().display(), "opened repository");
        Ok(Self { repo })
    }
}

/// Convert our `GitOid` to a `gix::ObjectId`.
fn to_gix_oid(oid: GitOid) -> gix::ObjectId {
    gix::ObjectId::from_bytes_or_panic(oid.as_bytes())
}

/// Convert a `gix::ObjectId` to our `GitOid`.
fn from_gix_oid(oid: gix::ObjectId) -> GitOid {
    let bytes: [u8; 20] = oid.as_bytes().try_into().expect("SHA1 is 20 bytes");
    GitOid::from_bytes(bytes)
}

impl Repository for GixRepository {
    fn tracked_files(&self) -> Result<BTreeSet<String>, GitError> {
        let index = self.repo.open_index().map_err(|e| GitError::Backend {
            message: format!("failed to open index: {e}"),
        })?;

        // Non-UTF-8 paths are skipped rather than mangled; they cannot be
        // represented in the output mapping anyway.
        let files = index
            .entries()
            .iter()
            .filter_map(|entry| entry.path(&index).to_str().ok().map(ToOwned::to_owned))
            .collect();

        Ok(files)
    }

    fn head_id(&self) -> Result<GitOid, GitError> {
        let id = self.repo.head_id().map_err(|e| GitError::NotFound {
            message: format!("HEAD: {e}"),
        })?;
        Ok(from_gix_oid(id.detach()))
    }

    fn tree_entries(&self, oid: GitOid) -> Result<Option<Vec<TreeEntry>>, GitError> {
        let gix_oid = to_gix_oid(oid);
        let Some(object) = self
            .repo
            .try_find_object(gix_oid)
            .map_err(|e| GitError::Backend {
                message: format!("object {oid}: {e}"),
            })?
        else {
            return Ok(None);
        };
        if object.kind != gix::object::Kind::Tree {
            return Ok(None);
        }

        let tree = object.into_tree();
        let mut entries = Vec::new();
        for result in tree.iter() {
            let entry = result.map_err(|e| GitError::Backend {
                message: format!("failed to decode entry of tree {oid}: {e}"),
            })?;
            let oid_bytes: [u8; 20] = entry
                .inner
                .oid
                .as_bytes()
                .try_into()
                .expect("SHA1 is 20 bytes");
            entries.push(TreeEntry {
                name: entry.inner.filename.to_string(),
                is_tree: matches!(entry.inner.mode.kind(), gix::objs::tree::EntryKind::Tree),
                oid: GitOid::from_bytes(oid_bytes),
            });
        }
        Ok(Some(entries))
    }

    fn tree_of(&self, commit: GitOid) -> Result<Option<GitOid>, GitError> {
        let gix_oid = to_gix_oid(commit);
        let Some(object) = self
            .repo
            .try_find_object(gix_oid)
            .map_err(|e| GitError::Backend {
                message: format!("object {commit}: {e}"),
            })?
        else {
            return Ok(None);
        };
        if object.kind != gix::object::Kind::Commit {
            return Ok(None);
        }

        let tree_id = object
            .into_commit()
            .tree_id()
            .map_err(|e| GitError::Backend {
                message: format!("failed to decode commit {commit}: {e}"),
            })?;
        Ok(Some(from_gix_oid(tree_id.detach())))
    }

    fn commits(&self) -> Result<CommitWalk<'_>, GitError> {
        let head = self.repo.head_id().map_err(|e| GitError::NotFound {
            message: format!("HEAD: {e}"),
        })?;

        let walk = self
            .repo
            .rev_walk(Some(head.detach()))
            .sorting(Sorting::ByCommitTime(CommitTimeOrder::NewestFirst))
            .all()
            .map_err(|e| GitError::Backend {
                message: format!("failed to start commit walk: {e}"),
            })?;

        Ok(Box::new(walk.map(|item| {
            let info = item.map_err(|e| GitError::Backend {
                message: format!("commit walk: {e}"),
            })?;
            let commit = info.object().map_err(|e| GitError::Backend {
                message: format!("commit {}: {e}", info.id),
            })?;
            let seconds = commit
                .time()
                .map_err(|e| GitError::Backend {
                    message: format!("failed to decode time of commit {}: {e}", info.id),
                })?
                .seconds;
            let tree = commit.tree_id().map_err(|e| GitError::Backend {
                message: format!("failed to decode tree of commit {}: {e}", info.id),
            })?;
            Ok(CommitNode {
                id: from_gix_oid(info.id),
                seconds,
                tree: from_gix_oid(tree.detach()),
                parents: info.parent_ids.iter().map(|id| from_gix_oid(*id)).collect(),
            })
        })))
    }
}
