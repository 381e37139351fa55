//! Working-tree symlink expansion.
//!
//! Git tracks a symlink as a little blob holding the target path, so the
//! history walk only ever sees the link itself change — retargeting it —
//! never the content behind it. For output purposes the more useful answer
//! is usually "when did the file the link points at last change". This
//! module finds, for every kept target file that is a symlink into the same
//! repository, the regular files reachable through it, and describes each as
//! a virtual entry: the path as spelled through the link, the label to use
//! in the output, and the real repository path whose history should be
//! consulted.
//!
//! Links resolving outside the repository are ignored, as are dangling
//! ones. Nested symlinks are followed, with a visited set so link cycles
//! terminate.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::times::TargetFile;

/// A file reachable through a symlink, to be attributed via its target.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct LinkedFile {
    /// Repository path as spelled through the link (e.g. `five/four`).
    pub link_path: String,
    /// Subtree-relative label for the output mapping.
    pub relpath: String,
    /// Repository path of the real file (e.g. `three/four`) — the path the
    /// walker actually attributes.
    pub target_path: String,
}

/// Expand every symlink among `use_files` into virtual entries for the
/// regular files behind it.
#[must_use]
pub fn expand(root: &Path, use_files: &[TargetFile]) -> Vec<LinkedFile> {
    let Ok(canonical_root) = root.canonicalize() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for file in use_files {
        let full = root.join(&file.repo_path);
        let Ok(metadata) = fs::symlink_metadata(&full) else {
            continue;
        };
        if !metadata.file_type().is_symlink() {
            continue;
        }
        // Dangling links and links leaving the repository are not ours to
        // expand.
        let Ok(target) = full.canonicalize() else {
            continue;
        };
        let Ok(target_rel) = target.strip_prefix(&canonical_root) else {
            debug!(link = %file.repo_path, "symlink leaves the repository, ignoring");
            continue;
        };

        if target.is_dir() {
            let mut visited = HashSet::from([target.clone()]);
            walk(&canonical_root, &target, file, "", &mut visited, &mut out);
        } else if target.is_file() {
            out.push(LinkedFile {
                link_path: file.repo_path.clone(),
                relpath: file.relpath.clone(),
                target_path: slash(target_rel),
            });
        }
    }
    out.sort();
    out
}

fn walk(
    root: &Path,
    dir: &Path,
    origin: &TargetFile,
    subpath: &str,
    visited: &mut HashSet<PathBuf>,
    out: &mut Vec<LinkedFile>,
) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == ".git" {
            continue;
        }
        let child = if subpath.is_empty() {
            name
        } else {
            format!("{subpath}/{name}")
        };
        let path = entry.path();
        // Follows links, so a symlinked dir walks like a dir and a dangling
        // link drops out here.
        let Ok(metadata) = fs::metadata(&path) else {
            continue;
        };
        if metadata.is_dir() {
            let Ok(canonical) = path.canonicalize() else {
                continue;
            };
            if visited.insert(canonical.clone()) {
                walk(root, &canonical, origin, &child, visited, out);
            }
        } else if metadata.is_file() {
            let Ok(canonical) = path.canonicalize() else {
                continue;
            };
            let Ok(target_rel) = canonical.strip_prefix(root) else {
                continue;
            };
            out.push(LinkedFile {
                link_path: format!("{}/{child}", origin.repo_path),
                relpath: if origin.relpath.is_empty() || origin.relpath == "." {
                    child
                } else {
                    format!("{}/{child}", origin.relpath)
                },
                target_path: slash(target_rel),
            });
        }
    }
}

/// Render a relative path with forward slashes regardless of platform.
fn slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
