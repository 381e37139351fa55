//! The orchestrator: from a repository and a subtree to the final mapping.
//!
//! [`GitTimes`] wires the pieces together. It lists the tracked files,
//! re-labels them relative to the considered subtree, applies the glob
//! filters, expands symlinks into virtual targets, consults the attribution
//! cache, and — when the cache cannot answer — drives the history walk and
//! records its result for next time.

use std::collections::BTreeMap;
use std::path::PathBuf;

use gitmit_git::{GixRepository, Repository};
use tracing::{debug, info, instrument};

use crate::cache;
use crate::error::Error;
use crate::filter::PathFilter;
use crate::symlinks::{self, LinkedFile};
use crate::walker::FileCommitTimes;

/// A tracked file selected for attribution: its path in the repository and
/// its label relative to the considered subtree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetFile {
    /// Path from the repository root, `/`-separated.
    pub repo_path: String,
    /// Path relative to the subtree; `""` when the file *is* the subtree.
    pub relpath: String,
}

/// Computes `subtree-relative path → last-change epoch seconds` for a
/// repository.
pub struct GitTimes {
    root_folder: PathBuf,
    parent_dir: String,
    timestamps_for: Vec<String>,
    include: Vec<String>,
    exclude: Vec<String>,
    with_cache: bool,
}

impl GitTimes {
    /// Attribute files under `parent_dir` within the repository at
    /// `root_folder`. Pass `"."` (or `""`) to consider the whole repository.
    pub fn new(root_folder: impl Into<PathBuf>, parent_dir: impl Into<String>) -> Self {
        Self {
            root_folder: root_folder.into(),
            parent_dir: parent_dir.into(),
            timestamps_for: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            with_cache: true,
        }
    }

    /// Require every path to match one of these globs.
    #[must_use]
    pub fn timestamps_for(mut self, patterns: Vec<String>) -> Self {
        self.timestamps_for = patterns;
        self
    }

    /// Whitelist globs; see [`PathFilter`] for precedence.
    #[must_use]
    pub fn include(mut self, patterns: Vec<String>) -> Self {
        self.include = patterns;
        self
    }

    /// Globs to drop. Exclusion beats inclusion.
    #[must_use]
    pub fn exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude = patterns;
        self
    }

    /// Whether to read and write the on-disk attribution cache.
    #[must_use]
    pub fn with_cache(mut self, with_cache: bool) -> Self {
        self.with_cache = with_cache;
        self
    }

    /// Open the repository and compute the mapping.
    #[instrument(skip(self), fields(root = %self.root_folder.display(), subtree = %self.parent_dir))]
    pub fn find(&self) -> Result<BTreeMap<String, i64>, Error> {
        let repo = GixRepository::open(&self.root_folder)?;
        self.find_in(&repo)
    }

    /// Compute the mapping against an already-open repository.
    pub fn find_in(&self, repo: &dyn Repository) -> Result<BTreeMap<String, i64>, Error> {
        let filter = PathFilter::new(&self.timestamps_for, &self.include, &self.exclude)?;

        let mut use_files = Vec::new();
        for repo_path in repo.tracked_files()? {
            let relpath = self.relpath_for(&repo_path);
            if !filter.is_filtered(&relpath) {
                use_files.push(TargetFile { repo_path, relpath });
            }
        }
        let linked = symlinks::expand(&self.root_folder, &use_files);
        debug!(
            files = use_files.len(),
            linked = linked.len(),
            "selected targets"
        );

        self.commit_times_for(repo, &use_files, &linked)
    }

    fn commit_times_for(
        &self,
        repo: &dyn Repository,
        use_files: &[TargetFile],
        linked: &[LinkedFile],
    ) -> Result<BTreeMap<String, i64>, Error> {
        let head = repo.head_id()?.to_string();

        // Which output labels each walked repository path serves. One path
        // can serve several: a file in scope and a symlink pointing at it.
        let mut labels: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for file in use_files {
            labels
                .entry(file.repo_path.as_str())
                .or_default()
                .push(file.relpath.as_str());
        }
        for link in linked {
            labels
                .entry(link.target_path.as_str())
                .or_default()
                .push(link.relpath.as_str());
        }

        let mut sorted_relpaths: Vec<String> = use_files
            .iter()
            .map(|f| f.relpath.clone())
            .chain(linked.iter().map(|l| l.relpath.clone()))
            .collect();
        sorted_relpaths.sort();

        if self.with_cache {
            if let Some((commit, cached)) =
                cache::get(&self.root_folder, &self.parent_dir, &sorted_relpaths)
            {
                if commit == head {
                    debug!("attribution cache answers for current HEAD");
                    return Ok(relabel(&labels, &cached));
                }
                debug!(cached = %commit, "attribution cache is for an older HEAD");
            }
        }

        let targets: Vec<&str> = labels.keys().copied().collect();
        let mut attributed: BTreeMap<String, i64> = BTreeMap::new();
        let mut attributing_commits = 0usize;
        for record in FileCommitTimes::new(repo, targets)? {
            let record = record?;
            attributing_commits += 1;
            for path in &record.paths {
                attributed.insert(path.to_string(), record.seconds);
            }
        }
        info!(
            paths = attributed.len(),
            commits = attributing_commits,
            "history walk finished"
        );

        if self.with_cache {
            cache::set(
                &self.root_folder,
                &self.parent_dir,
                &head,
                &attributed,
                &sorted_relpaths,
            );
        }
        Ok(relabel(&labels, &attributed))
    }

    /// `path` relative to the considered subtree, as a pure computation over
    /// `/`-separated components. The subtree itself maps to `""`; paths
    /// outside it gain `../` segments (and are filtered out later).
    fn relpath_for(&self, path: &str) -> String {
        if self.parent_dir.is_empty() || self.parent_dir == "." {
            return path.to_owned();
        }
        let parent: Vec<&str> = self
            .parent_dir
            .split('/')
            .filter(|c| !c.is_empty() && *c != ".")
            .collect();
        let parts: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        let common = parent
            .iter()
            .zip(&parts)
            .take_while(|(a, b)| a == b)
            .count();

        let mut pieces: Vec<&str> = vec![".."; parent.len() - common];
        pieces.extend(&parts[common..]);
        pieces.join("/")
    }
}

/// Translate attributed repository paths into output labels, dropping the
/// empty label (the subtree root is not a file).
fn relabel(
    labels: &BTreeMap<&str, Vec<&str>>,
    attributed: &BTreeMap<String, i64>,
) -> BTreeMap<String, i64> {
    let mut out = BTreeMap::new();
    for (repo_path, seconds) in attributed {
        let Some(relpaths) = labels.get(repo_path.as_str()) else {
            continue;
        };
        for relpath in relpaths {
            if !relpath.is_empty() {
                out.insert((*relpath).to_owned(), *seconds);
            }
        }
    }
    out
}
