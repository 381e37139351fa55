//! gitmit library crate — per-file commit times from git history.
//!
//! For every file tracked in a repository (optionally restricted to a
//! subtree), find the commit time of the newest commit that changed it. The
//! primary interface is the `gitmit` CLI binary; the library entry point is
//! [`GitTimes`].

pub mod cache;
pub mod error;
pub mod filter;
pub mod path;
pub mod prefix_tree;
pub mod symlinks;
pub mod telemetry;
pub mod times;
pub mod walker;

pub use error::Error;
pub use times::{GitTimes, TargetFile};
pub use walker::{CommitRecord, FileCommitTimes};
