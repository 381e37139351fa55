//! Error type for the gitmit core.
//!
//! Only unrecoverable conditions surface here: a repository that cannot be
//! read, or a glob pattern that does not compile. Everything softer — cache
//! I/O, unresolvable objects deep in history, dangling symlinks — degrades
//! in place and never reaches the caller.

use thiserror::Error;

/// Errors surfaced by [`GitTimes::find`](crate::GitTimes::find).
#[derive(Debug, Error)]
pub enum Error {
    /// The repository could not be opened or walked.
    #[error(transparent)]
    Repo(#[from] gitmit_git::GitError),

    /// An include/exclude/timestamps-for glob failed to compile.
    #[error("invalid glob pattern `{pattern}`: {message}")]
    Pattern {
        /// The pattern as given on the command line.
        pattern: String,
        /// Why it did not compile.
        message: String,
    },

    /// An I/O error outside the repository itself.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
