//! Error types for git operations.
//!
//! [`GitError`] is the single error type returned by all
//! [`Repository`](crate::Repository) trait methods. Callers that walk
//! history treat [`GitError::NotFound`] leniently — a tree that cannot be
//! resolved reads as empty — while open failures are fatal.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`Repository`](crate::Repository) operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The repository could not be opened at all.
    #[error("cannot open git repository at {}: {message}", path.display())]
    Open {
        /// The path that was tried.
        path: PathBuf,
        /// Details from the backend.
        message: String,
    },

    /// A requested object or ref was not found.
    #[error("not found: {message}")]
    NotFound {
        /// Human-readable description of what was missing.
        message: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The underlying git backend returned an unclassified error.
    ///
    /// The catch-all for errors that don't fit other variants. The `message`
    /// should include enough context to diagnose the failure.
    #[error("git backend error: {message}")]
    Backend {
        /// Freeform error description from the backend.
        message: String,
    },
}
