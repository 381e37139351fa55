//! Git access layer for gitmit.
//!
//! This crate defines the [`Repository`] trait — the single interface through
//! which gitmit reads a git repository. The core crate never imports gix (or
//! any other git library) directly; it depends on `gitmit-git` and programs
//! against the trait.
//!
//! # Crate layout
//!
//! - [`repo`] — the [`Repository`] trait definition.
//! - [`types`] — value types used in trait signatures ([`GitOid`],
//!   [`TreeEntry`], [`CommitNode`]).
//! - [`error`] — the [`GitError`] enum returned by all trait methods.
//! - [`gix_repo`] — [`GixRepository`], the gix-backed implementation.

pub mod error;
pub mod gix_repo;
pub mod repo;
pub mod types;

// Re-export the main trait and commonly used types at the crate root for
// ergonomic imports: `use gitmit_git::{Repository, GitOid, GitError};`
pub use error::GitError;
pub use gix_repo::GixRepository;
pub use repo::{CommitWalk, Repository};
pub use types::{CommitNode, GitOid, OidParseError, TreeEntry};
