// src/github/mod.rs
// =============================================================================
// This module handles everything that talks to GitHub.
//
// Submodules:
// - classify: classifies a submission URL into a RepoReference
// - transport: the HTTP seam (reqwest in production, a fake in tests)
// - fetch: single files, directory listings, branch resolution
// - walk: depth-first, budgeted expansion of a directory into files
// =============================================================================

mod classify;
mod fetch;
mod transport;
mod walk;

#[cfg(test)]
pub(crate) mod fake;

pub use classify::{classify, DirectoryRole, RefKind, RepoReference, UrlClassifier};
pub use fetch::{ContentFetcher, FileDescriptor};
pub use transport::{HttpTransport, Transport};
pub use walk::{TreeWalker, Truncation};
