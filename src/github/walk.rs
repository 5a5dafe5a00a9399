// src/github/walk.rs
// =============================================================================
// This module expands a directory reference into a flat list of files.
//
// How it works:
// 1. Start with the walk root on a stack
// 2. List the directory on top of the stack
// 3. Fetch its (non-binary) files, a few at a time
// 4. Push its (non-excluded) subdirectories, if the depth budget allows
// 5. Repeat until the stack is empty or the directory budget is spent
//
// Budgets:
// - max_depth: how many levels below the start path we descend
// - max_directories: how many listings one walk may request
// Running out of either is a soft truncation recorded in the outcome,
// never an error.
//
// Failures:
// - an excluded directory is pruned BEFORE it is listed; a start path
//   inside one is not walked at all
// - a file that fails to download still appears, with placeholder content
// - a subdirectory that fails to list is skipped with a warning
// - AccessDenied anywhere stops the walk (retrying won't help)
// =============================================================================

use super::fetch::{extension_of, ContentFetcher, DirEntry, EntryKind, FileDescriptor};
use super::classify::RepoReference;
use crate::config::{FilterConfig, WalkConfig};
use crate::error::{AcquireError, Result};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Why a walk stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    /// Subdirectories deeper than max_depth were not expanded
    DepthLimit,
    /// max_directories listings were used up
    DirectoryLimit,
}

#[derive(Debug, Clone, Default)]
pub struct WalkOutcome {
    /// Files in discovery order
    pub files: Vec<FileDescriptor>,
    /// False when the start path itself does not exist
    pub root_found: bool,
    pub truncation: Option<Truncation>,
    pub directories_listed: usize,
}

// A directory waiting on the stack
#[derive(Debug, Clone)]
struct PendingDir {
    path: String,
    depth: usize,
}

/// Walks a repository tree through a ContentFetcher
pub struct TreeWalker<'a> {
    fetcher: &'a ContentFetcher,
    excluded_dirs: HashSet<String>,
    excluded_extensions: HashSet<String>,
    max_depth: usize,
    max_directories: usize,
    fan_out: usize,
}

impl<'a> TreeWalker<'a> {
    pub fn new(fetcher: &'a ContentFetcher, walk: &WalkConfig, filters: &FilterConfig) -> Self {
        Self {
            fetcher,
            excluded_dirs: filters.excluded_dirs.iter().map(|d| d.to_lowercase()).collect(),
            excluded_extensions: filters
                .excluded_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            max_depth: walk.max_depth,
            max_directories: walk.max_directories,
            fan_out: walk.fetch_concurrency.max(1),
        }
    }

    /// Walks from `start_path`. Descriptor paths are made relative to
    /// `strip_prefix` (pass "" to keep repo-relative paths).
    pub async fn walk(&self, r: &RepoReference, start_path: &str, strip_prefix: &str) -> Result<WalkOutcome> {
        let mut outcome = WalkOutcome {
            root_found: true,
            ..WalkOutcome::default()
        };

        let start = start_path.trim_matches('/');
        if let Some(segment) = start.split('/').find(|s| self.is_excluded_dir(s)) {
            warn!(path = %start, segment, "start path is inside an excluded directory, not walking it");
            return Ok(outcome);
        }

        // Depth-first: a Vec used as a stack
        let mut stack = vec![PendingDir {
            path: start.to_string(),
            depth: 0,
        }];

        while let Some(dir) = stack.pop() {
            if outcome.directories_listed >= self.max_directories {
                warn!(skipped = stack.len() + 1, "directory budget exhausted");
                outcome.truncation = Some(Truncation::DirectoryLimit);
                break;
            }
            outcome.directories_listed += 1;

            let entries = match self.fetcher.list_directory(r, &dir.path).await {
                Ok(Some(entries)) => entries,
                Ok(None) if dir.depth == 0 => {
                    info!(path = %dir.path, "start path does not exist");
                    outcome.root_found = false;
                    return Ok(outcome);
                }
                Ok(None) => continue,
                Err(e @ AcquireError::AccessDenied(_)) => return Err(e),
                Err(e) if dir.depth == 0 => return Err(e),
                Err(e) => {
                    warn!(path = %dir.path, error = %e, "could not list directory, skipping");
                    continue;
                }
            };
            debug!(path = %dir.path, entries = entries.len(), depth = dir.depth, "listed");

            let mut files = Vec::new();
            let mut subdirs = Vec::new();
            for entry in entries {
                match entry.kind {
                    EntryKind::File if self.is_excluded_file(&entry.name) => {
                        debug!(path = %entry.path, "skipping binary/media file");
                    }
                    EntryKind::File => files.push(entry),
                    EntryKind::Dir if self.is_excluded_dir(&entry.name) => {
                        debug!(path = %entry.path, "pruning excluded directory");
                    }
                    EntryKind::Dir if dir.depth + 1 > self.max_depth => {
                        outcome.truncation.get_or_insert(Truncation::DepthLimit);
                    }
                    EntryKind::Dir => subdirs.push(entry),
                    EntryKind::Other => {}
                }
            }

            let fetched = self.fetch_siblings(r, files, strip_prefix, dir.depth).await?;
            outcome.files.extend(fetched);

            // Reverse so the first listed subdirectory is expanded first
            for sub in subdirs.into_iter().rev() {
                stack.push(PendingDir {
                    path: sub.path,
                    depth: dir.depth + 1,
                });
            }
        }

        info!(
            files = outcome.files.len(),
            directories = outcome.directories_listed,
            truncated = outcome.truncation.is_some(),
            "walk finished"
        );
        Ok(outcome)
    }

    /// Fetches the files of one listing with bounded concurrency.
    ///
    /// `buffered` keeps the listing order, so discovery order stays stable.
    async fn fetch_siblings(
        &self,
        r: &RepoReference,
        files: Vec<DirEntry>,
        strip_prefix: &str,
        depth: usize,
    ) -> Result<Vec<FileDescriptor>> {
        let results: Vec<(DirEntry, Result<Option<FileDescriptor>>)> = stream::iter(files)
            .map(|entry| async move {
                let result = self.fetcher.fetch_file(r, &entry.path).await;
                (entry, result)
            })
            .buffered(self.fan_out)
            .collect()
            .await;

        let mut descriptors = Vec::with_capacity(results.len());
        for (entry, result) in results {
            let shown = relative_path(&entry.path, strip_prefix);
            let descriptor = match result {
                Ok(Some(mut file)) => {
                    file.path = shown;
                    file
                }
                // Listed a moment ago but gone now
                Ok(None) => {
                    warn!(path = %entry.path, "listed file could not be found");
                    FileDescriptor::unavailable(&shown, entry.size_bytes as usize, "file not found")
                }
                Err(e @ AcquireError::AccessDenied(_)) => return Err(e),
                Err(e) => {
                    warn!(path = %entry.path, error = %e, "file fetch failed, keeping placeholder");
                    FileDescriptor::unavailable(&shown, entry.size_bytes as usize, &e.to_string())
                }
            };
            descriptors.push(descriptor.at_depth(depth));
        }
        Ok(descriptors)
    }

    fn is_excluded_dir(&self, name: &str) -> bool {
        self.excluded_dirs.contains(&name.to_lowercase())
    }

    fn is_excluded_file(&self, name: &str) -> bool {
        extension_of(name)
            .map(|ext| self.excluded_extensions.contains(&ext))
            .unwrap_or(false)
    }
}

/// Path shown for a file once the nested prefix is dropped
pub fn relative_path(path: &str, strip_prefix: &str) -> String {
    let prefix = strip_prefix.trim_matches('/');
    if prefix.is_empty() {
        return path.to_string();
    }
    path.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(path)
        .to_string()
}
