// src/github/fetch.rs
// =============================================================================
// This module fetches files and directory listings from GitHub.
//
// Strategy for a single file:
// - Try raw.githubusercontent.com first (no JSON, no base64, cheap)
// - If that fails for ANY reason (404, network error, non-UTF-8 body),
//   fall back to the REST contents API and base64-decode the payload
// - A 404 from both means the file is absent: Ok(None), not an error
// - A 403/429 from the API means private repo or rate limit: AccessDenied
//
// Directory listings always come from the contents API. When the "directory"
// is really a file, the API answers with an object instead of an array; we
// hand that back as a one-entry listing.
//
// Branch resolution (for URLs that don't name a branch) happens here too,
// at most once per repository, and the answer is cached.
// =============================================================================

use super::transport::{Reply, Transport};
use super::classify::RepoReference;
use crate::config::{BranchConfig, HostConfig};
use crate::error::{AcquireError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use url::Url;

/// Prefix of the placeholder content used when a file could not be read
pub const UNAVAILABLE_PREFIX: &str = "[content unavailable:";

/// One file of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Path as it will be shown in the document
    pub path: String,
    /// Basename
    pub name: String,
    pub raw_content: String,
    pub size_bytes: usize,
    /// Directory levels between the walk's start and this file. Files
    /// fetched on their own count from the repository root.
    pub origin_subdirectory_depth: usize,
}

impl FileDescriptor {
    pub fn new(path: &str, raw_content: String) -> Self {
        Self {
            path: path.to_string(),
            name: basename(path).to_string(),
            size_bytes: raw_content.len(),
            raw_content,
            origin_subdirectory_depth: path_depth(path),
        }
    }

    /// Stand-in for a file whose fetch failed mid-walk.
    pub fn unavailable(path: &str, size_bytes: usize, reason: &str) -> Self {
        Self {
            path: path.to_string(),
            name: basename(path).to_string(),
            raw_content: format!("{} {}]", UNAVAILABLE_PREFIX, reason),
            size_bytes,
            origin_subdirectory_depth: path_depth(path),
        }
    }

    pub fn at_depth(mut self, depth: usize) -> Self {
        self.origin_subdirectory_depth = depth;
        self
    }

    pub fn is_unavailable(&self) -> bool {
        self.raw_content.starts_with(UNAVAILABLE_PREFIX)
    }

    /// Lowercased extension without the dot, if any
    pub fn extension(&self) -> Option<String> {
        extension_of(&self.name)
    }
}

pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn path_depth(path: &str) -> usize {
    path.trim_matches('/').matches('/').count()
}

pub fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    // ".gitignore" has no extension, it *is* the name
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symlinks and submodules; never followed
    Other,
}

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Repo-relative path
    pub path: String,
    pub name: String,
    pub kind: EntryKind,
    pub size_bytes: u64,
}

// Shapes of the GitHub contents API responses we care about
#[derive(Debug, Deserialize)]
struct ContentItem {
    #[serde(default)]
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsPayload {
    Listing(Vec<ContentItem>),
    Single(ContentItem),
}

#[derive(Debug, Deserialize)]
struct RepoMetadata {
    #[serde(default)]
    default_branch: Option<String>,
}

impl From<ContentItem> for DirEntry {
    fn from(item: ContentItem) -> Self {
        let kind = match item.kind.as_str() {
            "file" => EntryKind::File,
            "dir" => EntryKind::Dir,
            _ => EntryKind::Other,
        };
        let name = if item.name.is_empty() {
            basename(&item.path).to_string()
        } else {
            item.name
        };
        DirEntry {
            path: item.path,
            name,
            kind,
            size_bytes: item.size,
        }
    }
}

/// Reads submission content through a Transport
pub struct ContentFetcher {
    transport: Arc<dyn Transport>,
    api_base: Url,
    raw_base: Url,
    branches: BranchConfig,
    /// "owner/repo" -> resolved branch
    resolved: Mutex<HashMap<String, String>>,
    /// "owner/repo" -> default branch from metadata (None when the repo has none)
    metadata: Mutex<HashMap<String, Option<String>>>,
}

impl ContentFetcher {
    pub fn new(transport: Arc<dyn Transport>, hosts: &HostConfig, branches: &BranchConfig) -> Result<Self> {
        Ok(Self {
            transport,
            api_base: parse_base(&hosts.api_base)?,
            raw_base: parse_base(&hosts.raw_base)?,
            branches: branches.clone(),
            resolved: Mutex::new(HashMap::new()),
            metadata: Mutex::new(HashMap::new()),
        })
    }

    /// Fetches one file. Ok(None) when it does not exist on this branch.
    pub async fn fetch_file(&self, r: &RepoReference, path: &str) -> Result<Option<FileDescriptor>> {
        let branch = self.resolve_branch(r).await?;

        // Fast path: raw content delivery
        let raw_url = self.raw_url(r, &branch, path)?;
        match self.transport.get(&raw_url).await {
            Ok(reply) if reply.is_success() => match String::from_utf8(reply.body) {
                Ok(content) => return Ok(Some(FileDescriptor::new(path, content))),
                Err(_) => debug!(path, "raw body is not UTF-8, trying contents API"),
            },
            Ok(reply) => debug!(path, status = reply.status, "raw fetch missed, trying contents API"),
            Err(e) => debug!(path, error = %e, "raw fetch failed, trying contents API"),
        }

        // Fallback: contents API with base64 payload
        let api_url = self.contents_url(r, &branch, path)?;
        let reply = self.transport.get(&api_url).await?;
        if reply.is_not_found() {
            return Ok(None);
        }
        check_status(&reply, r, path)?;

        match parse_contents(&reply.body)? {
            ContentsPayload::Single(item) if item.kind == "file" => {
                let content = decode_content(&item)?;
                Ok(Some(FileDescriptor::new(path, content)))
            }
            _ => {
                debug!(path, "path is not a file");
                Ok(None)
            }
        }
    }

    /// Lists a directory. Ok(None) when the path does not exist.
    pub async fn list_directory(&self, r: &RepoReference, path: &str) -> Result<Option<Vec<DirEntry>>> {
        let branch = self.resolve_branch(r).await?;
        let url = self.contents_url(r, &branch, path)?;
        let reply = self.transport.get(&url).await?;
        if reply.is_not_found() {
            return Ok(None);
        }
        check_status(&reply, r, path)?;

        let entries = match parse_contents(&reply.body)? {
            ContentsPayload::Listing(items) => items.into_iter().map(DirEntry::from).collect(),
            // A file reached through a directory URL: one-entry listing
            ContentsPayload::Single(item) => vec![DirEntry::from(item)],
        };
        Ok(Some(entries))
    }

    /// Resolves the branch to read from, probing only once per repository.
    ///
    /// Order: the branch in the URL, then each conventional name that
    /// exists, then the repository's default branch, then the configured
    /// fallback.
    pub async fn resolve_branch(&self, r: &RepoReference) -> Result<String> {
        if let Some(branch) = &r.branch {
            return Ok(branch.clone());
        }

        let key = r.slug().to_lowercase();
        if let Some(branch) = self.cached_branch(&key) {
            return Ok(branch);
        }

        let branch = self.probe_branch(r).await?;
        info!(repo = %r.slug(), branch = %branch, "resolved branch");
        if let Ok(mut cache) = self.resolved.lock() {
            cache.insert(key, branch.clone());
        }
        Ok(branch)
    }

    fn cached_branch(&self, key: &str) -> Option<String> {
        self.resolved.lock().ok()?.get(key).cloned()
    }

    async fn probe_branch(&self, r: &RepoReference) -> Result<String> {
        for candidate in &self.branches.conventional {
            match self.branch_exists(r, candidate).await {
                Ok(true) => return Ok(candidate.clone()),
                Ok(false) => {}
                Err(e @ AcquireError::AccessDenied(_)) => return Err(e),
                Err(e) => warn!(branch = %candidate, error = %e, "branch probe failed"),
            }
        }

        match self.default_branch(r).await {
            Ok(Some(branch)) => return Ok(branch),
            Ok(None) => debug!(repo = %r.slug(), "no repository metadata"),
            Err(e @ AcquireError::AccessDenied(_)) => return Err(e),
            Err(e) => warn!(error = %e, "repository metadata lookup failed"),
        }

        warn!(
            repo = %r.slug(),
            fallback = %self.branches.fallback,
            "could not determine branch, using fallback"
        );
        Ok(self.branches.fallback.clone())
    }

    async fn branch_exists(&self, r: &RepoReference, branch: &str) -> Result<bool> {
        let url = self.api_endpoint(&["repos", &r.owner, &r.repo, "branches", branch])?;
        let reply = self.transport.get(&url).await?;
        if reply.is_success() {
            return Ok(true);
        }
        if reply.is_denied() {
            check_status(&reply, r, "")?;
        }
        Ok(false)
    }

    /// Default branch from repository metadata.
    ///
    /// Looked up at most once per repository; failed lookups are not cached.
    pub async fn default_branch(&self, r: &RepoReference) -> Result<Option<String>> {
        let key = r.slug().to_lowercase();
        if let Some(known) = self.metadata.lock().ok().and_then(|m| m.get(&key).cloned()) {
            return Ok(known);
        }

        let default = self.fetch_default_branch(r).await?;
        if let Ok(mut cache) = self.metadata.lock() {
            cache.insert(key, default.clone());
        }
        Ok(default)
    }

    async fn fetch_default_branch(&self, r: &RepoReference) -> Result<Option<String>> {
        let url = self.api_endpoint(&["repos", &r.owner, &r.repo])?;
        let reply = self.transport.get(&url).await?;
        if reply.is_not_found() {
            return Ok(None);
        }
        check_status(&reply, r, "")?;
        let meta: RepoMetadata = serde_json::from_slice(&reply.body)
            .map_err(|e| AcquireError::Decode(format!("repository metadata: {}", e)))?;
        Ok(meta.default_branch.filter(|b| !b.is_empty()))
    }

    fn raw_url(&self, r: &RepoReference, branch: &str, path: &str) -> Result<Url> {
        let mut url = self.raw_base.clone();
        push_segments(&mut url, [r.owner.as_str(), r.repo.as_str()])?;
        push_segments(&mut url, split_path(branch))?;
        push_segments(&mut url, split_path(path))?;
        Ok(url)
    }

    fn contents_url(&self, r: &RepoReference, branch: &str, path: &str) -> Result<Url> {
        let mut url = self.api_endpoint(&["repos", &r.owner, &r.repo, "contents"])?;
        push_segments(&mut url, split_path(path))?;
        url.query_pairs_mut().append_pair("ref", branch);
        Ok(url)
    }

    fn api_endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        push_segments(&mut url, segments.iter().copied())?;
        Ok(url)
    }
}

fn parse_base(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| AcquireError::Config(format!("bad base URL {}: {}", raw, e)))?;
    if url.cannot_be_a_base() {
        return Err(AcquireError::Config(format!("bad base URL {}", raw)));
    }
    Ok(url)
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Appends each segment individually so spaces, '#', '?' and friends
/// are percent-encoded per segment instead of mangling the whole path.
fn push_segments<'a>(url: &mut Url, segments: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let mut path = url
        .path_segments_mut()
        .map_err(|_| AcquireError::Config("base URL cannot hold a path".to_string()))?;
    path.pop_if_empty();
    path.extend(segments);
    Ok(())
}

/// Maps a non-success, non-404 reply to an error.
fn check_status(reply: &Reply, r: &RepoReference, path: &str) -> Result<()> {
    if reply.is_success() {
        return Ok(());
    }
    let target = if path.is_empty() {
        r.slug()
    } else {
        format!("{}/{}", r.slug(), path)
    };
    if reply.is_denied() {
        let why = if reply.is_rate_limited() {
            "GitHub API rate limit exceeded"
        } else {
            "repository is private or access is forbidden"
        };
        return Err(AcquireError::AccessDenied(format!("{} ({})", target, why)));
    }
    Err(AcquireError::Network(format!("{}: HTTP {}", target, reply.status)))
}

fn parse_contents(body: &[u8]) -> Result<ContentsPayload> {
    serde_json::from_slice(body).map_err(|e| AcquireError::Decode(format!("contents response: {}", e)))
}

fn decode_content(item: &ContentItem) -> Result<String> {
    let encoded = match (&item.content, item.encoding.as_deref()) {
        (Some(content), Some("base64")) => content,
        (_, encoding) => {
            return Err(AcquireError::Decode(format!(
                "{}: unsupported encoding {:?}",
                item.path, encoding
            )))
        }
    };
    // The API wraps base64 across lines
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| AcquireError::Decode(format!("{}: {}", item.path, e)))?;
    String::from_utf8(bytes).map_err(|_| AcquireError::Decode(format!("{}: not UTF-8 text", item.path)))
}
