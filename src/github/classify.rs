// src/github/classify.rs
// =============================================================================
// Turns a submission URL into a RepoReference.
//
// Recognized shapes, tried in this order:
//   1. github.com/owner/repo/tree/<branch>/<path...>   -> Directory
//   2. github.com/owner/repo/blob/<branch>/<path...>   -> File
//   3. raw.githubusercontent.com/owner/repo/<branch>/<path...> -> File
//   4. github.com/owner/repo[.git][/]                  -> Root
//
// Matching works on path segments, not on the raw string, so query strings,
// fragments, "www." and a missing scheme don't matter. Each matcher is a
// plain function: it either recognizes the URL or returns None.
// =============================================================================

use crate::config::{FilterConfig, HostConfig};
use crate::error::{AcquireError, Result};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::fmt;
use url::Url;

/// What a submission URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    File,
    Directory,
    Root,
}

/// How a directory reference should be read.
///
/// A nested project is a whole project living in a subfolder (students
/// often push "Final-Project/" instead of the project itself). A source
/// folder is one part of a project rooted higher up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryRole {
    NestedProject,
    SourceFolder,
}

/// A classified submission URL. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoReference {
    pub owner: String,
    pub repo: String,
    /// None means "resolve the default branch later"
    pub branch: Option<String>,
    /// Repo-relative, no leading or trailing slash; empty for Root
    pub path: String,
    pub kind: RefKind,
    /// Only set when kind == Directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<DirectoryRole>,
}

impl RepoReference {
    /// "owner/repo"
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Same reference pinned to a concrete branch.
    pub fn with_branch(&self, branch: &str) -> RepoReference {
        RepoReference {
            branch: Some(branch.to_string()),
            ..self.clone()
        }
    }
}

impl fmt::Display for RepoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())?;
        if let Some(branch) = &self.branch {
            write!(f, "@{}", branch)?;
        }
        if !self.path.is_empty() {
            write!(f, ":{}", self.path)?;
        }
        Ok(())
    }
}

/// A submission URL broken into host and decoded path segments
struct ParsedUrl {
    host: String,
    segments: Vec<String>,
}

type Matcher = fn(&UrlClassifier, &ParsedUrl) -> Option<RepoReference>;

/// Classifies URLs against a configured host and nested-project pattern list
#[derive(Debug, Clone)]
pub struct UrlClassifier {
    web_host: String,
    raw_host: String,
    nested_patterns: Vec<String>,
}

impl UrlClassifier {
    pub fn new(hosts: &HostConfig, filters: &FilterConfig) -> Self {
        Self {
            web_host: hosts.web.to_lowercase(),
            raw_host: hosts.raw.to_lowercase(),
            nested_patterns: filters
                .nested_project_patterns
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
        }
    }

    /// Classifies a submission URL.
    ///
    /// Fails with InvalidUrl when the host is not a recognized GitHub host,
    /// when owner/repo cannot be read, or when the path has an unknown shape.
    pub fn classify(&self, input: &str) -> Result<RepoReference> {
        let parsed = self.parse(input)?;

        const MATCHERS: [Matcher; 4] = [
            UrlClassifier::match_tree,
            UrlClassifier::match_blob,
            UrlClassifier::match_raw,
            UrlClassifier::match_root,
        ];

        MATCHERS
            .iter()
            .find_map(|matcher| matcher(self, &parsed))
            .ok_or_else(|| AcquireError::InvalidUrl(format!("unrecognized URL shape: {}", input)))
    }

    fn parse(&self, input: &str) -> Result<ParsedUrl> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AcquireError::InvalidUrl("empty URL".to_string()));
        }

        // Students paste "github.com/user/repo" without a scheme all the time
        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        let url = Url::parse(&with_scheme)
            .map_err(|e| AcquireError::InvalidUrl(format!("{}: {}", input, e)))?;

        let host = url
            .host_str()
            .ok_or_else(|| AcquireError::InvalidUrl(format!("URL has no host: {}", input)))?
            .to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

        if host != self.web_host && host != self.raw_host {
            return Err(AcquireError::InvalidUrl(format!("not a GitHub URL: {}", input)));
        }

        let segments: Vec<String> = url
            .path_segments()
            .map(|parts| {
                parts
                    .filter(|s| !s.is_empty())
                    .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        if segments.len() < 2 {
            return Err(AcquireError::InvalidUrl(format!(
                "expected owner/repo in URL: {}",
                input
            )));
        }

        Ok(ParsedUrl { host, segments })
    }

    fn match_tree(&self, parsed: &ParsedUrl) -> Option<RepoReference> {
        let (owner, repo, rest) = self.web_parts(parsed)?;
        if rest.first().map(String::as_str) != Some("tree") || rest.len() < 2 {
            return None;
        }
        let branch = rest[1].clone();
        let path = rest[2..].join("/");

        // tree/<branch> with no path is just the root on a named branch
        if path.is_empty() {
            return Some(RepoReference {
                owner,
                repo,
                branch: Some(branch),
                path,
                kind: RefKind::Root,
                role: None,
            });
        }

        let role = self.directory_role(&path);
        Some(RepoReference {
            owner,
            repo,
            branch: Some(branch),
            path,
            kind: RefKind::Directory,
            role: Some(role),
        })
    }

    fn match_blob(&self, parsed: &ParsedUrl) -> Option<RepoReference> {
        let (owner, repo, rest) = self.web_parts(parsed)?;
        if rest.first().map(String::as_str) != Some("blob") || rest.len() < 3 {
            return None;
        }
        Some(RepoReference {
            owner,
            repo,
            branch: Some(rest[1].clone()),
            path: rest[2..].join("/"),
            kind: RefKind::File,
            role: None,
        })
    }

    fn match_raw(&self, parsed: &ParsedUrl) -> Option<RepoReference> {
        if parsed.host != self.raw_host || parsed.segments.len() < 4 {
            return None;
        }
        let segs = &parsed.segments;
        Some(RepoReference {
            owner: segs[0].clone(),
            repo: segs[1].clone(),
            branch: Some(segs[2].clone()),
            path: segs[3..].join("/"),
            kind: RefKind::File,
            role: None,
        })
    }

    fn match_root(&self, parsed: &ParsedUrl) -> Option<RepoReference> {
        let (owner, repo, rest) = self.web_parts(parsed)?;
        if !rest.is_empty() {
            return None;
        }
        Some(RepoReference {
            owner,
            repo,
            branch: None,
            path: String::new(),
            kind: RefKind::Root,
            role: None,
        })
    }

    /// owner, repo (without ".git") and the remaining segments of a web URL
    fn web_parts<'a>(&self, parsed: &'a ParsedUrl) -> Option<(String, String, &'a [String])> {
        if parsed.host != self.web_host {
            return None;
        }
        let owner = parsed.segments[0].clone();
        let repo = parsed.segments[1].trim_end_matches(".git").to_string();
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        Some((owner, repo, &parsed.segments[2..]))
    }

    /// Nested project unless the path is plainly a source folder.
    pub fn directory_role(&self, path: &str) -> DirectoryRole {
        let first = path.split('/').next().unwrap_or("").to_lowercase();
        if self.nested_patterns.iter().any(|p| first.starts_with(p)) {
            return DirectoryRole::NestedProject;
        }
        if path.eq_ignore_ascii_case("src") {
            return DirectoryRole::SourceFolder;
        }
        DirectoryRole::NestedProject
    }
}

impl Default for UrlClassifier {
    fn default() -> Self {
        Self::new(&HostConfig::default(), &FilterConfig::default())
    }
}

/// Classifies with the default hosts and patterns.
pub fn classify(url: &str) -> Result<RepoReference> {
    UrlClassifier::default().classify(url)
}
