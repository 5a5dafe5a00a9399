// src/config.rs
// =============================================================================
// Configuration consumed by the acquisition pipeline.
//
// Nothing here is persisted by the pipeline itself: the caller builds an
// AcquireConfig (defaults, an optional TOML file, then CLI overrides) and
// hands it in. Every field has a default so a config file only needs the
// keys it wants to change.
//
// Example file:
//
//   [limits]
//   max_files = 25
//
//   [filters]
//   nested_project_patterns = ["final-project", "capstone"]
// =============================================================================

use crate::error::{AcquireError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AcquireConfig {
    pub limits: LimitsConfig,
    pub walk: WalkConfig,
    pub filters: FilterConfig,
    pub branches: BranchConfig,
    pub hosts: HostConfig,
}

/// Ceilings on what ends up in the document
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Most files the working set may hold
    pub max_files: usize,
    /// Cumulative size ceiling for the working set
    pub max_total_bytes: usize,
    /// Per-file truncation length applied by the formatter
    pub max_file_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_files: 20,
            max_total_bytes: 150_000,
            max_file_bytes: 50_000,
        }
    }
}

/// Budgets for the tree walk and the HTTP layer
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// How many directory levels below the start path may be expanded
    pub max_depth: usize,
    /// How many directory listings one walk may request
    pub max_directories: usize,
    /// Sibling files fetched concurrently within one listing
    pub fetch_concurrency: usize,
    pub request_timeout_secs: u64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            max_directories: 60,
            fetch_concurrency: 6,
            request_timeout_secs: 15,
        }
    }
}

impl WalkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Directory names pruned before recursion
    pub excluded_dirs: Vec<String>,
    /// Binary/media extensions (no leading dot) never fetched
    pub excluded_extensions: Vec<String>,
    /// Files that are never part of a submission (lockfiles, build artifacts)
    pub non_submission_files: Vec<String>,
    /// Files that must make it into the document when the ceilings allow.
    /// An entry containing '/' matches a path suffix, otherwise a basename.
    pub must_include: Vec<String>,
    /// Folder-name prefixes that mark a nested project rather than a source folder
    pub nested_project_patterns: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            excluded_dirs: strings(&[
                "node_modules",
                ".git",
                ".github",
                ".vscode",
                ".idea",
                ".next",
                ".cache",
                ".parcel-cache",
                "bower_components",
                "vendor",
                "dist",
                "build",
                "out",
                "coverage",
                "target",
                "__pycache__",
                ".venv",
                "venv",
                "logs",
                "log",
                "tmp",
                "temp",
            ]),
            excluded_extensions: strings(&[
                "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "svg", "mp3", "mp4", "wav",
                "mov", "avi", "webm", "pdf", "zip", "gz", "tar", "rar", "7z", "exe", "dll", "so",
                "dylib", "class", "jar", "woff", "woff2", "ttf", "eot", "otf", "psd", "db",
                "sqlite",
            ]),
            non_submission_files: strings(&[
                "package-lock.json",
                "yarn.lock",
                "pnpm-lock.yaml",
                "bun.lockb",
                "Cargo.lock",
                "poetry.lock",
                "composer.lock",
                ".DS_Store",
                "Thumbs.db",
            ]),
            must_include: strings(&[
                "package.json",
                "README.md",
                "index.html",
                "script.js",
                "main.js",
                "index.js",
                "app.js",
                "game.js",
                "src/App.js",
                "src/App.jsx",
                "src/App.tsx",
                "src/index.js",
                "src/index.jsx",
                "src/index.tsx",
            ]),
            nested_project_patterns: strings(&[
                "final-project",
                "finalproject",
                "project",
                "client",
                "frontend",
                "my-app",
            ]),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BranchConfig {
    /// Branch names probed, in order, when a URL does not name one
    pub conventional: Vec<String>,
    /// Used when neither probing nor repository metadata produced a branch
    pub fallback: String,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            conventional: strings(&["main", "master"]),
            fallback: "main".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Host of the web UI URLs students submit
    pub web: String,
    /// Host of raw-content URLs students sometimes submit
    pub raw: String,
    pub api_base: String,
    pub raw_base: String,
    pub user_agent: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            web: "github.com".to_string(),
            raw: "raw.githubusercontent.com".to_string(),
            api_base: "https://api.github.com".to_string(),
            raw_base: "https://raw.githubusercontent.com".to_string(),
            user_agent: concat!("repo-intake/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl AcquireConfig {
    /// Loads a TOML file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AcquireError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: AcquireConfig = toml::from_str(raw)
            .map_err(|e| AcquireError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects budgets that would make every run fail or hang.
    pub fn validate(&self) -> Result<()> {
        let zero = |name: &str| Err(AcquireError::Config(format!("{} must be greater than 0", name)));
        if self.limits.max_files == 0 {
            return zero("limits.max_files");
        }
        if self.limits.max_total_bytes == 0 {
            return zero("limits.max_total_bytes");
        }
        if self.limits.max_file_bytes == 0 {
            return zero("limits.max_file_bytes");
        }
        if self.walk.max_directories == 0 {
            return zero("walk.max_directories");
        }
        if self.walk.fetch_concurrency == 0 {
            return zero("walk.fetch_concurrency");
        }
        if self.walk.request_timeout_secs == 0 {
            return zero("walk.request_timeout_secs");
        }
        if self.branches.fallback.trim().is_empty() {
            return Err(AcquireError::Config("branches.fallback must not be empty".to_string()));
        }
        Ok(())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
