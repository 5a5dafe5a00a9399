// src/select/score.rs
// =============================================================================
// Deterministic relevance scoring for submission files.
//
// Higher is more relevant. The score is a sum of independent signals:
//
//   must-include pattern (package.json, README.md, src/App.js, ...)  +200
//   entry-point name (index, main, app, script, game, server)        +100
//   language source extension (.js, .py, .java, ...)                  +50
//   markup / style extension (.html, .css, .vue, ...)                 +30
//   config / docs extension (.json, .md, .yml, ...)                   +10
//   shallow path: 20 minus 5 per directory level, floored at 0       0..20
//   test / spec file (*.test.js, *.spec.ts)                           -15
//   near-empty file                                                   -25
//   content could not be fetched                                      -30
//
// Known non-submission files (lockfiles, minified bundles, source maps)
// are flagged as excluded and never selected. Penalties alone only push a
// file down the ranking.
// =============================================================================

use crate::config::FilterConfig;
use crate::github::FileDescriptor;

/// Scores at or above this are must-include
pub const MUST_INCLUDE_THRESHOLD: i32 = 200;

/// Score assigned to files that are never part of a submission
pub const EXCLUDED_SCORE: i32 = -100;

const ENTRY_POINT_STEMS: &[&str] = &["index", "main", "app", "script", "game", "server"];

const SOURCE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "py", "java", "kt", "cs", "rb", "go", "rs", "c", "h",
    "cpp", "hpp", "php", "swift", "dart", "sql", "sh",
];

const MARKUP_EXTENSIONS: &[&str] = &["html", "htm", "css", "scss", "sass", "less", "vue", "svelte", "ejs", "hbs"];

const CONFIG_DOC_EXTENSIONS: &[&str] = &["json", "md", "markdown", "yml", "yaml", "toml", "txt", "xml", "ini", "env"];

/// Files this small carry no gradeable content
const NEAR_EMPTY_BYTES: usize = 16;

/// A file with its relevance score attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredFile {
    pub file: FileDescriptor,
    pub score: i32,
    pub must_include: bool,
    /// Lockfile or build artifact
    pub excluded: bool,
    /// Position in the walk, used to break ties
    pub discovery_index: usize,
}

/// Scores files against a filter configuration
#[derive(Debug, Clone)]
pub struct Scorer {
    must_include: Vec<String>,
    non_submission: Vec<String>,
}

impl Scorer {
    pub fn new(filters: &FilterConfig) -> Self {
        Self {
            must_include: filters.must_include.iter().map(|p| p.to_lowercase()).collect(),
            non_submission: filters.non_submission_files.iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    pub fn score(&self, file: &FileDescriptor, discovery_index: usize) -> ScoredFile {
        let must_include = self.is_must_include(file);
        let excluded = self.is_non_submission(file);
        let score = if excluded {
            EXCLUDED_SCORE
        } else if must_include {
            // Penalties never push a must-include file below the threshold
            self.relevance(file, true).max(MUST_INCLUDE_THRESHOLD)
        } else {
            self.relevance(file, false)
        };
        ScoredFile {
            file: file.clone(),
            score,
            must_include: must_include && !excluded,
            excluded,
            discovery_index,
        }
    }

    fn relevance(&self, file: &FileDescriptor, must_include: bool) -> i32 {
        let name = file.name.to_lowercase();
        let ext = file.extension();
        let ext = ext.as_deref().unwrap_or("");
        let stem = name.split('.').next().unwrap_or("");

        let mut score = 0;
        if must_include {
            score += 200;
        }
        if ENTRY_POINT_STEMS.contains(&stem) && (SOURCE_EXTENSIONS.contains(&ext) || MARKUP_EXTENSIONS.contains(&ext)) {
            score += 100;
        }
        score += if SOURCE_EXTENSIONS.contains(&ext) {
            50
        } else if MARKUP_EXTENSIONS.contains(&ext) {
            30
        } else if CONFIG_DOC_EXTENSIONS.contains(&ext) {
            10
        } else {
            0
        };

        let depth = file.origin_subdirectory_depth as i32;
        score += (20 - 5 * depth).max(0);

        if name.contains(".test.") || name.contains(".spec.") {
            score -= 15;
        }
        if file.is_unavailable() {
            score -= 30;
        } else if file.raw_content.trim().len() < NEAR_EMPTY_BYTES {
            score -= 25;
        }
        score
    }

    /// Basename patterns match the file name, patterns with '/' match a path suffix.
    pub fn is_must_include(&self, file: &FileDescriptor) -> bool {
        let path = file.path.to_lowercase();
        let name = file.name.to_lowercase();
        self.must_include.iter().any(|pattern| {
            if pattern.contains('/') {
                path == *pattern || path.ends_with(&format!("/{}", pattern))
            } else {
                name == *pattern
            }
        })
    }

    fn is_non_submission(&self, file: &FileDescriptor) -> bool {
        let name = file.name.to_lowercase();
        self.non_submission.contains(&name) || name.ends_with(".min.js") || name.ends_with(".min.css") || name.ends_with(".map")
    }
}
