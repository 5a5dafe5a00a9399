// src/select/working_set.rs
// =============================================================================
// Builds the bounded, priority-ordered set of files handed to the formatter.
//
// Two passes over the files, highest score first (ties keep walk order):
//   1. must-include files, each added if it still fits both ceilings
//   2. everything else, stopping the moment the next file would not fit
// Lockfiles and build artifacts never get in, no matter how much room is
// left. Penalized files (near-empty, failed fetches, tests) rank last.
// =============================================================================

use super::score::{ScoredFile, Scorer};
use crate::config::LimitsConfig;
use crate::github::FileDescriptor;
use std::cmp::Reverse;
use tracing::debug;

/// Ceilings the working set must stay under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ceilings {
    pub max_files: usize,
    pub max_total_bytes: usize,
}

impl From<&LimitsConfig> for Ceilings {
    fn from(limits: &LimitsConfig) -> Self {
        Self {
            max_files: limits.max_files,
            max_total_bytes: limits.max_total_bytes,
        }
    }
}

/// Files chosen for the document, priority first
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    pub files: Vec<ScoredFile>,
    /// How many files the walk produced
    pub discovered: usize,
    /// How many were dropped as non-submission files
    pub excluded: usize,
    pub total_bytes: usize,
}

impl WorkingSet {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Files that didn't fit the ceilings
    pub fn left_out(&self) -> usize {
        self.discovered - self.excluded - self.files.len()
    }

    fn fits(&self, file: &FileDescriptor, ceilings: Ceilings) -> bool {
        self.files.len() < ceilings.max_files
            && self.total_bytes + file.size_bytes <= ceilings.max_total_bytes
    }

    fn push(&mut self, scored: ScoredFile) {
        self.total_bytes += scored.file.size_bytes;
        self.files.push(scored);
    }
}

/// Scores, ranks and truncates `files` to the ceilings.
pub fn select(files: &[FileDescriptor], scorer: &Scorer, ceilings: Ceilings) -> WorkingSet {
    let mut scored: Vec<ScoredFile> = files
        .iter()
        .enumerate()
        .map(|(index, file)| scorer.score(file, index))
        .collect();

    let before = scored.len();
    scored.retain(|s| !s.excluded);

    // Stable sort: equal scores keep discovery order
    scored.sort_by_key(|s| (Reverse(s.score), s.discovery_index));

    let mut set = WorkingSet {
        discovered: files.len(),
        excluded: before - scored.len(),
        ..WorkingSet::default()
    };

    let (must, rest): (Vec<ScoredFile>, Vec<ScoredFile>) = scored.into_iter().partition(|s| s.must_include);

    for candidate in must {
        if set.fits(&candidate.file, ceilings) {
            set.push(candidate);
        } else {
            debug!(path = %candidate.file.path, "must-include file does not fit the ceilings");
        }
    }

    for candidate in rest {
        if !set.fits(&candidate.file, ceilings) {
            debug!(path = %candidate.file.path, "ceiling reached");
            break;
        }
        set.push(candidate);
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterConfig;

    fn file(path: &str, size: usize) -> FileDescriptor {
        let mut content = format!("// {}\n", path);
        while content.len() < size {
            content.push('x');
        }
        content.truncate(size.max(1));
        let mut f = FileDescriptor::new(path, content);
        f.size_bytes = size;
        f
    }

    fn pick(files: &[FileDescriptor], max_files: usize, max_total_bytes: usize) -> WorkingSet {
        select(
            files,
            &Scorer::new(&FilterConfig::default()),
            Ceilings {
                max_files,
                max_total_bytes,
            },
        )
    }

    fn paths(set: &WorkingSet) -> Vec<&str> {
        set.files.iter().map(|s| s.file.path.as_str()).collect()
    }

    #[test]
    fn test_priority_order() {
        let files = vec![
            file("src/utils/format.js", 200),
            file("style.css", 200),
            file("package.json", 200),
            file("script.js", 200),
        ];
        let set = pick(&files, 10, 10_000);
        assert_eq!(
            paths(&set),
            vec!["script.js", "package.json", "src/utils/format.js", "style.css"]
        );
        assert!(set.files[0].must_include);
        assert!(set.files[1].must_include);
        assert!(!set.files[2].must_include);
    }

    #[test]
    fn test_ceilings_hold_for_any_limits() {
        let files: Vec<_> = (0..30).map(|i| file(&format!("src/part{}.js", i), 100 + i * 37)).collect();
        for max_files in [1, 3, 7, 30, 50] {
            for max_bytes in [50, 500, 2_000, 100_000] {
                let set = pick(&files, max_files, max_bytes);
                assert!(set.len() <= max_files);
                let sum: usize = set.files.iter().map(|s| s.file.size_bytes).sum();
                assert!(sum <= max_bytes);
                assert_eq!(sum, set.total_bytes);
            }
        }
    }

    #[test]
    fn test_must_include_survives_big_files() {
        let files = vec![
            file("src/huge.js", 9_000),
            file("deep/nested/dir/README.md", 400),
            file("package.json", 300),
        ];
        let set = pick(&files, 2, 1_000);
        assert_eq!(set.len(), 2);
        assert!(paths(&set).contains(&"package.json"));
        assert!(paths(&set).contains(&"deep/nested/dir/README.md"));
    }

    #[test]
    fn test_stops_at_first_overflow() {
        let files = vec![
            file("a.js", 100),
            file("b.js", 900),
            file("c.js", 10),
        ];
        let set = pick(&files, 10, 500);
        assert_eq!(paths(&set), vec!["a.js"]);
        assert_eq!(set.left_out(), 2);
    }

    #[test]
    fn test_ties_keep_discovery_order() {
        let files = vec![file("zeta.js", 100), file("alpha.js", 100), file("mid.js", 100)];
        let set = pick(&files, 10, 10_000);
        assert_eq!(paths(&set), vec!["zeta.js", "alpha.js", "mid.js"]);
    }

    #[test]
    fn test_non_submission_files_never_selected() {
        let files = vec![file("package-lock.json", 50), file("yarn.lock", 50), file("app.js", 50)];
        let set = pick(&files, 10, 10_000);
        assert_eq!(paths(&set), vec!["app.js"]);
        assert_eq!(set.excluded, 2);
    }

    #[test]
    fn test_penalized_files_rank_last() {
        let files = vec![
            FileDescriptor::new(".gitignore", "node_modules\n".to_string()),
            FileDescriptor::unavailable("src/broken.js", 40, "timeout"),
            file("app.js", 120),
        ];
        let set = pick(&files, 10, 10_000);
        assert_eq!(paths(&set), vec!["app.js", "src/broken.js", ".gitignore"]);
        assert_eq!(set.excluded, 0);
        assert_eq!(set.left_out(), 0);
    }

    #[test]
    fn test_empty_input() {
        let set = pick(&[], 10, 10_000);
        assert!(set.is_empty());
        assert_eq!(set.left_out(), 0);
    }
}
