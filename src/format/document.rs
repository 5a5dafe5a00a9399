// src/format/document.rs
// =============================================================================
// Renders a WorkingSet into the text document the grader reads.
//
// Layout (the headings are a protocol, not decoration):
//
//   # GitHub Repository: owner/repo
//   - **Branch:** ... / **Submission Layout:** ...
//   ## Repository Summary:
//   - counts, extension histogram, priority files, truncation notes
//   ### Directory Structure:
//   ## File Contents:
//   ## File: <path> [📌]
//   ```<language>
//   <content, truncated past max_file_bytes>
//   ```
//
// Pure function of its inputs: no I/O, no clock, deterministic ordering.
// =============================================================================

use super::language::language_for;
use super::{FILE_HEADING, FILE_CONTENTS_HEADING, PRIORITY_MARKER, REPOSITORY_HEADING, SUMMARY_HEADING};
use crate::error::AcquireError;
use crate::github::{DirectoryRole, RefKind, RepoReference, Truncation};
use crate::select::WorkingSet;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

/// The one artifact handed to the grading side.
///
/// Both successful documents and error reports have this type, so callers
/// only handle one shape. `failure` is set for error reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedDocument {
    text: String,
    failure: Option<Failure>,
}

/// Why an error report was produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Stable reason code, see AcquireError::reason_code
    pub reason: &'static str,
    pub message: String,
}

impl FormattedDocument {
    pub(crate) fn success(text: String) -> Self {
        Self { text, failure: None }
    }

    pub(crate) fn report(text: String, error: &AcquireError) -> Self {
        Self {
            text,
            failure: Some(Failure {
                reason: error.reason_code(),
                message: error.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_error_report(&self) -> bool {
        self.failure.is_some()
    }

    /// Reason code of an error report, None for a success document
    pub fn failure_reason(&self) -> Option<&'static str> {
        self.failure.as_ref().map(|f| f.reason)
    }

    /// Reason and message of an error report
    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }
}

impl fmt::Display for FormattedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Renders `ws` for the repository `r` (whose branch should already be resolved).
pub fn format(ws: &WorkingSet, r: &RepoReference, truncation: Option<Truncation>, max_file_bytes: usize) -> FormattedDocument {
    let mut out = String::new();

    // Writing into a String cannot fail, so the fmt::Results are discarded
    let _ = writeln!(out, "{}{}\n", REPOSITORY_HEADING, r.slug());
    if let Some(branch) = &r.branch {
        let _ = writeln!(out, "- **Branch:** {}", branch);
    }
    if !r.path.is_empty() {
        let location = if r.kind == RefKind::File { r.path.clone() } else { format!("{}/", r.path) };
        let _ = writeln!(out, "- **Project Location:** {}", location);
    }
    let _ = writeln!(out, "- **Submission Layout:** {}\n", layout_label(r));

    write_summary(&mut out, ws, truncation);

    if r.role == Some(DirectoryRole::NestedProject) {
        let _ = writeln!(out, "### ⚠️ Note for Student:");
        let _ = writeln!(
            out,
            "Your project is nested in a subdirectory ({}/). For future submissions, \
             consider placing your project files directly in the repository root.\n",
            r.path
        );
    }

    let _ = writeln!(out, "{}\n", FILE_CONTENTS_HEADING);
    for scored in &ws.files {
        let file = &scored.file;
        let marker = if scored.must_include { PRIORITY_MARKER } else { "" };
        let language = language_for(file.extension().as_deref());
        let content = truncate_content(&file.raw_content, max_file_bytes);
        let fence = fence_for(&content);

        let _ = writeln!(out, "{}{}{}", FILE_HEADING, file.path, marker);
        let _ = writeln!(out, "{}{}", fence, language);
        out.push_str(&content);
        if !content.ends_with('\n') {
            out.push('\n');
        }
        let _ = writeln!(out, "{}\n", fence);
    }

    FormattedDocument::success(out)
}

fn layout_label(r: &RepoReference) -> &'static str {
    match (r.kind, r.role) {
        (RefKind::Root, _) => "✅ Correct Root Structure",
        (RefKind::File, _) => "📄 Single File",
        (RefKind::Directory, Some(DirectoryRole::SourceFolder)) => "📁 Source Folder",
        (RefKind::Directory, _) => "⚠️ Nested Project Structure",
    }
}

fn write_summary(out: &mut String, ws: &WorkingSet, truncation: Option<Truncation>) {
    let _ = writeln!(out, "{}", SUMMARY_HEADING);
    let _ = writeln!(out, "- **Files Included:** {} (of {} discovered)", ws.len(), ws.discovered);
    if ws.excluded > 0 {
        let _ = writeln!(out, "- **Excluded (lockfiles/build artifacts):** {}", ws.excluded);
    }
    if ws.left_out() > 0 {
        let _ = writeln!(out, "- **Left Out (size/count limits):** {}", ws.left_out());
    }
    let _ = writeln!(out, "- **Total Size:** {} bytes", ws.total_bytes);
    let _ = writeln!(out, "- **File Types:** {}", extension_histogram(ws));

    let priority: Vec<&str> = ws
        .files
        .iter()
        .filter(|s| s.must_include)
        .map(|s| s.file.name.as_str())
        .collect();
    let priority = if priority.is_empty() { "none".to_string() } else { priority.join(", ") };
    let _ = writeln!(out, "- **Priority Files Found:** {}", priority);

    match truncation {
        Some(Truncation::DepthLimit) => {
            let _ = writeln!(out, "- **Walk Truncated:** folder depth limit reached; deeper folders were not read");
        }
        Some(Truncation::DirectoryLimit) => {
            let _ = writeln!(out, "- **Walk Truncated:** folder count limit reached; some folders were not read");
        }
        None => {}
    }

    let _ = writeln!(out, "\n### Directory Structure:");
    let _ = writeln!(out, "```text");
    out.push_str(&directory_tree(ws));
    let _ = writeln!(out, "```\n");
}

/// ".js (2), .json (1)" in extension order
fn extension_histogram(ws: &WorkingSet) -> String {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for scored in &ws.files {
        let key = match scored.file.extension() {
            Some(ext) => format!(".{}", ext),
            None => "(no extension)".to_string(),
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    if counts.is_empty() {
        return "none".to_string();
    }
    counts
        .iter()
        .map(|(ext, n)| format!("{} ({})", ext, n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Indented listing of the included paths, folders marked with '/'
fn directory_tree(ws: &WorkingSet) -> String {
    let mut paths: Vec<&str> = ws.files.iter().map(|s| s.file.path.as_str()).collect();
    paths.sort_unstable();

    let mut out = String::new();
    let mut open: Vec<&str> = Vec::new();
    for path in paths {
        let parts: Vec<&str> = path.split('/').collect();
        let (dirs, name) = parts.split_at(parts.len() - 1);

        let shared = open.iter().zip(dirs).take_while(|(a, b)| a == b).count();
        open.truncate(shared);
        for (level, dir) in dirs.iter().enumerate().skip(shared) {
            let _ = writeln!(out, "{}{}/", "  ".repeat(level), dir);
            open.push(*dir);
        }
        let _ = writeln!(out, "{}{}", "  ".repeat(dirs.len()), name[0]);
    }
    out
}

/// Cuts content past `max_bytes` (on a char boundary) and says so.
pub fn truncate_content(content: &str, max_bytes: usize) -> String {
    if content.len() <= max_bytes {
        return content.to_string();
    }
    let mut cut = max_bytes;
    while !content.is_char_boundary(cut) {
        cut -= 1;
    }
    format!(
        "{}\n... [truncated: showing {} of {} bytes]",
        &content[..cut],
        cut,
        content.len()
    )
}

/// A backtick fence longer than any backtick run inside the content
fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in content.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}
