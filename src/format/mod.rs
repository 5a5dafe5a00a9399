// src/format/mod.rs
// =============================================================================
// This module renders (and reads back) the document handed to the grader.
//
// Submodules:
// - document: WorkingSet -> FormattedDocument
// - report: the error-report variant of the same document
// - language: code-fence language tags
// - outline: parses a document back into its list of files
//
// The heading strings below are what the grading prompt keys on. Changing
// them changes what the grader can see.
// =============================================================================

mod document;
mod language;
mod outline;
mod report;

pub use document::{format, FormattedDocument};
pub use outline::outline;
pub use report::error_report;

pub const REPOSITORY_HEADING: &str = "# GitHub Repository: ";
pub const SUMMARY_HEADING: &str = "## Repository Summary:";
pub const FILE_CONTENTS_HEADING: &str = "## File Contents:";
pub const FILE_HEADING: &str = "## File: ";
pub const PRIORITY_MARKER: &str = " 📌";
