// src/format/report.rs
// =============================================================================
// The error-report variant of a FormattedDocument.
//
// When acquisition fails, the grader still gets a document: the submission
// URL, a machine reason code, a readable explanation, and hints the
// instructor can pass on to the student. The reason code is what lets the
// grading side tell "private repo" apart from "no source files" apart from
// "typo in the URL".
// =============================================================================

use super::document::FormattedDocument;
use crate::error::AcquireError;
use std::fmt::Write as _;

pub const ERROR_HEADING: &str = "# GitHub Repository Access Error";

/// Builds the error report for `url`.
pub fn error_report(url: &str, error: &AcquireError) -> FormattedDocument {
    let mut out = String::new();
    let _ = writeln!(out, "{}\n", ERROR_HEADING);
    let _ = writeln!(out, "## Repository URL: {}\n", url);

    let _ = writeln!(out, "## Error Details:");
    let _ = writeln!(out, "- **Reason:** {}", error.reason_code());
    let _ = writeln!(out, "- **Error Type:** {}", headline(error));
    let _ = writeln!(out, "- **Details:** {}", error);
    let _ = writeln!(out, "- **Repository Accessible:** {}\n", accessibility(error));

    let _ = writeln!(out, "## Troubleshooting:");
    for (i, hint) in hints(error).iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, hint);
    }

    let _ = writeln!(out, "\n## Grading Note:");
    let _ = writeln!(out, "{}", grading_note(error));

    FormattedDocument::report(out, error)
}

fn headline(error: &AcquireError) -> &'static str {
    match error {
        AcquireError::InvalidUrl(_) => "Malformed or unsupported GitHub URL",
        AcquireError::NotFound(_) => "Repository, branch or path not found",
        AcquireError::AccessDenied(_) => "Repository is private or access was refused",
        AcquireError::EmptyResult(_) => "No recognizable source files",
        AcquireError::Timeout(_) => "GitHub did not respond in time",
        AcquireError::Network(_) => "Network error while contacting GitHub",
        AcquireError::Decode(_) => "Could not read repository content",
        AcquireError::Config(_) => "Grader configuration error",
    }
}

fn accessibility(error: &AcquireError) -> &'static str {
    match error {
        AcquireError::AccessDenied(_) => "❌ No (private or rate-limited)",
        AcquireError::EmptyResult(_) => "✅ Yes, but nothing gradeable was found",
        _ => "❌ Unable to verify",
    }
}

fn hints(error: &AcquireError) -> Vec<&'static str> {
    match error {
        AcquireError::InvalidUrl(_) => vec![
            "Submit a link of the form https://github.com/<user>/<repository>",
            "Links to a folder (/tree/...) or a file (/blob/...) are also accepted",
            "Check for typos or extra text pasted around the link",
        ],
        AcquireError::NotFound(_) => vec![
            "Check the URL is correct (user name, repository name, branch)",
            "Verify all files are committed and pushed",
            "Make sure the repository was not renamed or deleted",
        ],
        AcquireError::AccessDenied(_) => vec![
            "Ensure the repository is public",
            "If the repository is public, GitHub may be rate limiting: retry later",
        ],
        AcquireError::EmptyResult(_) => vec![
            "Verify the source files are committed and pushed, not just the README",
            "Check the project is not only inside an ignored folder (node_modules, dist, build)",
            "If the project lives in a subfolder, submit the link to that folder",
        ],
        AcquireError::Timeout(_) | AcquireError::Network(_) | AcquireError::Decode(_) => vec![
            "Retry grading in a few minutes",
            "Check the grader machine's network connection",
        ],
        AcquireError::Config(_) => vec!["Fix the grader configuration file and rerun"],
    }
}

fn grading_note(error: &AcquireError) -> &'static str {
    match error {
        AcquireError::EmptyResult(_) => {
            "The repository was reachable but contained no gradeable source code."
        }
        AcquireError::AccessDenied(_) => {
            "Unable to evaluate the code: the repository could not be accessed (likely private)."
        }
        _ => "Unable to fully evaluate the submission due to repository access issues.",
    }
}
