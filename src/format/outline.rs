// src/format/outline.rs
// =============================================================================
// Reads a produced document back: which repository, which files.
//
// We parse with pulldown-cmark rather than scanning lines, because file
// contents (a student's README, say) can contain lines that look exactly
// like our headings. Inside a fenced code block they are code, not
// headings, and the parser knows that.
//
// Heading text is taken from the source range of the heading, not from the
// parsed inline text, so paths like "__init__.py" are not read as markup.
// =============================================================================

use super::report::ERROR_HEADING;
use super::{FILE_HEADING, PRIORITY_MARKER, REPOSITORY_HEADING};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineEntry {
    pub path: String,
    /// Marked as a must-include file
    pub priority: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentOutline {
    /// "owner/repo" from the title, when present
    pub repository: Option<String>,
    pub is_error_report: bool,
    pub files: Vec<OutlineEntry>,
}

pub fn outline(document: &str) -> DocumentOutline {
    let mut result = DocumentOutline::default();

    for (event, range) in Parser::new(document).into_offset_iter() {
        let level = match event {
            Event::Start(Tag::Heading(level, _, _)) => level,
            _ => continue,
        };
        let line = document[range].trim();

        match level {
            HeadingLevel::H1 => {
                if line == ERROR_HEADING {
                    result.is_error_report = true;
                } else if let Some(slug) = line.strip_prefix(REPOSITORY_HEADING) {
                    result.repository = Some(slug.trim().to_string());
                }
            }
            HeadingLevel::H2 => {
                if let Some(rest) = line.strip_prefix(FILE_HEADING) {
                    let (path, priority) = match rest.strip_suffix(PRIORITY_MARKER) {
                        Some(path) => (path, true),
                        None => (rest, false),
                    };
                    result.files.push(OutlineEntry {
                        path: path.to_string(),
                        priority,
                    });
                }
            }
            _ => {}
        }
    }

    result
}
