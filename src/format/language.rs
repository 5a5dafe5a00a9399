// src/format/language.rs
// Fence language tags by file extension.

/// Language tag for a code fence, or "" when unknown
pub fn language_for(extension: Option<&str>) -> &'static str {
    match extension.unwrap_or("") {
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "json" => "json",
        "md" | "markdown" => "markdown",
        "html" | "htm" | "ejs" | "hbs" => "html",
        "css" => "css",
        "scss" | "sass" => "scss",
        "less" => "less",
        "vue" => "vue",
        "svelte" => "svelte",
        "py" => "python",
        "java" => "java",
        "kt" => "kotlin",
        "cs" => "csharp",
        "rb" => "ruby",
        "go" => "go",
        "rs" => "rust",
        "c" | "h" => "c",
        "cpp" | "hpp" => "cpp",
        "php" => "php",
        "swift" => "swift",
        "dart" => "dart",
        "sql" => "sql",
        "sh" => "bash",
        "yml" | "yaml" => "yaml",
        "toml" => "toml",
        "xml" => "xml",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown() {
        assert_eq!(language_for(Some("jsx")), "javascript");
        assert_eq!(language_for(Some("py")), "python");
        assert_eq!(language_for(Some("weird")), "");
        assert_eq!(language_for(None), "");
    }
}
