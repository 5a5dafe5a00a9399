// src/pipeline/mod.rs
// =============================================================================
// This module runs one submission through the whole acquisition pipeline.
//
// How it works:
// 1. Classify the submission URL
// 2. Pin the reference to a concrete branch
// 3. Gather files: one file for a blob URL, a tree walk otherwise
// 4. If that resolved to nothing, try the fallback strategies in order
// 5. Select the working set and render the document
//
// acquire() never fails. Whatever goes wrong ends up as an error-report
// document carrying a reason code, so the caller always gets one artifact
// shape back.
//
// Which error is reported:
// - AccessDenied stops everything immediately (no variation will help)
// - otherwise it is the failure of the reference as given; fallbacks that
//   also fail don't replace it
// =============================================================================

mod strategy;

use strategy::{Strategy, StrategyContext};

use crate::config::AcquireConfig;
use crate::error::{AcquireError, Result};
use crate::format::{error_report, format, FormattedDocument};
use crate::github::{
    ContentFetcher, DirectoryRole, FileDescriptor, HttpTransport, RefKind, RepoReference, Transport,
    TreeWalker, Truncation, UrlClassifier,
};
use crate::select::{select, Ceilings, Scorer};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Manifests fetched from the repository root when only a source folder
/// was submitted
const ROOT_MANIFESTS: [&str; 1] = ["package.json"];

// Files gathered for one reference, before selection
#[derive(Debug)]
struct Gathered {
    reference: RepoReference,
    files: Vec<FileDescriptor>,
    truncation: Option<Truncation>,
}

/// Acquisition pipeline for one grading run
pub struct Pipeline {
    config: AcquireConfig,
    classifier: UrlClassifier,
    fetcher: ContentFetcher,
    scorer: Scorer,
}

impl Pipeline {
    pub fn new(config: AcquireConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: UrlClassifier::new(&config.hosts, &config.filters),
            fetcher: ContentFetcher::new(transport, &config.hosts, &config.branches)?,
            scorer: Scorer::new(&config.filters),
            config,
        })
    }

    /// Pipeline talking to GitHub over HTTP
    pub fn with_http(config: AcquireConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config.hosts.user_agent, config.walk.request_timeout())?;
        Self::new(config, Arc::new(transport))
    }

    /// Turns a submission URL into a document (or an error report).
    pub async fn acquire(&self, url: &str) -> FormattedDocument {
        match self.try_acquire(url).await {
            Ok(document) => document,
            Err(e) => {
                warn!(url, reason = e.reason_code(), error = %e, "acquisition failed");
                error_report(url, &e)
            }
        }
    }

    async fn try_acquire(&self, url: &str) -> Result<FormattedDocument> {
        let reference = self.classifier.classify(url)?;
        info!(reference = %reference, kind = ?reference.kind, "classified submission");

        let branch = self.fetcher.resolve_branch(&reference).await?;
        let base = reference.with_branch(&branch);

        let gathered = self.gather(&base).await?;
        let ws = select(
            &gathered.files,
            &self.scorer,
            Ceilings::from(&self.config.limits),
        );
        info!(
            selected = ws.len(),
            discovered = ws.discovered,
            excluded = ws.excluded,
            bytes = ws.total_bytes,
            "working set ready"
        );

        if ws.is_empty() {
            return Err(AcquireError::EmptyResult(format!(
                "{} file(s) found in {}, none of them source code",
                ws.discovered, gathered.reference
            )));
        }

        Ok(format(
            &ws,
            &gathered.reference,
            gathered.truncation,
            self.config.limits.max_file_bytes,
        ))
    }

    /// Tries the reference as given, then each fallback strategy.
    async fn gather(&self, base: &RepoReference) -> Result<Gathered> {
        let first_failure = match self.attempt(base).await {
            Ok(gathered) => return Ok(gathered),
            Err(e @ AcquireError::AccessDenied(_)) => return Err(e),
            Err(e) => e,
        };
        info!(reference = %base, error = %first_failure, "nothing found, trying fallbacks");

        let context = StrategyContext {
            default_branch: self.lookup_default_branch(base).await?,
            conventional: self.config.branches.conventional.clone(),
        };

        let mut tried = HashSet::from([base.to_string()]);
        for strategy in Strategy::ORDER {
            let Some(candidate) = strategy.apply(base, &context) else {
                continue;
            };
            if !tried.insert(candidate.to_string()) {
                continue;
            }

            debug!(%strategy, reference = %candidate, "trying fallback");
            match self.attempt(&candidate).await {
                Ok(gathered) => {
                    info!(%strategy, reference = %candidate, "fallback succeeded");
                    return Ok(gathered);
                }
                Err(e @ AcquireError::AccessDenied(_)) => return Err(e),
                Err(e) => debug!(%strategy, error = %e, "fallback failed"),
            }
        }

        Err(first_failure)
    }

    async fn lookup_default_branch(&self, r: &RepoReference) -> Result<Option<String>> {
        match self.fetcher.default_branch(r).await {
            Ok(branch) => Ok(branch),
            Err(e @ AcquireError::AccessDenied(_)) => Err(e),
            Err(e) => {
                warn!(error = %e, "default branch lookup failed");
                Ok(None)
            }
        }
    }

    /// One attempt at a concrete reference. NotFound or EmptyResult mean
    /// "resolved to nothing"; the caller may try a variation.
    async fn attempt(&self, r: &RepoReference) -> Result<Gathered> {
        match r.kind {
            RefKind::File => self.gather_file(r).await,
            RefKind::Directory | RefKind::Root => self.gather_tree(r).await,
        }
    }

    async fn gather_file(&self, r: &RepoReference) -> Result<Gathered> {
        let file = self.fetcher.fetch_file(r, &r.path).await?.ok_or_else(|| {
            AcquireError::NotFound(format!("file {} does not exist in {}", r.path, r))
        })?;

        Ok(Gathered {
            reference: r.clone(),
            files: vec![file],
            truncation: None,
        })
    }

    async fn gather_tree(&self, r: &RepoReference) -> Result<Gathered> {
        // A nested project is shown as if it were the repository root
        let strip_prefix = match r.role {
            Some(DirectoryRole::NestedProject) => r.path.as_str(),
            _ => "",
        };

        let walker = TreeWalker::new(&self.fetcher, &self.config.walk, &self.config.filters);
        let outcome = walker.walk(r, &r.path, strip_prefix).await?;

        if !outcome.root_found {
            return Err(AcquireError::NotFound(format!("{} does not exist", r)));
        }
        if outcome.files.is_empty() {
            return Err(AcquireError::EmptyResult(format!("no files found in {}", r)));
        }

        let mut files = outcome.files;
        if r.role == Some(DirectoryRole::SourceFolder) {
            self.add_root_manifests(r, &mut files).await?;
        }

        Ok(Gathered {
            reference: r.clone(),
            files,
            truncation: outcome.truncation,
        })
    }

    async fn add_root_manifests(&self, r: &RepoReference, files: &mut Vec<FileDescriptor>) -> Result<()> {
        for manifest in ROOT_MANIFESTS {
            if files.iter().any(|f| f.path == manifest) {
                continue;
            }
            match self.fetcher.fetch_file(r, manifest).await {
                Ok(Some(file)) => {
                    debug!(path = manifest, "added root manifest");
                    files.push(file);
                }
                Ok(None) => debug!(path = manifest, "no root manifest"),
                Err(e @ AcquireError::AccessDenied(_)) => return Err(e),
                Err(e) => warn!(path = manifest, error = %e, "root manifest fetch failed"),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::outline;
    use crate::github::fake::{contents_url, FakeTransport};

    fn pipeline(fake: &Arc<FakeTransport>) -> Pipeline {
        Pipeline::new(AcquireConfig::default(), fake.clone()).unwrap()
    }

    fn paths(document: &FormattedDocument) -> Vec<String> {
        outline(document.as_str()).files.into_iter().map(|e| e.path).collect()
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[tokio::test]
    async fn test_root_repository_skips_node_modules() {
        let fake = Arc::new(FakeTransport::new());
        fake.branch("alice", "todo-app", "main").dir(
            "alice",
            "todo-app",
            "main",
            "",
            &[
                ("package.json", "file", 40),
                ("index.html", "file", 60),
                ("script.js", "file", 50),
                ("node_modules", "dir", 0),
            ],
        );
        fake.raw_file("alice", "todo-app", "main", "package.json", r#"{ "name": "todo-app", "version": "1.0.0" }"#)
            .raw_file("alice", "todo-app", "main", "index.html", "<!doctype html><script src=\"script.js\"></script>")
            .raw_file("alice", "todo-app", "main", "script.js", "document.querySelector('#add').onclick = addTodo;");

        let vendored: Vec<String> = (0..500).map(|i| format!("dep{}.js", i)).collect();
        let entries: Vec<(&str, &str, u64)> = vendored.iter().map(|n| (n.as_str(), "file", 10)).collect();
        fake.dir("alice", "todo-app", "main", "node_modules", &entries);

        let doc = pipeline(&fake).acquire("https://github.com/alice/todo-app").await;

        assert!(!doc.is_error_report(), "{}", doc);
        assert_eq!(
            sorted(paths(&doc)),
            vec!["index.html", "package.json", "script.js"]
        );
        assert!(!fake.requested("node_modules"));
        assert!(doc.as_str().contains("- **Branch:** main"));
    }

    #[tokio::test]
    async fn test_nested_project_paths_drop_prefix() {
        let fake = Arc::new(FakeTransport::new());
        fake.dir(
            "bob",
            "cs50",
            "main",
            "Final-Project",
            &[("package.json", "file", 30), ("src", "dir", 0)],
        )
        .raw_file("bob", "cs50", "main", "Final-Project/package.json", r#"{ "name": "final" }"#)
        .dir_with_files(
            "bob",
            "cs50",
            "main",
            "Final-Project/src",
            &[("App.js", "export default function App() { return null; }")],
        );

        let doc = pipeline(&fake)
            .acquire("https://github.com/bob/cs50/tree/main/Final-Project")
            .await;

        assert!(!doc.is_error_report(), "{}", doc);
        assert_eq!(sorted(paths(&doc)), vec!["package.json", "src/App.js"]);
        assert!(doc.as_str().contains("Your project is nested in a subdirectory (Final-Project/)"));
        // Branch came from the URL, so nothing was probed
        assert!(!fake.requested("/branches/"));
    }

    #[tokio::test]
    async fn test_private_repository_reports_access_denied() {
        let url = "https://github.com/eve/secret-project";
        let fake = Arc::new(FakeTransport::new());
        fake.reply(
            "https://api.github.com/repos/eve/secret-project/branches/main",
            403,
            "",
        );

        let doc = pipeline(&fake).acquire(url).await;

        assert!(doc.is_error_report());
        assert_eq!(doc.failure_reason(), Some("access_denied"));
        assert!(doc.as_str().contains(url));
        assert!(!doc.as_str().contains("- **Reason:** not_found"));
    }

    #[tokio::test]
    async fn test_denied_listing_is_not_retried() {
        let fake = Arc::new(FakeTransport::new());
        fake.reply(&contents_url("eve", "site", "main", "src"), 403, "");

        let doc = pipeline(&fake)
            .acquire("https://github.com/eve/site/tree/main/src")
            .await;

        assert_eq!(doc.failure_reason(), Some("access_denied"));
        assert!(!fake.requested("ref=master"));
    }

    #[tokio::test]
    async fn test_develop_branch_found_through_metadata() {
        let fake = Arc::new(FakeTransport::new());
        fake.repo("carol", "game", "develop").dir_with_files(
            "carol",
            "game",
            "develop",
            "",
            &[
                ("index.html", "<canvas id=\"board\"></canvas>"),
                ("game.js", "const board = document.getElementById('board');"),
            ],
        );

        let doc = pipeline(&fake).acquire("https://github.com/carol/game").await;

        assert!(!doc.is_error_report(), "{}", doc);
        assert!(doc.as_str().contains("- **Branch:** develop"));
        assert_eq!(sorted(paths(&doc)), vec!["game.js", "index.html"]);
    }

    #[tokio::test]
    async fn test_metadata_fetched_once_across_fallbacks() {
        let fake = Arc::new(FakeTransport::new());
        fake.repo("hana", "quiz", "develop")
            .dir("hana", "quiz", "develop", "", &[("node_modules", "dir", 0)]);

        let doc = pipeline(&fake).acquire("https://github.com/hana/quiz").await;

        assert_eq!(doc.failure_reason(), Some("empty_result"));
        let metadata = "https://api.github.com/repos/hana/quiz".to_string();
        let lookups = fake.requests().iter().filter(|u| **u == metadata).count();
        assert_eq!(lookups, 1);
    }

    #[tokio::test]
    async fn test_penalized_files_still_reach_the_document() {
        let fake = Arc::new(FakeTransport::new());
        fake.branch("ivan", "clock", "main").dir_with_files(
            "ivan",
            "clock",
            "main",
            "",
            &[
                ("app.js", "setInterval(() => render(new Date()), 1000);"),
                (".gitignore", "node_modules\n"),
            ],
        );

        let doc = pipeline(&fake).acquire("https://github.com/ivan/clock").await;

        assert!(!doc.is_error_report(), "{}", doc);
        assert_eq!(paths(&doc), vec!["app.js", ".gitignore"]);
        assert!(!doc.as_str().contains("Excluded (lockfiles/build artifacts)"));
    }

    #[tokio::test]
    async fn test_excluded_start_folder_is_empty_result() {
        let fake = Arc::new(FakeTransport::new());
        fake.dir_with_files("ivan", "clock", "main", "src/build", &[("bundle.js", "(()=>{render()})();")]);

        let doc = pipeline(&fake)
            .acquire("https://github.com/ivan/clock/tree/main/src/build")
            .await;

        assert_eq!(doc.failure_reason(), Some("empty_result"));
        assert!(!fake.requested("bundle.js"));
    }

    #[tokio::test]
    async fn test_single_file_with_special_characters() {
        let fake = Arc::new(FakeTransport::new());
        fake.raw_file(
            "dana",
            "game",
            "main",
            "my%20folder/Game%20%231.js",
            "let score = 0;\nfunction tick() { score += 1; }\n",
        );

        let doc = pipeline(&fake)
            .acquire("https://github.com/dana/game/blob/main/my%20folder/Game%20%231.js")
            .await;

        assert!(!doc.is_error_report(), "{}", doc);
        assert_eq!(paths(&doc), vec!["my folder/Game #1.js"]);
        assert!(doc.as_str().contains("function tick()"));
    }

    #[tokio::test]
    async fn test_missing_file_reports_not_found() {
        let fake = Arc::new(FakeTransport::new());
        let doc = pipeline(&fake)
            .acquire("https://github.com/dana/game/blob/main/missing.js")
            .await;

        assert_eq!(doc.failure_reason(), Some("not_found"));
        // The alternate branch was tried before giving up
        assert!(fake.requested("/dana/game/master/missing.js"));
    }

    #[tokio::test]
    async fn test_lowercase_path_fallback() {
        let fake = Arc::new(FakeTransport::new());
        fake.repo("bob", "cs50", "main").dir_with_files(
            "bob",
            "cs50",
            "main",
            "final-project",
            &[("index.html", "<h1>Final</h1>"), ("app.js", "console.log('final');")],
        );

        let doc = pipeline(&fake)
            .acquire("https://github.com/bob/cs50/tree/main/Final-Project")
            .await;

        assert!(!doc.is_error_report(), "{}", doc);
        assert_eq!(sorted(paths(&doc)), vec!["app.js", "index.html"]);
        // Tried in order: as given, then master, then the lowercased path
        assert!(fake.requested(&contents_url("bob", "cs50", "master", "Final-Project")));
    }

    #[tokio::test]
    async fn test_source_folder_adds_root_manifest() {
        let fake = Arc::new(FakeTransport::new());
        fake.dir_with_files(
            "frank",
            "shop",
            "main",
            "src",
            &[("cart.js", "export const cart = [];")],
        )
        .raw_file("frank", "shop", "main", "package.json", r#"{ "name": "shop" }"#);

        let doc = pipeline(&fake)
            .acquire("https://github.com/frank/shop/tree/main/src")
            .await;

        assert!(!doc.is_error_report(), "{}", doc);
        assert_eq!(sorted(paths(&doc)), vec!["package.json", "src/cart.js"]);
        assert!(!doc.as_str().contains("Note for Student"));
    }

    #[tokio::test]
    async fn test_only_lockfiles_is_empty_result() {
        let fake = Arc::new(FakeTransport::new());
        fake.branch("gina", "notes", "main").dir_with_files(
            "gina",
            "notes",
            "main",
            "",
            &[("package-lock.json", "{ \"lockfileVersion\": 3 }")],
        );

        let doc = pipeline(&fake).acquire("https://github.com/gina/notes").await;

        assert_eq!(doc.failure_reason(), Some("empty_result"));
    }

    #[tokio::test]
    async fn test_empty_walk_keeps_first_failure() {
        let fake = Arc::new(FakeTransport::new());
        fake.branch("gina", "notes", "main")
            .dir("gina", "notes", "main", "", &[("node_modules", "dir", 0)]);

        let doc = pipeline(&fake).acquire("https://github.com/gina/notes").await;

        // master doesn't exist either, but the repository itself was reachable
        assert_eq!(doc.failure_reason(), Some("empty_result"));
        assert!(fake.requested(&contents_url("gina", "notes", "master", "")));
    }

    #[tokio::test]
    async fn test_invalid_url_reports_without_requests() {
        let fake = Arc::new(FakeTransport::new());
        let doc = pipeline(&fake).acquire("https://gitlab.com/alice/todo-app").await;

        assert_eq!(doc.failure_reason(), Some("invalid_url"));
        assert!(fake.requests().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AcquireConfig::default();
        config.limits.max_files = 0;
        let fake: Arc<dyn Transport> = Arc::new(FakeTransport::new());
        assert!(matches!(
            Pipeline::new(config, fake),
            Err(AcquireError::Config(_))
        ));
    }
}
