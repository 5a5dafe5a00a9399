// src/pipeline/strategy.rs
// =============================================================================
// Fallback strategies for a submission that resolved to nothing.
//
// Students misremember branch names and folder casing all the time. When
// the reference as given yields no files, the orchestrator derives a few
// variations of it and tries them, in this fixed order:
//
//   1. DefaultBranch   - the branch the repository metadata reports
//   2. AlternateBranch - the other conventional name ("main" <-> "master")
//   3. LowercasePath   - "Final-Project" -> "final-project"
//   4. LowercaseRepo   - "Alice/Todo-App" -> "alice/todo-app"
//
// Each strategy is a pure function of the base reference. It returns None
// when it has nothing different to offer.
// =============================================================================

use crate::github::RepoReference;
use std::fmt;

/// What the strategies may know about the repository besides the reference
#[derive(Debug, Clone, Default)]
pub struct StrategyContext {
    /// From repository metadata, when the lookup succeeded
    pub default_branch: Option<String>,
    /// Conventional branch names, in probe order
    pub conventional: Vec<String>,
}

/// A named way of varying a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    DefaultBranch,
    AlternateBranch,
    LowercasePath,
    LowercaseRepo,
}

impl Strategy {
    /// Every fallback, in the order it is tried
    pub const ORDER: [Strategy; 4] = [
        Strategy::DefaultBranch,
        Strategy::AlternateBranch,
        Strategy::LowercasePath,
        Strategy::LowercaseRepo,
    ];

    /// The variation of `base` this strategy proposes, if any.
    ///
    /// `base` must already carry a resolved branch.
    pub fn apply(self, base: &RepoReference, context: &StrategyContext) -> Option<RepoReference> {
        let branch = base.branch.as_deref()?;
        match self {
            Strategy::DefaultBranch => context
                .default_branch
                .as_deref()
                .filter(|default| *default != branch)
                .map(|default| base.with_branch(default)),

            Strategy::AlternateBranch => context
                .conventional
                .iter()
                .find(|name| name.as_str() != branch)
                .map(|name| base.with_branch(name)),

            Strategy::LowercasePath => {
                let lowered = base.path.to_lowercase();
                (lowered != base.path).then(|| RepoReference {
                    path: lowered,
                    ..base.clone()
                })
            }

            Strategy::LowercaseRepo => {
                let owner = base.owner.to_lowercase();
                let repo = base.repo.to_lowercase();
                (owner != base.owner || repo != base.repo).then(|| RepoReference {
                    owner,
                    repo,
                    ..base.clone()
                })
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::DefaultBranch => "default-branch",
            Strategy::AlternateBranch => "alternate-branch",
            Strategy::LowercasePath => "lowercase-path",
            Strategy::LowercaseRepo => "lowercase-repo",
        };
        f.write_str(name)
    }
}
