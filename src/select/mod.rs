// src/select/mod.rs
// =============================================================================
// This module decides which of a submission's files go into the document.
//
// Submodules:
// - score: deterministic relevance score per file
// - working_set: ranks scored files and cuts them down to the ceilings
//
// The walk can easily produce more files than a grading prompt can hold;
// everything downstream only ever sees the WorkingSet built here.
// =============================================================================

mod score;
mod working_set;

pub use score::Scorer;
pub use working_set::{select, Ceilings, WorkingSet};
