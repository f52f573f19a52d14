//! The bigram model and everything that reads or writes its counts.
//!
//! - Counting and estimation (`BigramModel`)
//! - Per-context transition tables (`State`)
//! - Weighted sampling and sequence generation (`generator`)

/// Unsmoothed bigram model (`BigramModel`).
///
/// Handles sequence ingestion, count accumulation,
/// conditional probability estimation, and model merging.
pub mod bigram_model;

/// Sequence generation over a trained `BigramModel`.
///
/// Walks the chain from `<s>` using weighted random sampling.
pub mod generator;

/// Internal representation of the transitions observed after one token.
///
/// This module is not exposed publicly.
mod state;
