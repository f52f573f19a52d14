//! Word-level bigram language model.
//!
//! This crate provides an unsmoothed bigram estimator and generator:
//! - Additive training on token sequences framed by `<s>` / `</s>`
//! - Conditional probability queries `P(curr | prev)`
//! - Weighted random generation driven by an injected random source
//! - A readers-writer shared handle for concurrent use
//! - Thin text and file helpers (tokenizing, parallel training, persistence)

/// Bigram model, its per-context states, and generation.
pub mod model;

/// Lock-protected model shared between threads.
pub mod shared;

/// Crate error type.
pub mod error;

/// Text and file helpers around the model.
pub mod io;

pub use error::{BigramError, Result};
pub use model::bigram_model::{BigramModel, ModelStats, END_TOKEN, START_TOKEN};
pub use shared::SharedModel;
