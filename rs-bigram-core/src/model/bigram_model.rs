use std::collections::{HashMap, HashSet};
use std::iter;

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use super::state::State;
use crate::error::{BigramError, Result};

/// Synthetic token injected before every training sequence.
pub const START_TOKEN: &str = "<s>";

/// Synthetic token injected after every training sequence.
pub const END_TOKEN: &str = "</s>";

/// Unsmoothed word-level bigram model.
///
/// The `BigramModel` counts how often a token follows another one and answers
/// conditional probability queries from those raw counts. Generation lives in
/// the `generator` module.
///
/// # Responsibilities
/// - Accumulate unigram and bigram counts from token sequences (`train`)
/// - Estimate `P(curr | prev)` without smoothing (`bigram_probability`)
/// - Merge with another model (ex. parallel learning)
///
/// # Invariants
/// - For every context `a`, `unigram_counts[a]` equals the sum of the
///   occurrence counts stored in `bigram_counts[a]`
/// - Every token appearing in `bigram_counts` (as a context or as a
///   continuation) belongs to `vocabulary`
/// - Counts only grow: there is no reset nor eviction
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct BigramModel {
	/// Occurrences of a token in the previous-word position.
	unigram_counts: HashMap<String, usize>,

	/// Mapping from a context token to its transition table.
	bigram_counts: HashMap<String, State>,

	/// Every token seen, boundary tokens included.
	vocabulary: HashSet<String>,
}

/// Summary counters of a model.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelStats {
	pub vocabulary_size: usize,
	/// Number of distinct tokens observed in the previous-word position.
	pub contexts: usize,
	/// Number of bigram observations, i.e. the sum of all unigram counts.
	pub observations: usize,
}

impl BigramModel {
	/// Creates an empty model.
	pub fn new() -> Self {
		Self::default()
	}

	/// Trains the model on one token sequence.
	///
	/// The sequence is framed as `[<s>] + tokens + [</s>]` and every adjacent
	/// pair of that framed sequence is counted once. Calls are additive.
	///
	/// # Notes
	/// - An empty sequence still records the `<s> -> </s>` observation.
	/// - Boundary tokens are reserved: if the caller passes one, it is
	///   counted as given and a warning is logged.
	pub fn train<S: AsRef<str>>(&mut self, tokens: &[S]) {
		let framed: Vec<&str> = iter::once(START_TOKEN)
			.chain(tokens.iter().map(AsRef::as_ref))
			.chain(iter::once(END_TOKEN))
			.collect();

		if framed[1..framed.len() - 1].iter().any(|t| *t == START_TOKEN || *t == END_TOKEN) {
			warn!("training sequence contains a reserved boundary token");
		}
		debug!("training on {} tokens: {:?}", tokens.len(), framed);

		for pair in framed.windows(2) {
			let (prev, curr) = (pair[0], pair[1]);
			trace!("observed {prev:?} -> {curr:?}");
			self.observe(prev, curr);
		}

		debug!(
			"model now has {} contexts and {} vocabulary tokens",
			self.unigram_counts.len(),
			self.vocabulary.len()
		);
	}

	/// Records one `(prev, curr)` observation.
	///
	/// The only place where counts change, which keeps the sum invariant.
	fn observe(&mut self, prev: &str, curr: &str) {
		*self.unigram_counts.entry(prev.to_owned()).or_insert(0) += 1;
		self.bigram_counts
			.entry(prev.to_owned())
			.or_insert_with(|| State::new(prev))
			.add_transition(curr);

		for token in [prev, curr] {
			if !self.vocabulary.contains(token) {
				self.vocabulary.insert(token.to_owned());
			}
		}
	}

	/// Returns `P(curr | prev)`, unsmoothed.
	///
	/// - `0.0` if `prev` was never observed in the previous-word position
	/// - `0.0` if `curr` never followed `prev`
	/// - `count(prev, curr) / count(prev)` otherwise
	pub fn bigram_probability(&self, prev: &str, curr: &str) -> f64 {
		let prev_count = self.unigram_count(prev);
		if prev_count == 0 {
			return 0.0;
		}
		self.bigram_count(prev, curr) as f64 / prev_count as f64
	}

	/// Occurrences of `token` in the previous-word position.
	pub fn unigram_count(&self, token: &str) -> usize {
		self.unigram_counts.get(token).copied().unwrap_or(0)
	}

	/// Occurrences of `curr` immediately following `prev`.
	pub fn bigram_count(&self, prev: &str, curr: &str) -> usize {
		self.bigram_counts.get(prev).map_or(0, |state| state.count(curr))
	}

	/// Tokens ever observed after `prev`, sorted.
	pub fn successors(&self, prev: &str) -> Vec<&str> {
		self.bigram_counts.get(prev).map(State::candidates).unwrap_or_default()
	}

	pub(crate) fn state(&self, prev: &str) -> Option<&State> {
		self.bigram_counts.get(prev)
	}

	pub fn vocabulary(&self) -> impl Iterator<Item=&str> {
		self.vocabulary.iter().map(String::as_str)
	}

	pub fn vocabulary_size(&self) -> usize {
		self.vocabulary.len()
	}

	/// Iterates over every context token and its unigram count.
	pub fn contexts(&self) -> impl Iterator<Item=(&str, usize)> {
		self.unigram_counts.iter().map(|(k, v)| (k.as_str(), *v))
	}

	/// `true` if nothing was ever trained.
	pub fn is_empty(&self) -> bool {
		self.unigram_counts.is_empty()
	}

	pub fn stats(&self) -> ModelStats {
		ModelStats {
			vocabulary_size: self.vocabulary.len(),
			contexts: self.unigram_counts.len(),
			observations: self.unigram_counts.values().sum(),
		}
	}

	/// Checks the count invariants, ex. after decoding a model from disk.
	///
	/// # Errors
	/// Returns `InvalidArgument` naming the first context whose counts disagree,
	/// whose transitions are stored under another key, or the first token
	/// missing from the vocabulary.
	pub fn validate(&self) -> Result<()> {
		if self.unigram_counts.len() != self.bigram_counts.len() {
			return Err(BigramError::InvalidArgument("unigram and bigram contexts differ".to_owned()));
		}
		for (context, count) in &self.unigram_counts {
			let state = self.bigram_counts.get(context).ok_or_else(|| {
				BigramError::InvalidArgument(format!("no transitions for context {context:?}"))
			})?;
			if state.key() != context.as_str() {
				return Err(BigramError::InvalidArgument(format!(
					"transitions of {:?} stored under context {context:?}",
					state.key()
				)));
			}
			if state.total() != *count {
				return Err(BigramError::InvalidArgument(format!(
					"context {context:?} counts {count} but its transitions sum to {}",
					state.total()
				)));
			}
			if let Some(missing) = iter::once(context.as_str())
				.chain(state.candidates())
				.find(|token| !self.vocabulary.contains(*token))
			{
				return Err(BigramError::InvalidArgument(format!("{missing:?} is not in the vocabulary")));
			}
		}
		Ok(())
	}

	/// Merges another model into this one.
	///
	/// Occurrence counts of matching contexts and transitions are summed,
	/// vocabularies are united. Either everything is merged or nothing is.
	///
	/// # Errors
	/// Returns `InvalidArgument`, leaving `self` untouched, if `other` breaks
	/// the model invariants or if a transition table of `self` is stored under
	/// a key other than its own.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		other.validate()?;
		for key in other.bigram_counts.keys() {
			if let Some(existing) = self.bigram_counts.get(key) {
				if existing.key() != key.as_str() {
					return Err(BigramError::InvalidArgument(format!(
						"transitions of {:?} stored under context {key:?}",
						existing.key()
					)));
				}
			}
		}

		for (key, count) in &other.unigram_counts {
			*self.unigram_counts.entry(key.clone()).or_insert(0) += *count;
		}

		for (key, state) in &other.bigram_counts {
			if let Some(existing) = self.bigram_counts.get_mut(key) {
				existing.merge(state).map_err(BigramError::InvalidArgument)?;
			} else {
				self.bigram_counts.insert(key.clone(), state.clone());
			}
		}

		self.vocabulary.extend(other.vocabulary.iter().cloned());
		Ok(())
	}
}
