use std::collections::HashMap;

use serde::{Deserialize, Serialize};


/// Transition table of a single context token.
///
/// A `State` corresponds to one token observed in the previous-word position
/// (`key`) and stores every token observed immediately after it.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each transition occurrence count is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
	/// Context token.
	key: String,
	/// Outgoing transitions indexed by the next token.
	/// Example: { "cat" => 2, "mat" => 1 }
	transitions: HashMap<String, usize>
}

impl State {
	/// Creates a new empty state for the given context token.
	pub fn new(key: &str) -> Self {
		Self {
			key: key.to_owned(),
			transitions: HashMap::new(),
		}
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	/// Records an occurrence of a transition toward `next`.
	pub fn add_transition(&mut self, next: &str) {
		match self.transitions.get_mut(next) {
			Some(occurrence) => *occurrence += 1,
			None => {
				self.transitions.insert(next.to_owned(), 1);
			}
		}
	}

	/// Number of times `next` followed this context (0 if never).
	pub fn count(&self, next: &str) -> usize {
		self.transitions.get(next).copied().unwrap_or(0)
	}

	/// Sum of all outgoing occurrences.
	pub fn total(&self) -> usize {
		self.transitions.values().sum()
	}

	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	/// Materializes the candidate continuations as a fixed list.
	///
	/// Sorted so that a seeded random source picks the same candidate
	/// regardless of hash ordering.
	pub fn candidates(&self) -> Vec<&str> {
		let mut candidates: Vec<&str> = self.transitions.keys().map(String::as_str).collect();
		candidates.sort_unstable();
		candidates
	}

	/// Merges another state into this one.
	///
	/// Both states must represent the same context token.
	/// Transition occurrence counts are summed.
	///
	/// # Errors
	/// Returns an error message if the state keys do not match.
	pub fn merge(&mut self, other: &Self) -> Result<(), String> {
		if self.key != other.key {
			return Err(format!("Key mismatch: {} != {}", self.key, other.key));
		}

		for (next, occurrence) in &other.transitions {
			*self.transitions.entry(next.clone()).or_insert(0) += *occurrence;
		}

		Ok(())
	}
}
