use log::trace;
use rand::Rng;

use super::bigram_model::{BigramModel, END_TOKEN, START_TOKEN};
use crate::error::{BigramError, Result};

/// Picks one item with a probability proportional to its weight.
///
/// This method performs:
/// - an O(n) scan over the candidates
/// - a cumulative subtraction to select a bucket
///
/// Returns `None` if there is no candidate or if no weight is positive.
pub fn weighted_choice<T: Copy, R: Rng + ?Sized>(candidates: &[T], weights: &[f64], rng: &mut R) -> Option<T> {
	let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
	if candidates.is_empty() || total <= 0.0 {
		return None;
	}

	let mut r = rng.random::<f64>() * total;

	let mut fallback: Option<T> = None;
	for (candidate, weight) in candidates.iter().zip(weights) {
		if *weight <= 0.0 {
			continue;
		}
		if r < *weight {
			return Some(*candidate);
		}
		r -= weight;
		fallback = Some(*candidate);
	}

	// Floating point rounding can leave `r` just above the last bucket
	fallback
}

impl BigramModel {
	/// Generates a token sequence by walking the bigram chain from `<s>`.
	///
	/// At each step the continuations observed after the current token are
	/// weighted by `bigram_probability(current, candidate)` and one is drawn
	/// from `rng`. Generation stops when:
	/// - `</s>` is drawn (it is not part of the output)
	/// - the current token has no recorded continuation
	/// - `max_length` transitions have been performed
	///
	/// The random source is injected so that a seeded generator reproduces
	/// the same output.
	///
	/// # Errors
	/// Returns `InvalidArgument` if `max_length` is 0.
	pub fn generate<R: Rng + ?Sized>(&self, max_length: usize, rng: &mut R) -> Result<Vec<String>> {
		if max_length == 0 {
			return Err(BigramError::InvalidArgument("max_length must be greater than 0".to_owned()));
		}

		let mut output = Vec::new();
		let mut current = START_TOKEN;

		for _ in 0..max_length {
			let candidates = match self.state(current) {
				Some(state) if !state.is_empty() => state.candidates(),
				_ => {
					trace!("no continuation after {current:?}");
					return Ok(output);
				}
			};

			let weights: Vec<f64> = candidates
				.iter()
				.map(|candidate| self.bigram_probability(current, candidate))
				.collect();

			current = match weighted_choice(&candidates, &weights, rng) {
				Some(next) => next,
				None => return Ok(output),
			};

			if current == END_TOKEN {
				trace!("reached {END_TOKEN} after {} tokens", output.len());
				return Ok(output);
			}
			output.push(current.to_owned());
		}

		trace!("stopped at max_length {max_length}");
		Ok(output)
	}

	/// Same as [`generate`](Self::generate), tokens joined with a single space.
	pub fn generate_text<R: Rng + ?Sized>(&self, max_length: usize, rng: &mut R) -> Result<String> {
		Ok(self.generate(max_length, rng)?.join(" "))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	fn trained(corpora: &[&[&str]]) -> BigramModel {
		let mut model = BigramModel::new();
		for &tokens in corpora {
			model.train(tokens);
		}
		model
	}

	#[test]
	fn zero_max_length_is_rejected() {
		let model = trained(&[&["a"]]);
		let mut rng = StdRng::seed_from_u64(0);
		assert!(matches!(model.generate(0, &mut rng), Err(BigramError::InvalidArgument(_))));
	}

	#[test]
	fn untrained_model_generates_nothing() {
		let model = BigramModel::new();
		let mut rng = StdRng::seed_from_u64(0);
		assert!(model.generate(20, &mut rng).unwrap().is_empty());
	}

	#[test]
	fn empty_corpus_generates_nothing() {
		let model = trained(&[&[]]);
		for seed in 0..10 {
			let mut rng = StdRng::seed_from_u64(seed);
			assert!(model.generate(20, &mut rng).unwrap().is_empty());
		}
	}

	#[test]
	fn single_path_chain_is_reproduced() {
		let model = trained(&[&["a", "b", "c"]]);
		let mut rng = StdRng::seed_from_u64(7);
		assert_eq!(model.generate(20, &mut rng).unwrap(), vec!["a", "b", "c"]);
		assert_eq!(model.generate_text(20, &mut rng).unwrap(), "a b c");
	}

	#[test]
	fn max_length_bounds_the_transitions() {
		let tokens = ["one", "two", "three", "four", "five", "six"];
		let model = trained(&[&tokens[..]]);
		let mut rng = StdRng::seed_from_u64(1);
		assert_eq!(model.generate(3, &mut rng).unwrap(), vec!["one", "two", "three"]);
		assert_eq!(model.generate(1, &mut rng).unwrap(), vec!["one"]);
	}

	#[test]
	fn same_seed_same_output() {
		let corpus: Vec<&str> = "the cat sat on the mat the cat ate food".split_whitespace().collect();
		let model = trained(&[&corpus[..], &["the", "dog", "sat", "on", "the", "cat"]]);

		for seed in [0, 42, 1337] {
			let first = model.generate(20, &mut StdRng::seed_from_u64(seed)).unwrap();
			let second = model.generate(20, &mut StdRng::seed_from_u64(seed)).unwrap();
			assert_eq!(first, second);
		}
	}

	#[test]
	fn seeded_draws_on_reference_corpus_are_pinned() {
		let corpus: Vec<&str> = "the cat sat on the mat the cat ate food".split_whitespace().collect();
		let model = trained(&[&corpus[..]]);

		let mut rng = StdRng::seed_from_u64(1337);
		assert_eq!(model.generate(20, &mut rng).unwrap(), vec!["the", "cat", "ate", "food"]);

		let mut rng = StdRng::seed_from_u64(0);
		assert_eq!(
			model.generate(20, &mut rng).unwrap(),
			vec!["the", "mat", "the", "cat", "ate", "food"]
		);
	}

	#[test]
	fn output_only_follows_observed_transitions() {
		let corpus: Vec<&str> = "the cat sat on the mat the cat ate food".split_whitespace().collect();
		let model = trained(&[&corpus[..]]);

		for seed in 0..50 {
			let mut rng = StdRng::seed_from_u64(seed);
			let output = model.generate(8, &mut rng).unwrap();
			assert!(output.len() <= 8);
			let mut prev = START_TOKEN;
			for token in &output {
				assert!(model.bigram_count(prev, token) > 0, "{prev} -> {token} never observed");
				prev = token.as_str();
			}
		}
	}

	#[test]
	fn draws_follow_observed_frequencies() {
		let model = trained(&[&["x"], &["x"], &["x"], &["y"]]);
		let mut rng = StdRng::seed_from_u64(2024);

		let draws = 4000;
		let mut x = 0;
		for _ in 0..draws {
			if model.generate(1, &mut rng).unwrap() == vec!["x"] {
				x += 1;
			}
		}
		let ratio = x as f64 / draws as f64;
		assert!((ratio - 0.75).abs() < 0.05, "ratio {ratio}");
	}

	#[test]
	fn weighted_choice_skips_zero_weights() {
		let mut rng = StdRng::seed_from_u64(9);
		for _ in 0..100 {
			assert_eq!(weighted_choice(&["a", "b", "c"], &[0.0, 1.0, 0.0], &mut rng), Some("b"));
		}
		assert_eq!(weighted_choice::<&str, _>(&[], &[], &mut rng), None);
		assert_eq!(weighted_choice(&["a"], &[0.0], &mut rng), None);
	}
}
