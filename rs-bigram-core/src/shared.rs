use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

use rand::Rng;

use crate::error::{BigramError, Result};
use crate::model::bigram_model::{BigramModel, ModelStats};

/// Thread-safe handle over a [`BigramModel`].
///
/// Cloning the handle shares the same model. Mutations (`train`, `merge`,
/// `replace`) take the write lock; queries take the read lock, so readers run
/// concurrently with each other but never with a writer.
///
/// Two locking disciplines are offered:
/// - blocking: every method waits for the lock
/// - non-blocking: `try_*` methods fail with [`BigramError::Busy`] instead
///
/// A lock poisoned by a panicking writer is reported as [`BigramError::Poisoned`].
#[derive(Clone, Debug, Default)]
pub struct SharedModel {
	inner: Arc<RwLock<BigramModel>>
}

impl SharedModel {
	pub fn new(model: BigramModel) -> Self {
		Self { inner: Arc::new(RwLock::new(model)) }
	}

	fn read(&self) -> Result<RwLockReadGuard<'_, BigramModel>> {
		self.inner.read().map_err(|_| BigramError::Poisoned)
	}

	fn write(&self) -> Result<RwLockWriteGuard<'_, BigramModel>> {
		self.inner.write().map_err(|_| BigramError::Poisoned)
	}

	fn try_read(&self) -> Result<RwLockReadGuard<'_, BigramModel>> {
		match self.inner.try_read() {
			Ok(guard) => Ok(guard),
			Err(TryLockError::WouldBlock) => Err(BigramError::Busy),
			Err(TryLockError::Poisoned(_)) => Err(BigramError::Poisoned),
		}
	}

	fn try_write(&self) -> Result<RwLockWriteGuard<'_, BigramModel>> {
		match self.inner.try_write() {
			Ok(guard) => Ok(guard),
			Err(TryLockError::WouldBlock) => Err(BigramError::Busy),
			Err(TryLockError::Poisoned(_)) => Err(BigramError::Poisoned),
		}
	}

	/// Trains on one token sequence, waiting for exclusive access.
	pub fn train<S: AsRef<str>>(&self, tokens: &[S]) -> Result<()> {
		self.write()?.train(tokens);
		Ok(())
	}

	/// Trains on one token sequence, or fails with `Busy` if the model is in use.
	pub fn try_train<S: AsRef<str>>(&self, tokens: &[S]) -> Result<()> {
		self.try_write()?.train(tokens);
		Ok(())
	}

	pub fn merge(&self, other: &BigramModel) -> Result<()> {
		self.write()?.merge(other)
	}

	/// Swaps the whole model, returning the previous one.
	pub fn replace(&self, model: BigramModel) -> Result<BigramModel> {
		Ok(std::mem::replace(&mut *self.write()?, model))
	}

	pub fn bigram_probability(&self, prev: &str, curr: &str) -> Result<f64> {
		Ok(self.read()?.bigram_probability(prev, curr))
	}

	pub fn generate<R: Rng + ?Sized>(&self, max_length: usize, rng: &mut R) -> Result<Vec<String>> {
		self.read()?.generate(max_length, rng)
	}

	/// Generates, or fails with `Busy` if a writer holds the model.
	pub fn try_generate<R: Rng + ?Sized>(&self, max_length: usize, rng: &mut R) -> Result<Vec<String>> {
		self.try_read()?.generate(max_length, rng)
	}

	pub fn stats(&self) -> Result<ModelStats> {
		Ok(self.read()?.stats())
	}

	/// Copy of the current model.
	pub fn snapshot(&self) -> Result<BigramModel> {
		Ok(self.read()?.clone())
	}
}
