use std::fmt;

/// Errors produced by the bigram model and its wrappers.
///
/// Querying an unseen context or generating from an untrained model is not an
/// error: those return `0.0` and an empty sequence respectively.
///
/// # Variants
/// - `InvalidArgument`: a caller supplied a value outside its domain (ex. `max_length = 0`).
/// - `Busy`: a non-blocking operation on a [`SharedModel`](crate::shared::SharedModel)
///   found the lock already held.
/// - `Poisoned`: a writer panicked while holding the lock.
/// - `WorkerPanicked`: a parallel training worker panicked; its lines were not counted.
/// - `Io`: reading or writing a corpus or model file failed.
/// - `Serialization`: the binary model could not be encoded or decoded.
#[derive(Debug)]
pub enum BigramError {
	InvalidArgument(String),
	Busy,
	Poisoned,
	WorkerPanicked,
	Io(std::io::Error),
	Serialization(postcard::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, BigramError>;

impl fmt::Display for BigramError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BigramError::InvalidArgument(m) => write!(f, "invalid argument: {m}"),
			BigramError::Busy => write!(f, "model is busy"),
			BigramError::Poisoned => write!(f, "model lock poisoned"),
			BigramError::WorkerPanicked => write!(f, "training worker panicked"),
			BigramError::Io(e) => write!(f, "io: {e}"),
			BigramError::Serialization(e) => write!(f, "serialization: {e}"),
		}
	}
}

impl std::error::Error for BigramError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			BigramError::Io(e) => Some(e),
			BigramError::Serialization(e) => Some(e),
			_ => None,
		}
	}
}

impl From<std::io::Error> for BigramError {
	fn from(e: std::io::Error) -> Self {
		BigramError::Io(e)
	}
}

impl From<postcard::Error> for BigramError {
	fn from(e: postcard::Error) -> Self {
		BigramError::Serialization(e)
	}
}
