use std::path::PathBuf;
use std::str::FromStr;

/// Server settings, read from `RS_BIGRAM_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
	pub host: String,
	pub port: u16,
	/// Directory holding the `.txt` corpora (and their `.bin` caches).
	pub data_dir: PathBuf,
	/// `max_length` used by `/v1/generate` when the query omits it.
	pub default_max_length: usize,
	/// Largest `max_length` a client may request.
	pub max_length_limit: usize,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_owned(),
			port: 5000,
			data_dir: PathBuf::from("./data"),
			default_max_length: 20,
			max_length_limit: 1000,
		}
	}
}

impl ServerConfig {
	pub fn from_env() -> Result<Self, String> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Builds the configuration from any key lookup, falling back to defaults.
	///
	/// # Errors
	/// Returns an error naming the variable if a value cannot be parsed, if
	/// the default `max_length` is 0, or if it exceeds the limit.
	pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, String> {
		let defaults = Self::default();

		let config = Self {
			host: lookup("RS_BIGRAM_HOST").unwrap_or(defaults.host),
			port: parse_or(&lookup, "RS_BIGRAM_PORT", defaults.port)?,
			data_dir: lookup("RS_BIGRAM_DATA").map(PathBuf::from).unwrap_or(defaults.data_dir),
			default_max_length: parse_or(&lookup, "RS_BIGRAM_MAX_LENGTH", defaults.default_max_length)?,
			max_length_limit: parse_or(&lookup, "RS_BIGRAM_MAX_LENGTH_LIMIT", defaults.max_length_limit)?,
		};

		if config.default_max_length == 0 {
			return Err("RS_BIGRAM_MAX_LENGTH must be greater than 0".to_owned());
		}
		if config.default_max_length > config.max_length_limit {
			return Err(format!(
				"RS_BIGRAM_MAX_LENGTH ({}) exceeds RS_BIGRAM_MAX_LENGTH_LIMIT ({})",
				config.default_max_length, config.max_length_limit
			));
		}
		Ok(config)
	}
}

fn parse_or<T: FromStr, F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: T) -> Result<T, String> {
	match lookup(key) {
		Some(value) => value
			.trim()
			.parse()
			.map_err(|_| format!("{key}={value:?} is not a valid value")),
		None => Ok(default),
	}
}
