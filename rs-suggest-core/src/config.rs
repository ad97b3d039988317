use serde::{Deserialize, Serialize};

use crate::error::{Result, SuggestError};

/// Default number of trailing tokens kept when forming a query context.
pub const DEFAULT_CONTEXT_WINDOW: usize = 10;

/// Default quiet period before a debounced request fires.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Default number of partial sequences retained per beam-search step.
pub const DEFAULT_BEAM_WIDTH: usize = 5;

/// Configuration of a prediction session.
///
/// # Responsibilities
/// - Bound the query-time token window (`context_window`)
/// - Control the debounce delay of the asynchronous service (`debounce_ms`)
/// - Control the beam width of sequence completion (`beam_width`)
/// - Optionally bound the prediction cache (`cache_capacity`)
///
/// # Invariants
/// Enforced by `validate`, which every constructor taking a config calls:
/// - `context_window >= 1`
/// - `beam_width >= 1`
/// - `cache_capacity` is `None` (unbounded) or `Some(n)` with `n >= 1`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PredictorConfig {
	/// Maximum number of trailing tokens retained at query and learning time.
	pub context_window: usize,

	/// Debounce delay in milliseconds.
	pub debounce_ms: u64,

	/// Number of beams kept after each expansion step.
	pub beam_width: usize,

	/// Maximum number of memoized results, `None` for no eviction.
	pub cache_capacity: Option<usize>,
}

impl Default for PredictorConfig {
	fn default() -> Self {
		Self {
			context_window: DEFAULT_CONTEXT_WINDOW,
			debounce_ms: DEFAULT_DEBOUNCE_MS,
			beam_width: DEFAULT_BEAM_WIDTH,
			cache_capacity: None,
		}
	}
}

impl PredictorConfig {
	/// Parses a configuration from JSON. Missing fields take their defaults.
	///
	/// # Errors
	/// Returns an error if the JSON is malformed or the values are invalid.
	pub fn from_json(json: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks the configuration invariants.
	pub fn validate(&self) -> Result<()> {
		if self.context_window == 0 {
			return Err(SuggestError::InvalidConfig("context_window must be >= 1".to_owned()));
		}
		if self.beam_width == 0 {
			return Err(SuggestError::InvalidConfig("beam_width must be >= 1".to_owned()));
		}
		if self.cache_capacity == Some(0) {
			return Err(SuggestError::InvalidConfig("cache_capacity must be >= 1 when set".to_owned()));
		}
		Ok(())
	}

	/// Sets the context window.
	///
	/// # Errors
	/// Returns an error if `context_window` is zero.
	pub fn with_context_window(mut self, context_window: usize) -> Result<Self> {
		self.context_window = context_window;
		self.validate()?;
		Ok(self)
	}

	/// Sets the debounce delay. Zero is accepted and fires on the next timer tick.
	pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
		self.debounce_ms = debounce_ms;
		self
	}

	/// Sets the beam width.
	///
	/// # Errors
	/// Returns an error if `beam_width` is zero.
	pub fn with_beam_width(mut self, beam_width: usize) -> Result<Self> {
		self.beam_width = beam_width;
		self.validate()?;
		Ok(self)
	}

	/// Bounds the prediction cache to `capacity` entries with LRU eviction.
	///
	/// # Errors
	/// Returns an error if `capacity` is zero.
	pub fn with_cache_capacity(mut self, capacity: usize) -> Result<Self> {
		self.cache_capacity = Some(capacity);
		self.validate()?;
		Ok(self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = PredictorConfig::default();
		assert_eq!(config.context_window, 10);
		assert_eq!(config.debounce_ms, 300);
		assert_eq!(config.beam_width, 5);
		assert_eq!(config.cache_capacity, None);
		assert!(config.validate().is_ok());
	}

	#[test]
	fn test_from_json_partial() {
		let config = PredictorConfig::from_json(r#"{"context_window": 4}"#).unwrap();
		assert_eq!(config.context_window, 4);
		assert_eq!(config.debounce_ms, DEFAULT_DEBOUNCE_MS);
	}

	#[test]
	fn test_from_json_rejects_zero_window() {
		let err = PredictorConfig::from_json(r#"{"context_window": 0}"#).unwrap_err();
		assert!(matches!(err, SuggestError::InvalidConfig(_)));
	}

	#[test]
	fn test_from_json_malformed() {
		let err = PredictorConfig::from_json("{not json").unwrap_err();
		assert!(matches!(err, SuggestError::Json(_)));
	}

	#[test]
	fn test_setters_validate() {
		assert!(PredictorConfig::default().with_context_window(0).is_err());
		assert!(PredictorConfig::default().with_beam_width(0).is_err());
		assert!(PredictorConfig::default().with_cache_capacity(0).is_err());

		let config = PredictorConfig::default()
			.with_debounce_ms(0)
			.with_cache_capacity(16)
			.unwrap();
		assert_eq!(config.debounce_ms, 0);
		assert_eq!(config.cache_capacity, Some(16));
	}
}
