use serde::{Deserialize, Serialize};

/// Linear factor mapping a raw probability to a display confidence.
pub const CONFIDENCE_SCALE: f64 = 10.0;

/// Diagnostic values attached to a prediction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredictionMetadata {
	/// Tokens making up the suggestion (one for a next word, several for a sequence).
	pub tokens: Vec<String>,

	/// Natural log of the suggestion probability.
	pub log_probability: f64,

	/// Sum of `-p * ln(p)` over the per-token probabilities.
	pub entropy: f64,
}

/// A ranked suggestion returned to the composer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Prediction {
	/// Suggested text (tokens joined by a single space).
	pub text: String,

	/// Display confidence in `[0, 1]`, see `confidence_from_probability`.
	pub confidence: f64,

	/// Raw probability in `(0, 1]`.
	pub probability: f64,

	/// Up to two tokens preceding the suggestion, oldest first.
	pub context: Vec<String>,

	pub metadata: PredictionMetadata,
}

impl Prediction {
	/// Creates a single-word prediction from its probability.
	pub(crate) fn word(token: &str, probability: f64, context: &[String]) -> Self {
		Self {
			text: token.to_owned(),
			confidence: confidence_from_probability(probability),
			probability,
			context: context.to_vec(),
			metadata: PredictionMetadata {
				tokens: vec![token.to_owned()],
				log_probability: probability.ln(),
				entropy: entropy_term(probability),
			},
		}
	}
}

/// Fixed linear rescaling `min(p * 10, 1)`. Not a calibrated statistic.
pub fn confidence_from_probability(probability: f64) -> f64 {
	(probability * CONFIDENCE_SCALE).min(1.0)
}

/// `-p * ln(p)`, defined as `0` for `p <= 0`.
pub(crate) fn entropy_term(probability: f64) -> f64 {
	if probability > 0.0 {
		-probability * probability.ln()
	} else {
		0.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_confidence_scaling() {
		assert!((confidence_from_probability(0.05) - 0.5).abs() < 1e-12);
		assert_eq!(confidence_from_probability(0.5), 1.0);
		assert_eq!(confidence_from_probability(0.0), 0.0);
	}

	#[test]
	fn test_word_prediction_metadata() {
		let context = vec!["the".to_owned(), "cat".to_owned()];
		let prediction = Prediction::word("sat", 0.5, &context);

		assert_eq!(prediction.text, "sat");
		assert_eq!(prediction.confidence, 1.0);
		assert_eq!(prediction.context, context);
		assert_eq!(prediction.metadata.tokens, vec!["sat".to_owned()]);
		assert!((prediction.metadata.log_probability - 0.5f64.ln()).abs() < 1e-12);
		assert!((prediction.metadata.entropy - (-0.5 * 0.5f64.ln())).abs() < 1e-12);
	}

	#[test]
	fn test_certain_prediction_has_zero_entropy() {
		let prediction = Prediction::word("x", 1.0, &[]);
		assert_eq!(prediction.metadata.log_probability, 0.0);
		assert_eq!(prediction.metadata.entropy, 0.0);
	}
}
