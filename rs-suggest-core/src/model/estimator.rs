use super::language_model::LanguageModel;

/// Conditional probability of a token given up to two preceding tokens.
///
/// Implementations must be total: unknown tokens, empty models and zero
/// denominators yield `0.0`, never a panic or `NaN`.
pub trait ProbabilityEstimator: Send + Sync {
	/// Returns `P(token | context)` where `context` holds 0 to 2 preceding
	/// tokens, oldest first. Longer contexts are reduced to their last two tokens.
	fn probability(&self, model: &LanguageModel, token: &str, context: &[String]) -> f64;
}

/// Unsmoothed "stupid backoff" chain: trigram, then bigram, then unigram.
///
/// A level is skipped only when its denominator is zero. Once a denominator
/// is available its ratio is returned as-is, even when the numerator is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackoffEstimator;

impl BackoffEstimator {
	fn unigram(model: &LanguageModel, token: &str) -> f64 {
		ratio(model.unigram_count(token), model.total_tokens()).unwrap_or(0.0)
	}
}

impl ProbabilityEstimator for BackoffEstimator {
	fn probability(&self, model: &LanguageModel, token: &str, context: &[String]) -> f64 {
		let Some(last) = context.last() else {
			return Self::unigram(model, token);
		};

		if let [.., first, second] = context {
			let trigram = model.trigram_count(first, second, token);
			if let Some(p) = ratio(trigram, model.bigram_count(first, second)) {
				return p;
			}
		}

		let bigram = model.bigram_count(last, token);
		if let Some(p) = ratio(bigram, model.unigram_count(last)) {
			return p;
		}

		Self::unigram(model, token)
	}
}

/// `numerator / denominator`, or `None` when the denominator is zero.
fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
	if denominator == 0 {
		None
	} else {
		Some(numerator as f64 / denominator as f64)
	}
}
