use std::collections::HashSet;

use super::estimator::ProbabilityEstimator;
use super::language_model::LanguageModel;
use super::prediction::Prediction;
use super::tokenizer::Tokenizer;

/// Number of trailing tokens used as the probability context.
pub const PREDICTION_ORDER: usize = 2;

/// Enumerates candidate continuations of `last`, in tie-break order.
///
/// The candidate set is the whole vocabulary (insertion order) followed by
/// any successor of `last` from the context index not already listed.
pub(crate) fn candidates<'m>(model: &'m LanguageModel, last: Option<&str>) -> Vec<&'m str> {
	let mut seen: HashSet<&str> = HashSet::with_capacity(model.vocabulary_size());
	let mut ordered: Vec<&str> = Vec::with_capacity(model.vocabulary_size());

	let successors = last.into_iter().flat_map(|token| model.successors(token));
	for token in model.vocabulary().chain(successors).map(|(token, _)| token) {
		if seen.insert(token) {
			ordered.push(token);
		}
	}
	ordered
}

/// Returns the last `PREDICTION_ORDER` tokens of `tokens`.
pub(crate) fn trailing_context(tokens: &[String]) -> &[String] {
	&tokens[tokens.len().saturating_sub(PREDICTION_ORDER)..]
}

/// Ranks single-token continuations of a context.
///
/// Candidates with a positive probability are sorted by descending
/// probability. The sort is stable, so ties keep candidate order.
pub struct NextWordPredictor<'a> {
	model: &'a LanguageModel,
	estimator: &'a dyn ProbabilityEstimator,
	tokenizer: &'a Tokenizer,
}

impl<'a> NextWordPredictor<'a> {
	pub fn new(model: &'a LanguageModel, estimator: &'a dyn ProbabilityEstimator, tokenizer: &'a Tokenizer) -> Self {
		Self { model, estimator, tokenizer }
	}

	/// Tokenizes `context_text` (windowed) and returns at most `max_predictions`
	/// ranked next words.
	pub fn predict(&self, context_text: &str, max_predictions: usize) -> Vec<Prediction> {
		let tokens = self.tokenizer.tokenize(context_text);
		self.rank(trailing_context(&tokens), max_predictions)
	}

	/// Ranks the continuations of an already tokenized context of 0 to 2 tokens.
	pub fn rank(&self, context: &[String], max_predictions: usize) -> Vec<Prediction> {
		if max_predictions == 0 {
			return Vec::new();
		}

		let last = context.last().map(String::as_str);
		let mut predictions: Vec<Prediction> = candidates(self.model, last)
			.into_iter()
			.filter_map(|token| {
				let probability = self.estimator.probability(self.model, token, context);
				(probability > 0.0).then(|| Prediction::word(token, probability, context))
			})
			.collect();

		predictions.sort_by(|a, b| b.probability.total_cmp(&a.probability));
		predictions.truncate(max_predictions);
		predictions
	}
}
