use std::sync::Arc;

use log::debug;

use super::cache::{CacheKey, CacheStats, PredictionCache};
use super::estimator::{BackoffEstimator, ProbabilityEstimator};
use super::language_model::LanguageModel;
use super::learner::OnlineLearner;
use super::next_word::NextWordPredictor;
use super::prediction::Prediction;
use super::sequence::SequencePredictor;
use super::tokenizer::Tokenizer;
use crate::config::PredictorConfig;
use crate::error::Result;

/// Default number of next-word suggestions.
pub const DEFAULT_MAX_PREDICTIONS: usize = 5;

/// Default number of tokens in a sequence completion.
pub const DEFAULT_SEQUENCE_LENGTH: usize = 3;

/// Synchronous prediction pipeline owned by one composer session.
///
/// # Responsibilities
/// - Own the language model, the estimator and the prediction cache
/// - Answer next-word and sequence requests through the cache
/// - Fold finalized input into the model
///
/// # Notes
/// - The model is held as an `Arc` snapshot. Learning goes through
///   `Arc::make_mut`, so a reader holding `model()` keeps a consistent, possibly
///   stale, copy while the session moves on.
/// - Learning never clears the cache; call `clear_cache` for fresh results.
pub struct PredictionSession {
	config: PredictorConfig,
	tokenizer: Tokenizer,
	learner: OnlineLearner,
	model: Arc<LanguageModel>,
	estimator: Arc<dyn ProbabilityEstimator>,
	cache: PredictionCache,
}

impl PredictionSession {
	/// Creates a session with an empty model.
	///
	/// # Errors
	/// Returns an error if the configuration is invalid.
	pub fn new(config: PredictorConfig) -> Result<Self> {
		Self::from_model(config, LanguageModel::new())
	}

	/// Creates a session whose model is batch-trained on `texts`.
	///
	/// # Errors
	/// Returns an error if the configuration is invalid.
	pub fn with_training<S: AsRef<str>>(config: PredictorConfig, texts: &[S]) -> Result<Self> {
		Self::from_model(config, LanguageModel::build(texts))
	}

	/// Creates a session around an existing model.
	///
	/// # Errors
	/// Returns an error if the configuration is invalid.
	pub fn from_model(config: PredictorConfig, model: LanguageModel) -> Result<Self> {
		config.validate()?;
		let tokenizer = Tokenizer::new(config.context_window);
		Ok(Self {
			learner: OnlineLearner::new(tokenizer.clone()),
			tokenizer,
			model: Arc::new(model),
			estimator: Arc::new(BackoffEstimator),
			cache: PredictionCache::with_capacity(config.cache_capacity),
			config,
		})
	}

	/// Replaces the probability estimator. Cached results are dropped.
	pub fn with_estimator(mut self, estimator: Arc<dyn ProbabilityEstimator>) -> Self {
		self.estimator = estimator;
		self.cache.clear();
		self
	}

	/// Returns at most `max_predictions` ranked next words for `context_text`.
	///
	/// Results are memoized by `(context_text, max_predictions)`.
	pub fn predict_next_words(&mut self, context_text: &str, max_predictions: usize) -> Vec<Prediction> {
		let key = CacheKey::next_word(context_text, max_predictions);
		if let Some(predictions) = self.cache.get(&key) {
			return predictions;
		}

		let predictions = NextWordPredictor::new(&self.model, self.estimator.as_ref(), &self.tokenizer)
			.predict(context_text, max_predictions);
		self.cache.insert(key, predictions.clone());
		predictions
	}

	/// Returns up to `beam_width` completions of exactly `sequence_length`
	/// tokens for `context_text`.
	///
	/// Results are memoized by `(context_text, sequence_length)`.
	pub fn predict_next_sequence(&mut self, context_text: &str, sequence_length: usize) -> Vec<Prediction> {
		let key = CacheKey::sequence(context_text, sequence_length);
		if let Some(predictions) = self.cache.get(&key) {
			return predictions;
		}

		let predictions = SequencePredictor::new(
			&self.model,
			self.estimator.as_ref(),
			&self.tokenizer,
			self.config.beam_width,
		)
		.predict(context_text, sequence_length);
		self.cache.insert(key, predictions.clone());
		predictions
	}

	/// Confidence of the single best next word, `0.0` if there is none.
	pub fn prediction_confidence(&mut self, context_text: &str) -> f64 {
		self.predict_next_words(context_text, 1)
			.first()
			.map_or(0.0, |prediction| prediction.confidence)
	}

	/// Folds finalized input into the model and returns the number of tokens learned.
	///
	/// Visible to the next uncached prediction immediately. The cache is left untouched.
	pub fn learn_from_input(&mut self, text: &str) -> usize {
		let model = Arc::make_mut(&mut self.model);
		self.learner.learn(model, text)
	}

	/// Drops every memoized result.
	pub fn clear_cache(&mut self) {
		self.cache.clear();
	}

	/// Returns a snapshot of the current model.
	pub fn model(&self) -> Arc<LanguageModel> {
		Arc::clone(&self.model)
	}

	/// Replaces the model (for example with a decoded snapshot) and clears the cache.
	pub fn replace_model(&mut self, model: LanguageModel) {
		debug!("Replacing session model ({} tokens)", model.total_tokens());
		self.model = Arc::new(model);
		self.cache.clear();
	}

	pub fn config(&self) -> &PredictorConfig {
		&self.config
	}

	pub fn cache_stats(&self) -> CacheStats {
		self.cache.stats()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};

	fn corpus() -> Vec<&'static str> {
		vec!["the cat sat on the mat.", "the cat ate food."]
	}

	fn session() -> PredictionSession {
		PredictionSession::with_training(PredictorConfig::default(), &corpus()).unwrap()
	}

	struct CountingEstimator {
		calls: AtomicUsize,
	}

	impl ProbabilityEstimator for CountingEstimator {
		fn probability(&self, model: &LanguageModel, token: &str, context: &[String]) -> f64 {
			self.calls.fetch_add(1, Ordering::SeqCst);
			BackoffEstimator.probability(model, token, context)
		}
	}

	#[test]
	fn test_invalid_config_is_rejected() {
		let config = PredictorConfig { context_window: 0, ..PredictorConfig::default() };
		assert!(PredictionSession::new(config).is_err());
	}

	#[test]
	fn test_predict_next_words() {
		let mut session = session();
		let texts: Vec<String> = session
			.predict_next_words("the cat", 2)
			.into_iter()
			.map(|p| p.text)
			.collect();
		assert_eq!(texts, vec!["sat", "ate"]);
	}

	#[test]
	fn test_repeat_query_hits_cache() {
		let estimator = Arc::new(CountingEstimator { calls: AtomicUsize::new(0) });
		let mut session = session().with_estimator(estimator.clone());

		let first = session.predict_next_words("the cat", 2);
		let calls = estimator.calls.load(Ordering::SeqCst);
		assert_eq!(calls, 7);

		let second = session.predict_next_words("the cat", 2);
		assert_eq!(first, second);
		assert_eq!(estimator.calls.load(Ordering::SeqCst), calls);

		let stats = session.cache_stats();
		assert_eq!(stats.hits, 1);
		assert_eq!(stats.misses, 1);
	}

	#[test]
	fn test_cache_key_includes_size() {
		let mut session = session();
		assert_eq!(session.predict_next_words("the cat", 1).len(), 1);
		assert_eq!(session.predict_next_words("the cat", 2).len(), 2);
	}

	#[test]
	fn test_learning_does_not_invalidate_cache() {
		let mut session = PredictionSession::new(PredictorConfig::default()).unwrap();
		assert!(session.predict_next_words("the cat", 1).is_empty());

		session.learn_from_input("the cat sat");
		assert!(session.predict_next_words("the cat", 1).is_empty());

		session.clear_cache();
		let predictions = session.predict_next_words("the cat", 1);
		assert_eq!(predictions[0].text, "sat");
		assert!(predictions[0].probability > 0.0);
	}

	#[test]
	fn test_snapshot_is_copy_on_write() {
		let mut session = session();
		let before = session.model();
		session.learn_from_input("the dog barked");

		assert_eq!(before.total_tokens(), 10);
		assert_eq!(before.unigram_count("dog"), 0);
		assert_eq!(session.model().total_tokens(), 13);
	}

	#[test]
	fn test_prediction_confidence() {
		let mut session = session();
		assert_eq!(session.prediction_confidence("the cat"), 1.0);

		let mut empty = PredictionSession::new(PredictorConfig::default()).unwrap();
		assert_eq!(empty.prediction_confidence("the cat"), 0.0);
		assert_eq!(empty.prediction_confidence(""), 0.0);
	}

	#[test]
	fn test_sequence_cached_separately() {
		let mut session = session();
		let words = session.predict_next_words("the cat", 3);
		let sequences = session.predict_next_sequence("the cat", 3);

		assert_eq!(words.len(), 2);
		assert_eq!(sequences.len(), 1);
		assert_eq!(sequences[0].text, "sat on the");
		assert_eq!(session.cache_stats().entries, 2);
	}

	#[test]
	fn test_default_request_sizes() {
		let mut session = PredictionSession::with_training(
			PredictorConfig::default(),
			&["a b c d e f g", "a h i j", "a k l m"],
		)
		.unwrap();

		let words = session.predict_next_words("", DEFAULT_MAX_PREDICTIONS);
		assert_eq!(words.len(), DEFAULT_MAX_PREDICTIONS);

		let sequences = session.predict_next_sequence("a", DEFAULT_SEQUENCE_LENGTH);
		assert_eq!(sequences.len(), 3);
		assert!(sequences.iter().all(|p| p.metadata.tokens.len() == DEFAULT_SEQUENCE_LENGTH));
	}

	#[test]
	fn test_replace_model_clears_cache() {
		let mut session = session();
		session.predict_next_words("the cat", 2);
		session.replace_model(LanguageModel::build(&["the cat slept"]));

		assert_eq!(session.cache_stats().entries, 0);
		assert_eq!(session.predict_next_words("the cat", 2)[0].text, "slept");
	}

	#[test]
	fn test_bounded_cache() {
		let config = PredictorConfig::default().with_cache_capacity(1).unwrap();
		let mut session = PredictionSession::with_training(config, &corpus()).unwrap();
		session.predict_next_words("the", 2);
		session.predict_next_words("the cat", 2);
		assert_eq!(session.cache_stats().entries, 1);
	}
}
