use rs_suggest_core::model::estimator::{BackoffEstimator, ProbabilityEstimator};
use rs_suggest_core::model::language_model::LanguageModel;
use rs_suggest_core::{DebouncedPredictionService, PredictionSession, PredictorConfig};

const CORPUS: [&str; 2] = ["the cat sat on the mat.", "the cat ate food."];

fn texts(predictions: &[rs_suggest_core::Prediction]) -> Vec<String> {
	predictions.iter().map(|p| p.text.clone()).collect()
}

#[test]
fn test_end_to_end_tie_break() {
	let mut session = PredictionSession::with_training(PredictorConfig::default(), &CORPUS).unwrap();
	let predictions = session.predict_next_words("the cat", 2);

	assert_eq!(texts(&predictions), vec!["sat", "ate"]);
	assert_eq!(predictions[0].probability, predictions[1].probability);
}

#[test]
fn test_backoff_on_minimal_corpus() {
	let model = LanguageModel::build(&["a b c"]);
	let context = vec!["a".to_owned(), "b".to_owned()];

	assert_eq!(BackoffEstimator.probability(&model, "c", &context), 1.0);
	assert_eq!(BackoffEstimator.probability(&model, "x", &context), 0.0);
}

#[test]
fn test_total_tokens_counts_every_fold() {
	let config = PredictorConfig::default().with_context_window(3).unwrap();
	let mut session = PredictionSession::with_training(config, &CORPUS).unwrap();
	assert_eq!(session.model().total_tokens(), 10);

	// Five tokens, three kept by the window
	assert_eq!(session.learn_from_input("one two three four five"), 3);
	assert_eq!(session.learn_from_input(""), 0);
	assert_eq!(session.learn_from_input("the cat"), 2);
	assert_eq!(session.model().total_tokens(), 15);
}

#[test]
fn test_batch_training_is_unwindowed_but_learning_is_windowed() {
	let config = PredictorConfig::default().with_context_window(2).unwrap();

	let trained = PredictionSession::with_training(config.clone(), &["x y z"]).unwrap();
	let trained_model = trained.model();
	assert_eq!(trained_model.total_tokens(), 3);
	assert_eq!(trained_model.trigram_count("x", "y", "z"), 1);

	let mut learned = PredictionSession::new(config).unwrap();
	learned.learn_from_input("x y z");
	let learned_model = learned.model();
	assert_eq!(learned_model.total_tokens(), 2);
	assert_eq!(learned_model.unigram_count("x"), 0);
	assert_eq!(learned_model.trigram_count("x", "y", "z"), 0);
	assert_eq!(learned_model.bigram_count("y", "z"), 1);
}

#[test]
fn test_learning_visibility() {
	let mut session = PredictionSession::new(PredictorConfig::default()).unwrap();
	session.learn_from_input("the cat sat");
	session.clear_cache();

	let predictions = session.predict_next_words("the cat", 1);
	assert_eq!(texts(&predictions), vec!["sat"]);
	assert!(predictions[0].probability > 0.0);
}

#[test]
fn test_determinism_across_sessions() {
	let corpus: Vec<String> = (0..50)
		.map(|i| format!("meet me at {} o clock near gate {}", i % 4, i % 3))
		.collect();

	let mut first = PredictionSession::with_training(PredictorConfig::default(), &corpus).unwrap();
	let mut second = PredictionSession::with_training(PredictorConfig::default(), &corpus).unwrap();

	for context in ["meet me", "at", "near gate", "", "unknown words here"] {
		assert_eq!(first.predict_next_words(context, 5), second.predict_next_words(context, 5));
		assert_eq!(first.predict_next_sequence(context, 3), second.predict_next_sequence(context, 3));
	}
}

#[test]
fn test_beam_bound() {
	let corpus: Vec<String> = (0..30).map(|i| format!("ok sure thing {i} later")).collect();
	let mut session = PredictionSession::with_training(PredictorConfig::default(), &corpus).unwrap();

	for length in 0..6 {
		let predictions = session.predict_next_sequence("ok", length);
		assert!(predictions.len() <= 5);
		assert!(predictions.iter().all(|p| p.metadata.tokens.len() <= length));
		assert!(predictions.iter().all(|p| p.probability > 0.0 && p.probability <= 1.0));
		assert!(predictions.iter().all(|p| (0.0..=1.0).contains(&p.confidence)));
	}
}

#[test]
fn test_degenerate_inputs_never_fail() {
	let mut session = PredictionSession::new(PredictorConfig::default()).unwrap();
	assert!(session.predict_next_words("", 5).is_empty());
	assert!(session.predict_next_words("!!!", 0).is_empty());
	assert!(session.predict_next_sequence("", 3).is_empty());
	assert_eq!(session.prediction_confidence("???"), 0.0);
	session.clear_cache();
}

#[test]
fn test_snapshot_roundtrip_through_session() {
	let session = PredictionSession::with_training(PredictorConfig::default(), &CORPUS).unwrap();
	let bytes = session.model().to_bytes().unwrap();

	let mut restored = PredictionSession::new(PredictorConfig::default()).unwrap();
	restored.replace_model(LanguageModel::from_bytes(&bytes).unwrap());
	assert_eq!(texts(&restored.predict_next_words("the cat", 2)), vec!["sat", "ate"]);
}

#[tokio::test(start_paused = true)]
async fn test_debounced_service_end_to_end() {
	let session = PredictionSession::with_training(PredictorConfig::default(), &CORPUS).unwrap();
	let service = DebouncedPredictionService::from_session(session);

	let predictions = service.predict_next_words("The cat", 2).await;
	assert_eq!(texts(&predictions), vec!["sat", "ate"]);

	service.learn_from_input("the cat ate again");
	service.clear_cache();
	let predictions = service.predict_next_words("The cat", 2).await;
	assert_eq!(texts(&predictions), vec!["ate", "sat"]);
}
