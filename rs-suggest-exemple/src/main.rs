use rs_suggest_core::model::language_model::LanguageModel;
use rs_suggest_core::model::session::{DEFAULT_MAX_PREDICTIONS, DEFAULT_SEQUENCE_LENGTH};
use rs_suggest_core::{DebouncedPredictionService, PredictionSession, PredictorConfig};

const SAMPLE_CONVERSATION: [&str; 6] = [
    "Hey, are we still on for lunch tomorrow?",
    "Yes! Let's meet at the cafe near the office.",
    "Sounds good, see you at the cafe at noon.",
    "Can you send me the report before the meeting?",
    "Sure, I will send you the report tonight.",
    "Thanks, see you at the meeting tomorrow.",
];

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Optional corpus file: one message per line.
    // Without it, a small built-in conversation is used
    let model = match std::env::args().nth(1) {
        Some(path) => LanguageModel::from_corpus_file(path)?,
        None => LanguageModel::build(&SAMPLE_CONVERSATION),
    };
    let stats = model.stats();
    println!(
        "Model: {} tokens, {} distinct, {} bigrams, {} trigrams",
        stats.total_tokens, stats.vocabulary_size, stats.bigram_count, stats.trigram_count
    );

    // Context window of 8 tokens, 150ms debounce, cache bounded to 256 entries
    let config = PredictorConfig::default()
        .with_context_window(8)?
        .with_debounce_ms(150)
        .with_cache_capacity(256)?;
    let mut session = PredictionSession::from_model(config, model)?;

    // Single next words with their confidence
    for context in ["see you at", "send you the", "the"] {
        println!("Next words after '{}':", context);
        for prediction in session.predict_next_words(context, DEFAULT_MAX_PREDICTIONS) {
            println!(
                "  {:<10} p={:.3} confidence={:.2} entropy={:.3}",
                prediction.text, prediction.probability, prediction.confidence, prediction.metadata.entropy
            );
        }
    }

    // Multi-word completion by beam search
    println!("Completions of 'see you':");
    for prediction in session.predict_next_sequence("see you", DEFAULT_SEQUENCE_LENGTH) {
        println!("  {:<24} p={:.3} ln(p)={:.3}", prediction.text, prediction.probability, prediction.metadata.log_probability);
    }

    // Learning is immediate, but cached answers stay until the cache is cleared
    session.learn_from_input("see you at the station");
    session.learn_from_input("see you at the station");
    session.clear_cache();
    println!(
        "Confidence after 'see you at the' once the user prefers the station: {:.2}",
        session.prediction_confidence("see you at the")
    );

    // Debounced requests: typing fast only computes for the last draft
    let service = DebouncedPredictionService::from_session(session);
    let (first, second, last) = tokio::join!(
        service.predict_next_words("see", DEFAULT_MAX_PREDICTIONS),
        service.predict_next_words("see you", DEFAULT_MAX_PREDICTIONS),
        service.predict_next_words("see you at", DEFAULT_MAX_PREDICTIONS)
    );
    println!("Debounced drafts all resolved with the latest context:");
    for (draft, predictions) in [("see", first), ("see you", second), ("see you at", last)] {
        let words: Vec<String> = predictions.into_iter().map(|p| p.text).collect();
        println!("  {:<12} -> {}", draft, words.join(", "));
    }

    Ok(())
}
