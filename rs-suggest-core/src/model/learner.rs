use log::debug;

use super::language_model::LanguageModel;
use super::tokenizer::Tokenizer;

/// Folds finalized user input into a `LanguageModel`.
///
/// Unlike batch training, input is tokenized with the query window, so only
/// the trailing `context_window` tokens of each text are learned.
#[derive(Clone, Debug)]
pub struct OnlineLearner {
	tokenizer: Tokenizer,
}

impl OnlineLearner {
	pub fn new(tokenizer: Tokenizer) -> Self {
		Self { tokenizer }
	}

	/// Learns from `text` and returns the number of tokens folded in.
	///
	/// The update is applied immediately; no prediction cache is touched.
	pub fn learn(&self, model: &mut LanguageModel, text: &str) -> usize {
		let tokens = self.tokenizer.tokenize(text);
		model.observe(&tokens);
		debug!("Learned {} tokens, model now holds {}", tokens.len(), model.total_tokens());
		tokens.len()
	}
}
