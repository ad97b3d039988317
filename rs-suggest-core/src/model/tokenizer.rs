use std::sync::LazyLock;

use regex::Regex;

/// Matches every character that is neither a word character nor whitespace.
static NON_WORD: LazyLock<Regex> = LazyLock::new(|| {
	// Impossible to panic, the pattern is a valid literal
	Regex::new(r"[^\w\s]").expect("valid non-word pattern")
});

/// Splits raw text into normalized word tokens.
///
/// Normalization lower-cases the text, replaces every punctuation or symbol
/// character with a space, then splits on runs of whitespace.
///
/// Two entry points exist on purpose:
/// - `tokenize` keeps only the trailing `context_window` tokens and is used
///   for queries and online learning
/// - `tokenize_all` keeps the full sequence and is used for batch training
#[derive(Clone, Debug)]
pub struct Tokenizer {
	context_window: usize,
}

impl Tokenizer {
	/// Creates a tokenizer retaining at most `context_window` trailing tokens.
	///
	/// A window of zero is raised to one.
	pub fn new(context_window: usize) -> Self {
		Self { context_window: context_window.max(1) }
	}

	/// Returns the configured window size.
	pub fn context_window(&self) -> usize {
		self.context_window
	}

	/// Tokenizes `text` and keeps only the last `context_window` tokens.
	pub fn tokenize(&self, text: &str) -> Vec<String> {
		let mut tokens = Self::tokenize_all(text);
		if tokens.len() > self.context_window {
			tokens.drain(..tokens.len() - self.context_window);
		}
		tokens
	}

	/// Tokenizes `text` without any window truncation.
	pub fn tokenize_all(text: &str) -> Vec<String> {
		let lowered = text.to_lowercase();
		NON_WORD
			.replace_all(&lowered, " ")
			.split_whitespace()
			.map(str::to_owned)
			.collect()
	}
}
