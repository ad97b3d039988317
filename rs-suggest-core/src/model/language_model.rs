use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::tokenizer::Tokenizer;
use crate::error::{Result, SuggestError};
use crate::io::read_lines;

/// Index of a token in the model's vocabulary arena.
pub type TokenId = usize;

/// Aggregate counts of a `LanguageModel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelStats {
	pub vocabulary_size: usize,
	pub bigram_count: usize,
	pub trigram_count: usize,
	pub total_tokens: u64,
}

/// Word-level n-gram frequency store.
///
/// Tokens are interned into an arena (`tokens` / `counts`) so that bigram and
/// trigram tables are keyed by small integer tuples instead of space-joined
/// strings. Tokens never contain whitespace, so a tuple `(a, b)` is exactly the
/// bigram key `"a b"`.
///
/// # Responsibilities
/// - Count unigrams, bigrams and trigrams of every folded token sequence
/// - Keep a context index (predecessor -> ordered successors) for candidate lookup
/// - Track the total number of tokens ever folded in
/// - Merge with another model (parallel construction support)
///
/// # Invariants
/// - Token ids follow first-seen order; this is the deterministic tie-break order
/// - `successors[p]` lists each successor once, in first-seen order, and its
///   count is the bigram count `(p, s)`
/// - Counts never decrease
/// - `total_tokens` is the number of tokens ever folded in, windowed or not
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LanguageModel {
	/// Token text by id, in insertion order.
	tokens: Vec<String>,

	/// Unigram count by id.
	counts: Vec<u64>,

	/// Reverse lookup from token text to id.
	index: HashMap<String, TokenId>,

	bigrams: HashMap<(TokenId, TokenId), u64>,

	trigrams: HashMap<(TokenId, TokenId, TokenId), u64>,

	/// Context index: predecessor id -> successor ids in first-seen order.
	successors: HashMap<TokenId, Vec<TokenId>>,

	total_tokens: u64,
}

impl LanguageModel {
	/// Returns an empty model.
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a model from a batch of training texts.
	///
	/// Every text is tokenized in full (no window truncation).
	/// Calling this twice on the same corpus and merging the results
	/// double-counts, it follows "train" semantics.
	pub fn build<S: AsRef<str>>(texts: &[S]) -> Self {
		let mut model = Self::new();
		model.train(texts);
		info!(
			"Built language model from {} texts: {} tokens, {} distinct",
			texts.len(),
			model.total_tokens,
			model.tokens.len()
		);
		model
	}

	/// Folds a batch of training texts into this model, without window truncation.
	pub fn train<S: AsRef<str>>(&mut self, texts: &[S]) {
		for text in texts {
			let tokens = Tokenizer::tokenize_all(text.as_ref());
			self.observe(&tokens);
		}
	}

	/// Builds a model by splitting the corpus into chunks, building partial
	/// models on worker threads and merging them in chunk order.
	///
	/// The result is identical to `build`, insertion order included.
	///
	/// # Notes
	/// - Uses MPSC channels to collect partial models from threads.
	/// - Partial models are tagged with their chunk index and merged in order.
	/// - A chunk whose worker never reports (it panicked) is rebuilt on the
	///   calling thread, so no text is silently lost.
	pub fn build_parallel(texts: &[String]) -> Self {
		if texts.is_empty() {
			return Self::new();
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = texts.len().div_ceil(chunks);
		let chunks: Vec<&[String]> = texts.chunks(chunk_size).collect();

		let (tx, rx) = mpsc::channel();
		for (chunk_index, chunk) in chunks.iter().enumerate() {
			let tx = tx.clone();
			let chunk: Vec<String> = chunk.to_vec();

			thread::spawn(move || {
				let mut partial_model = LanguageModel::new();
				partial_model.train(&chunk);
				// The receiver outlives every sender
				let _ = tx.send((chunk_index, partial_model));
			});
		}
		drop(tx);

		let final_model = Self::assemble(&chunks, rx.iter().collect());
		info!(
			"Built language model from {} texts in {} chunks: {} tokens, {} distinct",
			texts.len(),
			chunks.len(),
			final_model.total_tokens,
			final_model.tokens.len()
		);
		final_model
	}

	/// Merges the partial models received for `chunks` in chunk order.
	///
	/// Chunks with no partial model are trained here instead.
	fn assemble(chunks: &[&[String]], received: Vec<(usize, LanguageModel)>) -> Self {
		let mut partial_models: Vec<Option<LanguageModel>> = vec![None; chunks.len()];
		for (chunk_index, partial_model) in received {
			if let Some(slot) = partial_models.get_mut(chunk_index) {
				*slot = Some(partial_model);
			}
		}

		let mut final_model = LanguageModel::new();
		for (chunk_index, partial_model) in partial_models.into_iter().enumerate() {
			match partial_model {
				Some(partial_model) => final_model.merge(&partial_model),
				None => {
					warn!("No partial model for chunk {}, training it inline", chunk_index);
					final_model.train(chunks[chunk_index]);
				}
			}
		}
		final_model
	}

	/// Reads a corpus file (one training text per non-blank line) and builds a model.
	///
	/// # Errors
	/// Returns an error if the file cannot be read.
	pub fn from_corpus_file<P: AsRef<Path>>(filepath: P) -> Result<Self> {
		let lines = read_lines(&filepath)?;
		Ok(Self::build_parallel(&lines))
	}

	/// Applies the n-gram increment pass to an already tokenized sequence.
	///
	/// For each token at position `i`:
	/// - the unigram count is incremented
	/// - if `i > 0`, the bigram `(t[i-1], t[i])` and the context index are updated
	/// - if `i > 1`, the trigram `(t[i-2], t[i-1], t[i])` is incremented
	pub fn observe(&mut self, tokens: &[String]) {
		let mut prev2: Option<TokenId> = None;
		let mut prev: Option<TokenId> = None;

		for token in tokens {
			let id = self.intern(token);
			self.counts[id] += 1;

			if let Some(p) = prev {
				self.add_bigram(p, id, 1);
				if let Some(pp) = prev2 {
					*self.trigrams.entry((pp, p, id)).or_insert(0) += 1;
				}
			}

			prev2 = prev;
			prev = Some(id);
		}

		self.total_tokens += tokens.len() as u64;
	}

	/// Merges another model into this one.
	///
	/// # Notes
	/// - Occurrence counts for matching n-grams are summed.
	/// - Unseen tokens are appended in the other model's insertion order.
	/// - Successor lists keep first-seen order across both models.
	pub fn merge(&mut self, other: &Self) {
		let remap: Vec<TokenId> = other
			.tokens
			.iter()
			.zip(&other.counts)
			.map(|(token, count)| {
				let id = self.intern(token);
				self.counts[id] += count;
				id
			})
			.collect();

		// Walk successor lists so bigrams are added in their first-seen order
		for (other_prev, other_successors) in &other.successors {
			for other_next in other_successors {
				let count = other.bigrams.get(&(*other_prev, *other_next)).copied().unwrap_or(0);
				if count > 0 {
					self.add_bigram(remap[*other_prev], remap[*other_next], count);
				}
			}
		}

		for ((a, b, c), count) in &other.trigrams {
			*self.trigrams.entry((remap[*a], remap[*b], remap[*c])).or_insert(0) += count;
		}

		self.total_tokens += other.total_tokens;
		debug!("Merged model with {} tokens into {} distinct", other.total_tokens, self.tokens.len());
	}

	/// Encodes the model into a compact binary snapshot.
	///
	/// # Errors
	/// Returns an error if serialization fails.
	pub fn to_bytes(&self) -> Result<Vec<u8>> {
		Ok(postcard::to_stdvec(self)?)
	}

	/// Decodes a model from a binary snapshot produced by `to_bytes`.
	///
	/// # Errors
	/// Returns an error if the bytes are not a valid snapshot.
	pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
		let model: Self = postcard::from_bytes(bytes)?;
		model.check_consistency()?;
		info!("Loaded language model snapshot: {} tokens, {} distinct", model.total_tokens, model.tokens.len());
		Ok(model)
	}

	/// Number of tokens ever folded into the model.
	pub fn total_tokens(&self) -> u64 {
		self.total_tokens
	}

	/// Number of distinct tokens.
	pub fn vocabulary_size(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	/// Iterates the vocabulary `(token, count)` in insertion order.
	pub fn vocabulary(&self) -> impl Iterator<Item = (&str, u64)> {
		self.tokens.iter().map(String::as_str).zip(self.counts.iter().copied())
	}

	/// Iterates the successors of `token` `(successor, count)` in first-seen order.
	///
	/// Empty if `token` is unknown or was never followed by anything.
	pub fn successors(&self, token: &str) -> impl Iterator<Item = (&str, u64)> {
		let prev = self.index.get(token).copied();
		prev.and_then(|p| self.successors.get(&p))
			.into_iter()
			.flatten()
			.map(move |next| {
				let count = prev
					.and_then(|p| self.bigrams.get(&(p, *next)))
					.copied()
					.unwrap_or(0);
				(self.tokens[*next].as_str(), count)
			})
	}

	/// Returns the id of `token`, if known.
	pub fn token_id(&self, token: &str) -> Option<TokenId> {
		self.index.get(token).copied()
	}

	/// Unigram count of `token` (0 if unseen).
	pub fn unigram_count(&self, token: &str) -> u64 {
		self.token_id(token).map_or(0, |id| self.counts[id])
	}

	/// Count of the bigram `"first second"` (0 if unseen).
	pub fn bigram_count(&self, first: &str, second: &str) -> u64 {
		match (self.token_id(first), self.token_id(second)) {
			(Some(a), Some(b)) => self.bigrams.get(&(a, b)).copied().unwrap_or(0),
			_ => 0,
		}
	}

	/// Count of the trigram `"first second third"` (0 if unseen).
	pub fn trigram_count(&self, first: &str, second: &str, third: &str) -> u64 {
		match (self.token_id(first), self.token_id(second), self.token_id(third)) {
			(Some(a), Some(b), Some(c)) => self.trigrams.get(&(a, b, c)).copied().unwrap_or(0),
			_ => 0,
		}
	}

	pub fn stats(&self) -> ModelStats {
		ModelStats {
			vocabulary_size: self.tokens.len(),
			bigram_count: self.bigrams.len(),
			trigram_count: self.trigrams.len(),
			total_tokens: self.total_tokens,
		}
	}

	/// Verifies that every id referenced by the n-gram tables exists in the arena.
	fn check_consistency(&self) -> Result<()> {
		let size = self.tokens.len();
		let corrupt = |what: &str| Err(SuggestError::CorruptSnapshot(format!("{what} references an unknown token id")));

		if self.counts.len() != size || self.index.len() != size {
			return Err(SuggestError::CorruptSnapshot("vocabulary tables differ in length".to_owned()));
		}
		if self.index.values().any(|id| *id >= size) {
			return corrupt("index");
		}
		if self.bigrams.keys().any(|(a, b)| *a >= size || *b >= size) {
			return corrupt("bigram table");
		}
		if self.trigrams.keys().any(|(a, b, c)| *a >= size || *b >= size || *c >= size) {
			return corrupt("trigram table");
		}
		if self.successors.iter().any(|(p, next)| *p >= size || next.iter().any(|n| *n >= size)) {
			return corrupt("context index");
		}
		Ok(())
	}

	/// Returns the id of `token`, appending it to the arena if unseen.
	fn intern(&mut self, token: &str) -> TokenId {
		if let Some(&id) = self.index.get(token) {
			return id;
		}
		let id = self.tokens.len();
		self.tokens.push(token.to_owned());
		self.counts.push(0);
		self.index.insert(token.to_owned(), id);
		id
	}

	/// Adds `count` to the bigram `(prev, next)`, registering `next` as a
	/// successor of `prev` the first time the pair is seen.
	fn add_bigram(&mut self, prev: TokenId, next: TokenId, count: u64) {
		let entry = self.bigrams.entry((prev, next)).or_insert(0);
		if *entry == 0 {
			self.successors.entry(prev).or_default().push(next);
		}
		*entry += count;
	}
}
