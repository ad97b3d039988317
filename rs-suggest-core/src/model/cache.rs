use std::collections::HashMap;
use std::fmt;

use log::debug;

use super::prediction::Prediction;

/// Kind of request a cached result answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
	NextWord,
	Sequence,
}

/// Cache key built from the raw context text and the requested size.
///
/// The textual form is `"{context}-{size}"`. Single-word and sequence
/// requests live in separate namespaces so they never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
	kind: RequestKind,
	key: String,
}

impl CacheKey {
	pub fn next_word(context_text: &str, max_predictions: usize) -> Self {
		Self { kind: RequestKind::NextWord, key: format!("{context_text}-{max_predictions}") }
	}

	pub fn sequence(context_text: &str, sequence_length: usize) -> Self {
		Self { kind: RequestKind::Sequence, key: format!("{context_text}-{sequence_length}") }
	}

	pub fn as_str(&self) -> &str {
		&self.key
	}
}

impl fmt::Display for CacheKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.key)
	}
}

/// Cached prediction list with its last access tick.
#[derive(Clone, Debug)]
struct CacheEntry {
	predictions: Vec<Prediction>,
	last_access: u64,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
	pub entries: usize,
	pub hits: u64,
	pub misses: u64,
	pub capacity: Option<usize>,
}

/// Memoizes prediction results by `CacheKey`.
///
/// # Behavior
/// - Unbounded by default: entries live until `clear` is called.
/// - With a capacity, inserting into a full cache evicts the least recently
///   used entry.
/// - Nothing here reacts to model updates; callers clear explicitly.
#[derive(Debug, Default)]
pub struct PredictionCache {
	entries: HashMap<CacheKey, CacheEntry>,
	capacity: Option<usize>,
	tick: u64,
	hits: u64,
	misses: u64,
}

impl PredictionCache {
	/// Creates an unbounded cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a cache holding at most `capacity` entries (`None` for unbounded).
	pub fn with_capacity(capacity: Option<usize>) -> Self {
		Self { capacity, ..Self::default() }
	}

	/// Returns a copy of the cached predictions and refreshes the entry's recency.
	pub fn get(&mut self, key: &CacheKey) -> Option<Vec<Prediction>> {
		self.tick += 1;
		match self.entries.get_mut(key) {
			Some(entry) => {
				entry.last_access = self.tick;
				self.hits += 1;
				debug!("Prediction cache hit for '{}'", key);
				Some(entry.predictions.clone())
			}
			None => {
				self.misses += 1;
				debug!("Prediction cache miss for '{}'", key);
				None
			}
		}
	}

	/// Stores `predictions` under `key`, evicting the oldest entry if at capacity.
	pub fn insert(&mut self, key: CacheKey, predictions: Vec<Prediction>) {
		self.tick += 1;

		if let Some(capacity) = self.capacity {
			if !self.entries.contains_key(&key) && self.entries.len() >= capacity {
				if let Some(oldest_key) = self
					.entries
					.iter()
					.min_by_key(|(_, entry)| entry.last_access)
					.map(|(k, _)| k.clone())
				{
					debug!("Evicting prediction cache entry '{}'", oldest_key);
					self.entries.remove(&oldest_key);
				}
			}
		}

		self.entries.insert(key, CacheEntry { predictions, last_access: self.tick });
	}

	/// Removes every entry. Hit and miss counters are kept.
	pub fn clear(&mut self) {
		debug!("Clearing {} prediction cache entries", self.entries.len());
		self.entries.clear();
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn contains(&self, key: &CacheKey) -> bool {
		self.entries.contains_key(key)
	}

	pub fn stats(&self) -> CacheStats {
		CacheStats {
			entries: self.entries.len(),
			hits: self.hits,
			misses: self.misses,
			capacity: self.capacity,
		}
	}
}
