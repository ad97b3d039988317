//! Top-level module for the word prediction pipeline.
//!
//! This module provides:
//! - Text normalization (`Tokenizer`)
//! - The n-gram frequency store (`LanguageModel`)
//! - Backoff probability estimation (`ProbabilityEstimator`)
//! - Single-word and beam-search predictors
//! - Memoization (`PredictionCache`) and online learning (`OnlineLearner`)
//! - A synchronous session façade (`PredictionSession`)

/// Lower-casing, punctuation stripping and window truncation.
pub mod tokenizer;

/// Unigram / bigram / trigram counts with a context index.
///
/// Supports batch and parallel construction, merging and binary snapshots.
pub mod language_model;

/// Conditional probability of a token given up to two preceding tokens.
pub mod estimator;

/// Suggestion values returned to callers.
pub mod prediction;

/// Ranking of single-token continuations.
pub mod next_word;

/// Beam-search completion of several tokens.
pub mod sequence;

/// Memoization of prediction results, optionally LRU-bounded.
pub mod cache;

/// Incremental, window-bounded learning from finalized input.
pub mod learner;

/// High-level synchronous interface owning the model and the cache.
pub mod session;
