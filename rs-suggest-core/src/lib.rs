//! Adaptive n-gram next-word suggestion library.
//!
//! This crate provides the prediction core of a message composer, including:
//! - Text normalization into bounded token windows
//! - Word-level unigram / bigram / trigram frequency models
//! - Stupid-backoff probability estimation
//! - Single-word ranking and beam-search phrase completion
//! - Online learning from finalized user input
//! - Memoized and debounced prediction requests
//!
//! The synchronous pipeline lives under `model`; the debounced
//! asynchronous façade lives under `service`.

/// Configuration accepted by sessions and services.
pub mod config;

/// Error type shared by the fallible constructors and loaders.
pub mod error;

/// N-gram models, estimators, predictors and the session façade.
pub mod model;

/// Debounced asynchronous prediction service.
pub mod service;

/// I/O utilities (corpus loading).
///
/// Not exposed
pub(crate) mod io;

pub use config::PredictorConfig;
pub use error::{Result, SuggestError};
pub use model::prediction::{Prediction, PredictionMetadata};
pub use model::session::PredictionSession;
pub use service::DebouncedPredictionService;
