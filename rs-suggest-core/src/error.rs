use thiserror::Error;

/// Errors raised while building sessions, loading corpora or decoding snapshots.
///
/// Prediction, learning and cache operations never fail; the worst
/// outcome there is an empty suggestion list.
#[derive(Error, Debug)]
pub enum SuggestError {
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Snapshot error: {0}")]
	Snapshot(#[from] postcard::Error),

	#[error("Corrupt snapshot: {0}")]
	CorruptSnapshot(String),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SuggestError>;
