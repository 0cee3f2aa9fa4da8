use thiserror::Error;

use crate::types::BookId;

/// Failures talking to the cover lookup service.
///
/// An empty result set is not one of these; the resolver treats it as
/// "no cover".
#[derive(Debug, Error)]
pub enum LookupError {
	#[error("lookup request failed: {0}")]
	Request(#[from] reqwest::Error),

	#[error("lookup service answered {status}: {body}")]
	Status { status: u16, body: String },

	#[error("unexpected lookup response at '{path}': {source}")]
	Decode {
		path: String,
		source: serde_json::Error,
	},

	#[error("lookup timed out")]
	Timeout,

	#[error("{0}")]
	Stub(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
	#[error("store error: {0}")]
	Store(#[from] sqlx::Error),

	#[error("cover lookup error: {0}")]
	Lookup(#[from] LookupError),

	#[error("book not found: id={0}")]
	NotFound(BookId),
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("invalid value for {key}: '{value}'")]
	Invalid { key: &'static str, value: String },
}
