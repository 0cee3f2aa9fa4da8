//! Cover discovery.
//!
//! The lookup service is reached through [`CoverLookup`]; [`CoverResolver`]
//! turns its first result into a [`Cover`] or falls back to no cover at all.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::LookupError;
use crate::types::Cover;

pub const OPENLIBRARY_URL: &str = "https://openlibrary.org";
pub const COVERS_URL: &str = "https://covers.openlibrary.org";

/// One entry of the lookup service's `docs` array. Other fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchDoc {
	#[serde(default)]
	pub cover_edition_key: Option<String>,
}

impl SearchDoc {
	pub fn with_key(key: &str) -> Self {
		SearchDoc { cover_edition_key: Some(key.to_string()) }
	}
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
	docs: Vec<SearchDoc>,
}

/// A bibliographic search keyed by title and author.
#[async_trait]
pub trait CoverLookup: Send + Sync {
	/// Results in the service's own order.
	async fn search(&self, title: &str, author: &str) -> Result<Vec<SearchDoc>, LookupError>;

	fn name(&self) -> &'static str;
}

pub struct OpenLibraryClient {
	client: Client,
	base_url: String,
}

impl OpenLibraryClient {
	pub fn new(client: Client, base_url: &str) -> Self {
		OpenLibraryClient {
			client,
			base_url: base_url.trim_end_matches('/').to_string(),
		}
	}

	/// Builds its own HTTP client. `None` means requests never time out.
	pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, LookupError> {
		let mut builder = Client::builder();
		if let Some(timeout) = timeout {
			builder = builder.timeout(timeout);
		}
		Ok(Self::new(builder.build()?, base_url))
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}
}

fn request_error(err: reqwest::Error) -> LookupError {
	if err.is_timeout() {
		LookupError::Timeout
	} else {
		LookupError::Request(err)
	}
}

#[async_trait]
impl CoverLookup for OpenLibraryClient {
	async fn search(&self, title: &str, author: &str) -> Result<Vec<SearchDoc>, LookupError> {
		let response = self
			.client
			.get(self.url("/search.json"))
			.query(&[("title", title), ("author", author)])
			.send()
			.await
			.map_err(request_error)?;

		let status = response.status();
		let body = response.text().await.map_err(request_error)?;
		if !status.is_success() {
			return Err(LookupError::Status {
				status: status.as_u16(),
				body,
			});
		}

		let deserializer = &mut serde_json::Deserializer::from_str(&body);
		let parsed: SearchResponse =
			serde_path_to_error::deserialize(deserializer).map_err(|e| LookupError::Decode {
				path: e.path().to_string(),
				source: e.into_inner(),
			})?;
		Ok(parsed.docs)
	}

	fn name(&self) -> &'static str {
		"openlibrary"
	}
}

/// Deterministic lookup for tests and offline runs.
///
/// Answers by exact title; unknown titles get an empty result set.
#[derive(Default)]
pub struct StaticLookup {
	docs: HashMap<String, Vec<SearchDoc>>,
	failure: Option<String>,
	calls: AtomicUsize,
}

impl StaticLookup {
	pub fn empty() -> Self {
		Self::default()
	}

	pub fn failing(message: &str) -> Self {
		StaticLookup {
			failure: Some(message.to_string()),
			..Self::default()
		}
	}

	pub fn with_cover(self, title: &str, key: &str) -> Self {
		self.with_docs(title, vec![SearchDoc::with_key(key)])
	}

	pub fn with_docs(mut self, title: &str, docs: Vec<SearchDoc>) -> Self {
		self.docs.insert(title.to_string(), docs);
		self
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl CoverLookup for StaticLookup {
	async fn search(&self, title: &str, _author: &str) -> Result<Vec<SearchDoc>, LookupError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if let Some(message) = &self.failure {
			return Err(LookupError::Stub(message.clone()));
		}
		Ok(self.docs.get(title).cloned().unwrap_or_default())
	}

	fn name(&self) -> &'static str {
		"static"
	}
}

/// Title/author to cover, using only the first search result.
#[derive(Clone)]
pub struct CoverResolver {
	lookup: Arc<dyn CoverLookup>,
	covers_base: String,
}

impl CoverResolver {
	pub fn new(lookup: Arc<dyn CoverLookup>) -> Self {
		Self::with_covers_base(lookup, COVERS_URL)
	}

	pub fn with_covers_base(lookup: Arc<dyn CoverLookup>, covers_base: &str) -> Self {
		CoverResolver {
			lookup,
			covers_base: covers_base.trim_end_matches('/').to_string(),
		}
	}

	pub fn cover_url(&self, external_id: &str) -> String {
		format!("{}/b/olid/{}-L.jpg", self.covers_base, external_id)
	}

	/// `Ok(None)` when there are no results or the first one has no edition key.
	pub async fn resolve(&self, title: &str, author: &str) -> Result<Option<Cover>, LookupError> {
		let docs = self.lookup.search(title, author).await?;
		let key = docs
			.into_iter()
			.next()
			.and_then(|doc| doc.cover_edition_key)
			.filter(|key| !key.is_empty());

		match key {
			Some(external_id) => {
				tracing::debug!(provider = self.lookup.name(), %external_id, "cover resolved for '{}'", title);
				Ok(Some(Cover {
					url: self.cover_url(&external_id),
					external_id,
				}))
			}
			None => {
				tracing::debug!(provider = self.lookup.name(), "no cover for '{}'", title);
				Ok(None)
			}
		}
	}
}
