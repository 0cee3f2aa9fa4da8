use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

pub type BookId = i64;

/// One reviewed book, as persisted in the `books` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct BookRecord {
	pub id: BookId,
	pub title: String,
	pub author: String,
	pub review: Option<String>,
	pub rating: Option<f64>,
	pub cover_url: Option<String>,
	pub external_cover_id: Option<String>,
	// last write, not first creation
	pub created_at: DateTime<Utc>,
}

impl BookRecord {
	/// Rebuilds the cover pair; `None` unless both columns are set.
	pub fn cover(&self) -> Option<Cover> {
		match (&self.external_cover_id, &self.cover_url) {
			(Some(external_id), Some(url)) => Some(Cover {
				external_id: external_id.clone(),
				url: url.clone(),
			}),
			_ => None,
		}
	}
}

/// A resolved cover. Identifier and image address always travel together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cover {
	pub external_id: String,
	pub url: String,
}

/// Fields submitted by the add and edit forms.
///
/// The add page posts `newTitle`/`newAuthor`/... while the edit page posts
/// the bare names, so both spellings are accepted. Anything omitted is
/// written as empty (title, author) or null (review, rating).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BookForm {
	#[serde(default, alias = "newTitle")]
	pub title: String,
	#[serde(default, alias = "newAuthor")]
	pub author: String,
	#[serde(default, alias = "newReview", deserialize_with = "empty_as_none")]
	pub review: Option<String>,
	#[serde(default, alias = "newRating", deserialize_with = "finite_rating")]
	pub rating: Option<f64>,
}

impl BookForm {
	pub fn new(title: &str, author: &str) -> Self {
		BookForm {
			title: title.to_string(),
			author: author.to_string(),
			..Default::default()
		}
	}

	pub fn review(mut self, review: &str) -> Self {
		self.review = Some(review.to_string());
		self
	}

	pub fn rating(mut self, rating: f64) -> Self {
		self.rating = Some(rating);
		self
	}
}

/// Everything a single insert or update writes.
#[derive(Debug, Clone)]
pub struct BookWrite {
	pub form: BookForm,
	pub cover: Option<Cover>,
	pub written_at: DateTime<Utc>,
}

impl BookWrite {
	pub fn now(form: BookForm, cover: Option<Cover>) -> Self {
		BookWrite { form, cover, written_at: Utc::now() }
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
	// missing behaves like "", which matches every title
	#[serde(default)]
	pub query: String,
}

// html forms send "" for untouched inputs
fn empty_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
	D: Deserializer<'de>,
	T: FromStr,
	T::Err: Display,
{
	let raw: Option<String> = Option::deserialize(de)?;
	match raw.as_deref() {
		None | Some("") => Ok(None),
		Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
	}
}

// NaN and infinities would be stored as NULL by sqlite
fn finite_rating<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
	D: Deserializer<'de>,
{
	match empty_as_none::<D, f64>(de)? {
		Some(rating) if !rating.is_finite() => Err(serde::de::Error::custom(format!(
			"rating must be a finite number, got {rating}"
		))),
		rating => Ok(rating),
	}
}
