use crate::cover::CoverResolver;
use crate::error::ServiceError;
use crate::sql::BookRepository;
use crate::types::{BookForm, BookId, BookRecord, BookWrite};

/// Use cases behind the HTTP surface. Stateless; clones share the pool.
#[derive(Clone)]
pub struct BookService {
	books: BookRepository,
	covers: CoverResolver,
}

impl BookService {
	pub fn new(books: BookRepository, covers: CoverResolver) -> Self {
		BookService { books, covers }
	}

	/// Resolves a cover, then inserts. A failed lookup writes nothing.
	#[tracing::instrument(skip_all, fields(title = %form.title))]
	pub async fn add(&self, form: BookForm) -> Result<BookRecord, ServiceError> {
		let cover = self.covers.resolve(&form.title, &form.author).await?;
		let book = self.books.insert(&BookWrite::now(form, cover)).await?;
		tracing::info!(id = book.id, cover = ?book.external_cover_id, "added");
		Ok(book)
	}

	/// Replaces every field of `id`, cover included, from a fresh lookup.
	#[tracing::instrument(skip(self, form), fields(title = %form.title))]
	pub async fn update(&self, id: BookId, form: BookForm) -> Result<(), ServiceError> {
		let cover = self.covers.resolve(&form.title, &form.author).await?;
		let cover_id = cover.as_ref().map(|c| c.external_id.clone());
		if !self.books.update(id, &BookWrite::now(form, cover)).await? {
			return Err(ServiceError::NotFound(id));
		}
		tracing::info!(cover = cover_id.as_deref(), "updated");
		Ok(())
	}

	pub async fn list(&self) -> Result<Vec<BookRecord>, ServiceError> {
		Ok(self.books.list_all().await?)
	}

	#[tracing::instrument(skip(self))]
	pub async fn search(&self, query: &str) -> Result<Vec<BookRecord>, ServiceError> {
		let books = self.books.search_by_title(query).await?;
		tracing::debug!(hits = books.len(), "search");
		Ok(books)
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_for_edit(&self, id: BookId) -> Result<BookRecord, ServiceError> {
		self.books.get_by_id(id).await?.ok_or(ServiceError::NotFound(id))
	}

	#[tracing::instrument(skip(self))]
	pub async fn delete(&self, id: BookId) -> Result<(), ServiceError> {
		let removed = self.books.delete_by_id(id).await?;
		tracing::info!(removed, "delete");
		Ok(())
	}
}
