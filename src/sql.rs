use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::types::{BookId, BookRecord, BookWrite};

pub const TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS books (
	id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
	title TEXT NOT NULL DEFAULT '',
	-- lowercased in Rust; sqlite's lower() only folds ASCII
	title_folded TEXT NOT NULL DEFAULT '',
	author TEXT NOT NULL DEFAULT '',
	review TEXT DEFAULT NULL,
	rating REAL DEFAULT NULL,
	cover_url TEXT DEFAULT NULL,
	external_cover_id TEXT DEFAULT NULL,
	created_at TEXT NOT NULL,
	CHECK((cover_url IS NULL) == (external_cover_id IS NULL))
);
"#;

const SELECT_BOOKS: &str = r#"
SELECT
	id, title, author, review, rating, cover_url, external_cover_id, created_at
FROM
	books
"#;

/// Bounded pool. Connects lazily, so an unreachable database surfaces on
/// the first query instead of here.
pub fn create_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
	let options = SqliteConnectOptions::from_str(database_url)?;
	Ok(SqlitePoolOptions::new()
		.max_connections(max_connections)
		.acquire_timeout(Duration::from_secs(3))
		.connect_lazy_with(options))
}

/// Single-connection pool over a private in-memory database, schema applied.
pub async fn open_in_memory() -> Result<SqlitePool, sqlx::Error> {
	// every sqlite::memory: connection is its own database
	let pool = SqlitePoolOptions::new()
		.max_connections(1)
		.idle_timeout(None)
		.max_lifetime(None)
		.connect("sqlite::memory:")
		.await?;
	apply_schema(&pool).await?;
	Ok(pool)
}

pub async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
	sqlx::query(TABLE_SCHEMA).execute(pool).await?;
	Ok(())
}

/// CRUD and title search over `books`.
#[derive(Clone)]
pub struct BookRepository {
	pool: SqlitePool,
}

impl BookRepository {
	pub fn new(pool: SqlitePool) -> Self {
		BookRepository { pool }
	}

	/// Storage order.
	pub async fn list_all(&self) -> Result<Vec<BookRecord>, sqlx::Error> {
		let query = format!("{SELECT_BOOKS} ORDER BY id");
		sqlx::query_as::<_, BookRecord>(&query)
			.fetch_all(&self.pool)
			.await
	}

	/// Case-insensitive substring match on the title, Unicode included. The
	/// needle is literal; `%` and `_` carry no special meaning and "" matches
	/// everything.
	pub async fn search_by_title(&self, needle: &str) -> Result<Vec<BookRecord>, sqlx::Error> {
		let query = format!("{SELECT_BOOKS} WHERE instr(title_folded, ?1) > 0 ORDER BY id");
		sqlx::query_as::<_, BookRecord>(&query)
			.bind(needle.to_lowercase())
			.fetch_all(&self.pool)
			.await
	}

	pub async fn get_by_id(&self, id: BookId) -> Result<Option<BookRecord>, sqlx::Error> {
		let query = format!("{SELECT_BOOKS} WHERE id = ?1");
		sqlx::query_as::<_, BookRecord>(&query)
			.bind(id)
			.fetch_optional(&self.pool)
			.await
	}

	pub async fn insert(&self, book: &BookWrite) -> Result<BookRecord, sqlx::Error> {
		let cover = book.cover.as_ref();
		sqlx::query_as::<_, BookRecord>(
			r#"
INSERT INTO books
	(title, author, review, rating, cover_url, external_cover_id, created_at, title_folded)
VALUES
	(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
RETURNING
	id, title, author, review, rating, cover_url, external_cover_id, created_at
			"#,
		)
		.bind(&book.form.title)
		.bind(&book.form.author)
		.bind(&book.form.review)
		.bind(book.form.rating)
		.bind(cover.map(|c| c.url.as_str()))
		.bind(cover.map(|c| c.external_id.as_str()))
		.bind(book.written_at)
		.bind(book.form.title.to_lowercase())
		.fetch_one(&self.pool)
		.await
	}

	/// Overwrites every mutable column. `Ok(false)` when no row has `id`.
	pub async fn update(&self, id: BookId, book: &BookWrite) -> Result<bool, sqlx::Error> {
		let cover = book.cover.as_ref();
		let result = sqlx::query(
			r#"
UPDATE books SET
	title = ?1,
	author = ?2,
	review = ?3,
	rating = ?4,
	cover_url = ?5,
	external_cover_id = ?6,
	created_at = ?7,
	title_folded = ?8
WHERE
	id = ?9
			"#,
		)
		.bind(&book.form.title)
		.bind(&book.form.author)
		.bind(&book.form.review)
		.bind(book.form.rating)
		.bind(cover.map(|c| c.url.as_str()))
		.bind(cover.map(|c| c.external_id.as_str()))
		.bind(book.written_at)
		.bind(book.form.title.to_lowercase())
		.bind(id)
		.execute(&self.pool)
		.await?;

		Ok(result.rows_affected() > 0)
	}

	/// Deleting a missing id is not an error. Returns the number of rows removed.
	pub async fn delete_by_id(&self, id: BookId) -> Result<u64, sqlx::Error> {
		let result = sqlx::query("DELETE FROM books WHERE id = ?1")
			.bind(id)
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected())
	}
}
