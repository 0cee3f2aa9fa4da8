//! Personal book review catalog with cover enrichment.
//!
//! Each added or edited book is looked up by title and author; the first
//! search result's edition key becomes its cover. Records live in SQLite.

pub mod config;
pub mod cover;
pub mod error;
pub mod routes;
pub mod service;
pub mod sql;
pub mod types;
pub mod views;

use std::sync::Arc;

pub use config::Config;
pub use cover::{CoverLookup, CoverResolver, OpenLibraryClient, SearchDoc, StaticLookup};
pub use error::{ConfigError, LookupError, ServiceError};
pub use service::BookService;
pub use sql::BookRepository;
pub use types::{BookForm, BookId, BookRecord, Cover};

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
	let pool = sql::create_pool(&config.database_url, config.max_connections)?;
	match sql::apply_schema(&pool).await {
		Ok(()) => tracing::info!("connected to {}", config.database_url),
		// keep serving; each request reports its own store failure
		Err(e) => tracing::error!("database connection error: {}", e),
	}

	let lookup = OpenLibraryClient::with_timeout(&config.openlibrary_url, config.lookup_timeout)?;
	let covers = CoverResolver::with_covers_base(Arc::new(lookup), &config.covers_url);
	let books = BookService::new(BookRepository::new(pool), covers);
	let app = routes::router_with_assets(books, &config.static_dir);

	let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
	tracing::info!("server running on {}", listener.local_addr()?);
	axum::serve(listener, app).await?;
	Ok(())
}
