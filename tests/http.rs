//! HTTP surface tests.
//!
//! Starts the router on an ephemeral port and drives it with reqwest.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use bookshelf::sql::open_in_memory;
use bookshelf::{routes, BookRepository, BookService, CoverResolver, StaticLookup};
use reqwest::{redirect::Policy, Client, StatusCode};
use sqlx::SqlitePool;

async fn start_server(lookup: StaticLookup) -> (String, BookService) {
	let (base, books, _) = start_server_with_pool(lookup).await;
	(base, books)
}

async fn start_server_with_pool(lookup: StaticLookup) -> (String, BookService, SqlitePool) {
	let pool = open_in_memory().await.unwrap();
	let books = BookService::new(
		BookRepository::new(pool.clone()),
		CoverResolver::new(Arc::new(lookup)),
	);
	let app = routes::router(books.clone());
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, app).await.unwrap();
	});
	(format!("http://{addr}"), books, pool)
}

fn client() -> Client {
	Client::builder().redirect(Policy::none()).build().unwrap()
}

#[tokio::test]
async fn add_redirects_home_and_lists_book() {
	let (base, books) = start_server(StaticLookup::empty().with_cover("Dune", "OL123")).await;
	let client = client();

	let resp = client
		.post(format!("{base}/add"))
		.form(&[
			("newTitle", "Dune"),
			("newAuthor", "Frank Herbert"),
			("newReview", "Great"),
			("newRating", "5"),
		])
		.send()
		.await
		.unwrap();
	assert!(resp.status().is_redirection());
	assert_eq!(resp.headers()["location"], "/");

	let stored = books.list().await.unwrap();
	assert_eq!(stored.len(), 1);
	assert_eq!(stored[0].external_cover_id.as_deref(), Some("OL123"));

	let page = client.get(format!("{base}/")).send().await.unwrap();
	assert_eq!(page.status(), StatusCode::OK);
	let html = page.text().await.unwrap();
	assert!(html.contains("Dune"));
	assert!(html.contains("https://covers.openlibrary.org/b/olid/OL123-L.jpg"));
}

#[tokio::test]
async fn add_form_is_served() {
	let (base, _) = start_server(StaticLookup::empty()).await;
	let resp = client().get(format!("{base}/add")).send().await.unwrap();
	assert_eq!(resp.status(), StatusCode::OK);
	assert!(resp.text().await.unwrap().contains("newTitle"));
}

#[tokio::test]
async fn search_renders_matches_only() {
	let (base, books) = start_server(StaticLookup::empty()).await;
	books.add(bookshelf::BookForm::new("Dune", "Frank Herbert")).await.unwrap();
	books.add(bookshelf::BookForm::new("Emma", "Jane Austen")).await.unwrap();

	let html = client()
		.get(format!("{base}/search?query=DUN"))
		.send()
		.await
		.unwrap()
		.text()
		.await
		.unwrap();
	assert!(html.contains("Dune"));
	assert!(!html.contains("Emma"));
}

#[tokio::test]
async fn search_without_query_lists_everything() {
	let (base, books) = start_server(StaticLookup::empty()).await;
	books.add(bookshelf::BookForm::new("Dune", "")).await.unwrap();
	books.add(bookshelf::BookForm::new("Emma", "")).await.unwrap();

	let html = client().get(format!("{base}/search")).send().await.unwrap().text().await.unwrap();
	assert!(html.contains("Dune"));
	assert!(html.contains("Emma"));
}

#[tokio::test]
async fn edit_unknown_id_is_404() {
	let (base, books) = start_server(StaticLookup::empty()).await;
	let resp = client().get(format!("{base}/edit/404")).send().await.unwrap();
	assert_eq!(resp.status(), StatusCode::NOT_FOUND);
	assert_eq!(resp.text().await.unwrap(), "Book not found");
	assert!(books.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn edit_then_update_replaces_record() {
	let (base, books) = start_server(StaticLookup::empty().with_cover("Dune", "OL123")).await;
	let book = books
		.add(bookshelf::BookForm::new("Dune", "Frank Herbert").review("Great").rating(5.0))
		.await
		.unwrap();
	let client = client();

	let edit = client.get(format!("{base}/edit/{}", book.id)).send().await.unwrap();
	assert_eq!(edit.status(), StatusCode::OK);
	assert!(edit.text().await.unwrap().contains("Great"));

	let resp = client
		.post(format!("{base}/update/{}", book.id))
		.form(&[("title", "Children of Dune"), ("author", "Frank Herbert"), ("rating", "4")])
		.send()
		.await
		.unwrap();
	assert!(resp.status().is_redirection());

	let after = books.get_for_edit(book.id).await.unwrap();
	assert_eq!(after.title, "Children of Dune");
	assert_eq!(after.rating, Some(4.0));
	assert_eq!(after.review, None);
	assert_eq!(after.cover(), None);
}

#[tokio::test]
async fn update_unknown_id_is_404() {
	let (base, _) = start_server(StaticLookup::empty()).await;
	let resp = client()
		.post(format!("{base}/update/77"))
		.form(&[("title", "Ghost")])
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lookup_failure_answers_with_bad_gateway() {
	let (base, books) = start_server(StaticLookup::failing("unreachable")).await;
	let resp = client()
		.post(format!("{base}/add"))
		.form(&[("newTitle", "Dune"), ("newAuthor", "Frank Herbert")])
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
	assert!(books.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_twice_redirects_both_times() {
	let (base, books) = start_server(StaticLookup::empty()).await;
	let book = books.add(bookshelf::BookForm::new("Dune", "")).await.unwrap();
	let client = client();

	for _ in 0..2 {
		let resp = client.post(format!("{base}/delete/{}", book.id)).send().await.unwrap();
		assert!(resp.status().is_redirection());
		assert!(books.list().await.unwrap().is_empty());
	}
}

#[tokio::test]
async fn store_failure_answers_with_server_error() {
	let (base, _, pool) = start_server_with_pool(StaticLookup::empty()).await;
	sqlx::query("DROP TABLE books").execute(&pool).await.unwrap();

	let resp = client().get(format!("{base}/")).send().await.unwrap();
	assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn non_finite_rating_is_rejected_not_dropped() {
	let (base, books) = start_server(StaticLookup::empty()).await;
	let resp = client()
		.post(format!("{base}/add"))
		.form(&[("newTitle", "Dune"), ("newRating", "NaN")])
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
	assert!(books.list().await.unwrap().is_empty());
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
	fn text(&self) -> String {
		String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
	}
}

impl Write for Captured {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().unwrap().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

#[tokio::test]
async fn failures_are_logged_inside_request_span() {
	let captured = Captured::default();
	let writer = captured.clone();
	let subscriber = tracing_subscriber::fmt()
		.with_max_level(tracing::Level::DEBUG)
		.with_ansi(false)
		.with_writer(move || writer.clone())
		.finish();
	let _guard = tracing::subscriber::set_default(subscriber);

	let (base, _) = start_server(StaticLookup::failing("lookup host unreachable")).await;
	let resp = client()
		.post(format!("{base}/update/3"))
		.form(&[("title", "Dune")])
		.send()
		.await
		.unwrap();
	assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

	let logs = captured.text();
	let line = logs
		.lines()
		.find(|l| l.contains("request failed"))
		.unwrap_or_else(|| panic!("no failure logged:\n{logs}"));
	assert!(line.contains("ERROR"), "{line}");
	assert!(line.contains("uri=/update/3"), "{line}");
	assert!(line.contains("lookup host unreachable"), "{line}");
	assert!(line.contains("kind=\"lookup\""), "{line}");
}
