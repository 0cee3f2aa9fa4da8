use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Redirect, Response},
	routing::{get, post},
	Form, Router,
};
use maud::Markup;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::error::ServiceError;
use crate::service::BookService;
use crate::types::{BookForm, BookId, SearchParams};
use crate::views;

#[derive(Clone)]
pub struct AppState {
	pub books: BookService,
}

/// Every route plus a request span per call.
pub fn router(books: BookService) -> Router {
	routes(books).layer(TraceLayer::new_for_http())
}

/// [`router`] plus static files from `dir` for every unmatched path.
pub fn router_with_assets(books: BookService, dir: &str) -> Router {
	routes(books)
		.fallback_service(ServeDir::new(dir))
		.layer(TraceLayer::new_for_http())
}

fn routes(books: BookService) -> Router {
	Router::new()
		.route("/", get(display_all))
		.route("/add", get(display_add).post(perform_add))
		.route("/search", get(perform_search))
		.route("/edit/:id", get(display_edit))
		.route("/update/:id", post(perform_update))
		.route("/delete/:id", post(perform_delete))
		.with_state(AppState { books })
}

impl IntoResponse for ServiceError {
	fn into_response(self) -> Response {
		match self {
			ServiceError::NotFound(id) => {
				tracing::debug!(book_id = id, "book not found");
				(StatusCode::NOT_FOUND, "Book not found").into_response()
			}
			ServiceError::Lookup(e) => {
				tracing::error!(error = %e, kind = "lookup", "request failed");
				(StatusCode::BAD_GATEWAY, "Cover lookup failed").into_response()
			}
			ServiceError::Store(e) => {
				tracing::error!(error = %e, kind = "store", "request failed");
				(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
			}
		}
	}
}

async fn display_all(State(stt): State<AppState>) -> Result<Markup, ServiceError> {
	let books = stt.books.list().await?;
	Ok(views::book_list(&books))
}

async fn display_add() -> Markup {
	views::add_form()
}

async fn perform_add(
	State(stt): State<AppState>,
	Form(form): Form<BookForm>,
) -> Result<Redirect, ServiceError> {
	stt.books.add(form).await?;
	Ok(Redirect::to("/"))
}

async fn perform_search(
	State(stt): State<AppState>,
	Query(params): Query<SearchParams>,
) -> Result<Markup, ServiceError> {
	let books = stt.books.search(&params.query).await?;
	Ok(views::book_list(&books))
}

async fn display_edit(
	State(stt): State<AppState>,
	Path(id): Path<BookId>,
) -> Result<Markup, ServiceError> {
	let book = stt.books.get_for_edit(id).await?;
	Ok(views::edit_form(&book))
}

async fn perform_update(
	State(stt): State<AppState>,
	Path(id): Path<BookId>,
	Form(form): Form<BookForm>,
) -> Result<Redirect, ServiceError> {
	stt.books.update(id, form).await?;
	Ok(Redirect::to("/"))
}

async fn perform_delete(
	State(stt): State<AppState>,
	Path(id): Path<BookId>,
) -> Result<Redirect, ServiceError> {
	stt.books.delete(id).await?;
	Ok(Redirect::to("/"))
}
