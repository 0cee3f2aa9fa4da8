use maud::{html, Markup, DOCTYPE};

use crate::types::BookRecord;

fn page(title: &str, body: Markup) -> Markup {
	html! {
		(DOCTYPE)
		html {
			head {
				meta charset="utf-8";
				title { (title) }
				link rel="stylesheet" href="/styles/main.css";
			}
			body {
				header {
					a href="/" { "Books" }
					" "
					a href="/add" { "Add" }
					form method="GET" action="/search" {
						input name="query" type="search" placeholder="title" {}
						button { "Search" }
					}
				}
				(body)
			}
		}
	}
}

pub fn book_list(books: &[BookRecord]) -> Markup {
	page("Books", html! {
		@if books.is_empty() {
			p { "No books found." }
		}
		@for book in books {
			article {
				@if let Some(cover) = book.cover() {
					img src=(cover.url) alt=(book.title) data-olid=(cover.external_id) {}
				}
				h2 { (book.title) }
				p { "by " (book.author) }
				@if let Some(rating) = book.rating {
					p { "Rating: " (rating) }
				}
				@if let Some(review) = &book.review {
					p { (review) }
				}
				small { (book.created_at.format("%Y-%m-%d %H:%M").to_string()) }
				a href={ "/edit/" (book.id) } { "Edit" }
				form method="POST" action={ "/delete/" (book.id) } {
					button { "Delete" }
				}
			}
		}
	})
}

pub fn add_form() -> Markup {
	page("Add a book", html! {
		form method="POST" action="/add" {
			input name="newTitle" placeholder="Title" {}
			input name="newAuthor" placeholder="Author" {}
			textarea name="newReview" placeholder="Review" {}
			input name="newRating" type="number" step="any" placeholder="Rating" {}
			button { "Add" }
		}
	})
}

pub fn edit_form(book: &BookRecord) -> Markup {
	let rating = book.rating.map(|r| r.to_string()).unwrap_or_default();
	page("Edit book", html! {
		form method="POST" action={ "/update/" (book.id) } {
			input name="title" value=(book.title) {}
			input name="author" value=(book.author) {}
			textarea name="review" { (book.review.as_deref().unwrap_or("")) }
			input name="rating" type="number" step="any" value=(rating) {}
			button { "Save" }
		}
	})
}
