//! Request handlers for the books module.
//!
//! Each handler performs one store call and maps the outcome: a match is a
//! success, no match is a `404`, and any store failure becomes a `500` with
//! the handler's fixed message through [`OrInternal`].

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use bookshelf_http::error::{AppError, AppResult, OrInternal};
use serde_json::{Map, Value};

use super::models::{
    cast, Book, BookId, BookPatch, Confirmation, CreatedBook, UpdatedBook, BUSINESS_GENRE,
};
use super::store::{BookFilter, SharedBookStore};

const ADD_FAILED: &str = "Failed to add book.";
const FETCH_BOOKS_FAILED: &str = "Failed to fetch books.";
const FETCH_BOOK_FAILED: &str = "Failed to fetch book.";
const UPDATE_RATING_FAILED: &str = "Failed to update rating.";
const UPDATE_BOOK_FAILED: &str = "Failed to update book.";
const DELETE_FAILED: &str = "Failed to delete book.";

const BOOK_MISSING: &str = "Book does not exist";

type Payload = Result<Json<Map<String, Value>>, JsonRejection>;

/// A request without a JSON content type carries no fields. Any other
/// unreadable body fails like the storage call it was meant for.
fn payload_fields(payload: Payload) -> Result<Map<String, Value>, JsonRejection> {
    match payload {
        Ok(Json(fields)) => Ok(fields),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(Map::new()),
        Err(rejection) => Err(rejection),
    }
}

/// An empty listing is reported as not found.
fn non_empty(books: Vec<Book>, message: impl Into<String>) -> AppResult<Json<Vec<Book>>> {
    if books.is_empty() {
        Err(AppError::not_found(message))
    } else {
        Ok(Json(books))
    }
}

pub async fn create_book(
    State(store): State<SharedBookStore>,
    payload: Payload,
) -> AppResult<(StatusCode, Json<CreatedBook>)> {
    let fields = payload_fields(payload).or_internal(ADD_FAILED)?;
    let book = Book::from_request(fields).or_internal(ADD_FAILED)?;
    let book = store.insert(book).await.or_internal(ADD_FAILED)?;

    tracing::info!(book_id = ?book.id, title = ?book.title, "new book added");

    Ok((
        StatusCode::CREATED,
        Json(CreatedBook {
            message: "Book added successfully",
            book,
        }),
    ))
}

pub async fn list_books(State(store): State<SharedBookStore>) -> AppResult<Json<Vec<Book>>> {
    let books = store
        .find(BookFilter::All)
        .await
        .or_internal(FETCH_BOOKS_FAILED)?;
    non_empty(books, "No books found.")
}

pub async fn get_book_by_title(
    State(store): State<SharedBookStore>,
    Path(title): Path<String>,
) -> AppResult<Json<Book>> {
    store
        .find_one(BookFilter::Title(title))
        .await
        .or_internal(FETCH_BOOK_FAILED)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Book not found."))
}

pub async fn list_books_by_author(
    State(store): State<SharedBookStore>,
    Path(author_name): Path<String>,
) -> AppResult<Json<Vec<Book>>> {
    let books = store
        .find(BookFilter::Author(author_name))
        .await
        .or_internal(FETCH_BOOKS_FAILED)?;
    non_empty(books, "No books found for this author.")
}

pub async fn list_business_books(
    State(store): State<SharedBookStore>,
) -> AppResult<Json<Vec<Book>>> {
    let books = store
        .find(BookFilter::Genre(BUSINESS_GENRE.to_string()))
        .await
        .or_internal(FETCH_BOOKS_FAILED)?;
    non_empty(books, "No business books found.")
}

/// A year that is not an integer matches no book, so it is answered as
/// not found rather than rejected.
pub async fn list_books_by_year(
    State(store): State<SharedBookStore>,
    Path(year): Path<String>,
) -> AppResult<Json<Vec<Book>>> {
    let not_found = |echo: Value| {
        AppError::not_found(format!("No books found for year {year}.")).with_detail("year", echo)
    };

    let published_year = match cast::integer("year", &Value::String(year.clone())) {
        Ok(Some(published_year)) => published_year,
        _ => {
            tracing::debug!(%year, "year is not an integer; nothing can match");
            return Err(not_found(Value::String(year.clone())));
        }
    };

    let books = store
        .find(BookFilter::PublishedYear(published_year))
        .await
        .or_internal(FETCH_BOOKS_FAILED)?;

    if books.is_empty() {
        Err(not_found(Value::from(published_year)))
    } else {
        Ok(Json(books))
    }
}

pub async fn update_book_by_id(
    State(store): State<SharedBookStore>,
    Path(book_id): Path<String>,
    payload: Payload,
) -> AppResult<Json<UpdatedBook>> {
    let fields = payload_fields(payload).or_internal(UPDATE_RATING_FAILED)?;
    let patch = BookPatch::from_request(fields).or_internal(UPDATE_RATING_FAILED)?;
    let updated_book = store
        .update_one(BookFilter::Id(BookId::from(book_id)), patch)
        .await
        .or_internal(UPDATE_RATING_FAILED)?
        .ok_or_else(|| AppError::not_found(BOOK_MISSING))?;

    tracing::info!(book_id = ?updated_book.id, "book updated by id");

    Ok(Json(UpdatedBook {
        message: "Book rating updated successfully",
        updated_book,
    }))
}

pub async fn update_book_by_title(
    State(store): State<SharedBookStore>,
    Path(book_title): Path<String>,
    payload: Payload,
) -> AppResult<Json<UpdatedBook>> {
    let fields = payload_fields(payload).or_internal(UPDATE_BOOK_FAILED)?;
    let patch = BookPatch::from_request(fields).or_internal(UPDATE_BOOK_FAILED)?;
    let updated_book = store
        .update_one(BookFilter::Title(book_title), patch)
        .await
        .or_internal(UPDATE_BOOK_FAILED)?
        .ok_or_else(|| AppError::not_found(BOOK_MISSING))?;

    tracing::info!(book_id = ?updated_book.id, "book updated by title");

    Ok(Json(UpdatedBook {
        message: "Book details updated successfully",
        updated_book,
    }))
}

pub async fn delete_book(
    State(store): State<SharedBookStore>,
    Path(book_id): Path<String>,
) -> AppResult<Json<Confirmation>> {
    let deleted = store
        .delete_one(BookFilter::Id(BookId::from(book_id)))
        .await
        .or_internal(DELETE_FAILED)?
        .ok_or_else(|| AppError::not_found("Book not found"))?;

    tracing::info!(book_id = ?deleted.id, "book deleted");

    Ok(Json(Confirmation {
        message: "Book deleted successfully.",
    }))
}
