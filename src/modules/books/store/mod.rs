//! Storage seam for the books module.
//!
//! Every handler issues exactly one call against a [`BookStore`].

mod memory;
mod mongo;

pub use memory::InMemoryBookStore;
pub use mongo::MongoBookStore;

use std::sync::Arc;

use async_trait::async_trait;

use super::models::{Book, BookError, BookId, BookPatch};

pub type SharedBookStore = Arc<dyn BookStore>;

/// Equality match on a single field, or on nothing at all.
#[derive(Debug, Clone, PartialEq)]
pub enum BookFilter {
    All,
    Id(BookId),
    Title(String),
    Author(String),
    Genre(String),
    PublishedYear(i32),
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        match self {
            BookFilter::All => true,
            BookFilter::Id(id) => book.id.as_ref() == Some(id),
            BookFilter::Title(title) => book.title.as_ref() == Some(title),
            BookFilter::Author(author) => book.author.as_ref() == Some(author),
            BookFilter::Genre(genre) => book.genre.as_ref() == Some(genre),
            BookFilter::PublishedYear(year) => book.published_year == Some(*year),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Driver(#[from] mongodb::error::Error),

    #[error("failed to encode document: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    #[error("failed to decode document: {0}")]
    Decode(#[from] BookError),
}

#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a new book; the store assigns its id.
    async fn insert(&self, book: Book) -> Result<Book, StoreError>;

    /// All books matching `filter`, in natural order.
    async fn find(&self, filter: BookFilter) -> Result<Vec<Book>, StoreError>;

    /// First book matching `filter`.
    async fn find_one(&self, filter: BookFilter) -> Result<Option<Book>, StoreError>;

    /// Merge `patch` into the first match and return the updated book.
    async fn update_one(
        &self,
        filter: BookFilter,
        patch: BookPatch,
    ) -> Result<Option<Book>, StoreError>;

    /// Remove the first match and return it.
    async fn delete_one(&self, filter: BookFilter) -> Result<Option<Book>, StoreError>;
}
