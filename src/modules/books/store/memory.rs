use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BookFilter, BookStore, StoreError};
use crate::modules::books::models::{Book, BookId, BookPatch};

/// Process-local store with the same matching rules as [`super::MongoBookStore`].
#[derive(Debug, Default)]
pub struct InMemoryBookStore {
    books: RwLock<Vec<Book>>,
}

impl InMemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn insert(&self, mut book: Book) -> Result<Book, StoreError> {
        book.id = Some(BookId::generate());
        self.books.write().await.push(book.clone());
        Ok(book)
    }

    async fn find(&self, filter: BookFilter) -> Result<Vec<Book>, StoreError> {
        let books = self.books.read().await;
        Ok(books
            .iter()
            .filter(|book| filter.matches(book))
            .cloned()
            .collect())
    }

    async fn find_one(&self, filter: BookFilter) -> Result<Option<Book>, StoreError> {
        let books = self.books.read().await;
        Ok(books.iter().find(|book| filter.matches(book)).cloned())
    }

    async fn update_one(
        &self,
        filter: BookFilter,
        patch: BookPatch,
    ) -> Result<Option<Book>, StoreError> {
        let mut books = self.books.write().await;
        let Some(book) = books.iter_mut().find(|book| filter.matches(book)) else {
            return Ok(None);
        };

        *book = patch.apply(book)?;
        Ok(Some(book.clone()))
    }

    async fn delete_one(&self, filter: BookFilter) -> Result<Option<Book>, StoreError> {
        let mut books = self.books.write().await;
        let position = books.iter().position(|book| filter.matches(book));
        Ok(position.map(|index| books.remove(index)))
    }
}
