use async_trait::async_trait;
use bookshelf_db::Database;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Bson, Document},
    options::ReturnDocument,
    Collection,
};
use serde_json::Value;

use super::{BookFilter, BookStore, StoreError};
use crate::modules::books::models::{Book, BookError, BookId, BookPatch, ID_FIELD};

/// [`BookStore`] over a MongoDB collection of free-form documents.
#[derive(Debug, Clone)]
pub struct MongoBookStore {
    collection: Collection<Document>,
}

impl MongoBookStore {
    pub const COLLECTION: &'static str = "books";

    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, Self::COLLECTION)
    }

    pub fn with_collection(db: &Database, name: &str) -> Self {
        Self {
            collection: db.collection(name),
        }
    }
}

/// `None` when the filter cannot match any stored document.
fn filter_document(filter: &BookFilter) -> Option<Document> {
    let document = match filter {
        BookFilter::All => doc! {},
        BookFilter::Id(id) => doc! { "_id": id.to_object_id()? },
        BookFilter::Title(title) => doc! { "title": title.as_str() },
        BookFilter::Author(author) => doc! { "author": author.as_str() },
        BookFilter::Genre(genre) => doc! { "genre": genre.as_str() },
        BookFilter::PublishedYear(year) => doc! { "publishedYear": *year },
    };
    Some(document)
}

fn encode(book: &Book, id: ObjectId) -> Result<Document, StoreError> {
    let mut document = bson::to_document(book)?;
    document.insert(ID_FIELD, id);
    Ok(document)
}

fn decode(mut document: Document) -> Result<Book, StoreError> {
    let id = document.remove(ID_FIELD).map(|id| match id {
        Bson::ObjectId(oid) => BookId::from(oid),
        Bson::String(s) => BookId::from(s),
        other => BookId::from(other.to_string()),
    });

    let Value::Object(fields) = Bson::Document(document).into_relaxed_extjson() else {
        return Err(BookError::NotAnObject.into());
    };

    let mut book = Book::from_fields(fields)?;
    book.id = id;
    Ok(book)
}

#[async_trait]
impl BookStore for MongoBookStore {
    async fn insert(&self, book: Book) -> Result<Book, StoreError> {
        let id = ObjectId::new();
        let document = encode(&book, id)?;
        self.collection.insert_one(document).await?;

        Ok(Book {
            id: Some(id.into()),
            ..book
        })
    }

    async fn find(&self, filter: BookFilter) -> Result<Vec<Book>, StoreError> {
        let Some(query) = filter_document(&filter) else {
            return Ok(Vec::new());
        };

        let documents: Vec<Document> = self.collection.find(query).await?.try_collect().await?;
        documents.into_iter().map(decode).collect()
    }

    async fn find_one(&self, filter: BookFilter) -> Result<Option<Book>, StoreError> {
        let Some(query) = filter_document(&filter) else {
            return Ok(None);
        };

        self.collection.find_one(query).await?.map(decode).transpose()
    }

    async fn update_one(
        &self,
        filter: BookFilter,
        patch: BookPatch,
    ) -> Result<Option<Book>, StoreError> {
        // `$set` rejects an empty document
        if patch.is_empty() {
            return self.find_one(filter).await;
        }
        let Some(query) = filter_document(&filter) else {
            return Ok(None);
        };

        let update = doc! { "$set": bson::to_document(patch.fields())? };
        self.collection
            .find_one_and_update(query, update)
            .return_document(ReturnDocument::After)
            .await?
            .map(decode)
            .transpose()
    }

    async fn delete_one(&self, filter: BookFilter) -> Result<Option<Book>, StoreError> {
        let Some(query) = filter_document(&filter) else {
            return Ok(None);
        };

        self.collection
            .find_one_and_delete(query)
            .await?
            .map(decode)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_kernel::settings::DatabaseSettings;
    use serde_json::json;

    #[test]
    fn unissued_ids_match_nothing() {
        let filter = BookFilter::Id(BookId::from("abc".to_string()));
        assert!(filter_document(&filter).is_none());

        let id = ObjectId::new();
        let filter = BookFilter::Id(id.into());
        assert_eq!(filter_document(&filter), Some(doc! { "_id": id }));
    }

    #[test]
    fn field_filters_use_stored_names() {
        assert_eq!(
            filter_document(&BookFilter::PublishedYear(2018)),
            Some(doc! { "publishedYear": 2018 })
        );
        assert_eq!(
            filter_document(&BookFilter::Genre("Business".to_string())),
            Some(doc! { "genre": "Business" })
        );
        assert_eq!(filter_document(&BookFilter::All), Some(doc! {}));
    }

    #[test]
    fn documents_round_trip_through_bson() {
        let book = Book::from_request(
            json!({
                "title": "Atomic Habits",
                "author": "James Clear",
                "genre": "Business",
                "publishedYear": 2018,
                "rating": 4,
                "tags": ["habits", "self-help"],
                "publisher": { "name": "Avery", "city": "New York" }
            })
            .as_object()
            .unwrap()
            .clone(),
        )
        .unwrap();

        let id = ObjectId::new();
        let document = encode(&book, id).unwrap();
        assert_eq!(document.get_object_id("_id").unwrap(), id);
        assert_eq!(document.get_str("title").unwrap(), "Atomic Habits");

        let decoded = decode(document).unwrap();
        assert_eq!(decoded.id, Some(BookId::from(id)));
        assert_eq!(decoded.published_year, Some(2018));
        assert_eq!(decoded.rating, Some(4.into()));
        assert_eq!(decoded.extra["publisher"]["city"], json!("New York"));
        assert_eq!(decoded.extra, book.extra);
    }

    #[test]
    fn decode_accepts_numeric_variants() {
        let decoded = decode(doc! {
            "_id": ObjectId::new(),
            "title": "Deep Work",
            "publishedYear": 2016_i64,
            "rating": 4.5,
        })
        .unwrap();
        assert_eq!(decoded.published_year, Some(2016));
        assert_eq!(decoded.rating.and_then(|n| n.as_f64()), Some(4.5));
    }

    #[test_with::env(MONGODB)]
    #[tokio::test]
    async fn crud_against_live_server() {
        let settings = DatabaseSettings {
            uri: std::env::var("MONGODB").ok(),
            name: None,
        };
        let db = bookshelf_db::connect(&settings).await.unwrap();
        let collection = format!("books_test_{}", ObjectId::new().to_hex());
        let store = MongoBookStore::with_collection(&db, &collection);

        let saved = store
            .insert(Book {
                title: Some("Atomic Habits".to_string()),
                genre: Some("Business".to_string()),
                published_year: Some(2018),
                ..Book::default()
            })
            .await
            .unwrap();
        let id = saved.id.clone().unwrap();

        let found = store
            .find(BookFilter::Genre("Business".to_string()))
            .await
            .unwrap();
        assert_eq!(found, vec![saved.clone()]);

        let patch = BookPatch::from_request(json!({ "rating": 4.5 }).as_object().unwrap().clone())
            .unwrap();
        let updated = store
            .update_one(BookFilter::Id(id.clone()), patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.rating.and_then(|n| n.as_f64()), Some(4.5));
        assert_eq!(updated.title, saved.title);

        assert!(store.delete_one(BookFilter::Id(id.clone())).await.unwrap().is_some());
        assert!(store.delete_one(BookFilter::Id(id)).await.unwrap().is_none());

        store.collection.drop().await.unwrap();
        db.shutdown().await;
    }
}
