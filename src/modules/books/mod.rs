pub mod handlers;
pub mod models;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    routing::{get, post},
    Router,
};
use bookshelf_db::Database;
use bookshelf_kernel::{InitCtx, Module};
use serde_json::{json, Value};

use store::{MongoBookStore, SharedBookStore};

/// CRUD endpoints over the `books` collection
pub struct BooksModule {
    store: SharedBookStore,
}

impl BooksModule {
    pub fn new(store: SharedBookStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/books", get(handlers::list_books).post(handlers::create_book))
            .route("/books/genre/business", get(handlers::list_business_books))
            .route(
                "/books/title/{title}",
                get(handlers::get_book_by_title).post(handlers::update_book_by_title),
            )
            .route(
                "/books/author/{author_name}",
                get(handlers::list_books_by_author),
            )
            .route("/books/year/{year}", get(handlers::list_books_by_year))
            .route(
                "/books/{book_id}",
                post(handlers::update_book_by_id).delete(handlers::delete_book),
            )
            .with_state(self.store.clone())
    }

    fn openapi(&self) -> Option<Value> {
        Some(openapi_fragment())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module over the shared database connection
pub fn create_module(db: &Database) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(Arc::new(MongoBookStore::new(db))))
}

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn path_param(name: &str) -> Value {
    json!({ "name": name, "in": "path", "required": true, "schema": { "type": "string" } })
}

fn operation(summary: &str, params: &[&str], body: Option<&str>, ok: (&str, Value)) -> Value {
    let (status, success) = ok;
    let parameters: Vec<Value> = params.iter().map(|name| path_param(name)).collect();

    let mut op = json!({
        "summary": summary,
        "tags": ["Books"],
        "parameters": parameters,
        "responses": {
            "500": error_response("Storage failure")
        }
    });
    op["responses"][status] = success;
    if status != "201" {
        op["responses"]["404"] = error_response("No matching book");
    }
    if let Some(schema) = body {
        op["requestBody"] = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": format!("#/components/schemas/{schema}") }
                }
            }
        });
    }
    op
}

fn openapi_fragment() -> Value {
    let book = json!({ "$ref": "#/components/schemas/Book" });
    let books = json!({ "type": "array", "items": book });
    let updated = json!({ "$ref": "#/components/schemas/UpdatedBook" });

    json!({
        "paths": {
            "/books": {
                "get": operation("List all books", &[], None, ("200", json_response("Books", books.clone()))),
                "post": operation("Create a book", &[], Some("BookInput"), ("201", json_response(
                    "Book added",
                    json!({ "$ref": "#/components/schemas/CreatedBook" }),
                )))
            },
            "/books/title/{title}": {
                "get": operation("Get a book by title", &["title"], None, ("200", json_response("Book", book.clone()))),
                "post": operation("Update the first book with this title", &["title"], Some("BookInput"), ("200", json_response("Book updated", updated.clone())))
            },
            "/books/author/{author_name}": {
                "get": operation("List books by author", &["author_name"], None, ("200", json_response("Books", books.clone())))
            },
            "/books/genre/business": {
                "get": operation("List business books", &[], None, ("200", json_response("Books", books.clone())))
            },
            "/books/year/{year}": {
                "get": operation("List books published in a year", &["year"], None, ("200", json_response("Books", books)))
            },
            "/books/{book_id}": {
                "post": operation("Update a book by id", &["book_id"], Some("BookInput"), ("200", json_response("Book updated", updated))),
                "delete": operation("Delete a book by id", &["book_id"], None, ("200", json_response(
                    "Book deleted",
                    json!({ "$ref": "#/components/schemas/Confirmation" }),
                )))
            }
        },
        "components": {
            "schemas": {
                "BookInput": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "genre": { "type": "string" },
                        "publishedYear": { "type": "integer" },
                        "rating": { "type": "number" }
                    },
                    "additionalProperties": true
                },
                "Book": {
                    "allOf": [
                        { "$ref": "#/components/schemas/BookInput" },
                        {
                            "type": "object",
                            "properties": { "_id": { "type": "string", "description": "Storage-assigned id" } },
                            "required": ["_id"]
                        }
                    ]
                },
                "CreatedBook": {
                    "type": "object",
                    "properties": { "message": { "type": "string" }, "book": book },
                    "required": ["message", "book"]
                },
                "UpdatedBook": {
                    "type": "object",
                    "properties": { "message": { "type": "string" }, "updatedBook": book },
                    "required": ["message", "updatedBook"]
                },
                "Confirmation": {
                    "type": "object",
                    "properties": { "message": { "type": "string" } },
                    "required": ["message"]
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route() {
        let fragment = openapi_fragment();
        let paths = fragment["paths"].as_object().unwrap();
        assert_eq!(paths.len(), 6);
        assert!(fragment["paths"]["/books/{book_id}"]["delete"]["responses"]["404"].is_object());
        assert!(fragment["paths"]["/books"]["post"]["responses"]["404"].is_null());
        assert_eq!(
            fragment["paths"]["/books/year/{year}"]["get"]["parameters"][0]["name"],
            "year"
        );
    }
}
