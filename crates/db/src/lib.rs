//! MongoDB connection bootstrap.
//!
//! A single [`Database`] is opened at process start and shared by every
//! consumer for the lifetime of the process. The driver keeps its own
//! connection pool behind the handle, so cloning is cheap.

use bookshelf_kernel::settings::DatabaseSettings;
use mongodb::{bson::doc, Client, Collection};

/// Database used when neither the connection string nor settings name one.
pub const FALLBACK_DATABASE: &str = "test";

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database connection string is not configured; set {0}")]
    MissingUri(&'static str),

    #[error("database driver error: {0}")]
    Driver(#[from] mongodb::error::Error),
}

/// Shared handle to the configured database
#[derive(Clone, Debug)]
pub struct Database {
    client: Client,
    inner: mongodb::Database,
}

impl Database {
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Typed handle to a collection of this database
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.inner.collection(name)
    }

    /// Round-trip a `ping` command to the server
    pub async fn ping(&self) -> Result<(), DbError> {
        self.inner.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    /// Close the client and its pooled connections
    pub async fn shutdown(self) {
        tracing::info!(target: "bookshelf-db", database = self.name(), "closing database connection");
        self.client.shutdown().await;
    }
}

/// Open the connection described by `settings` and verify it with a `ping`.
///
/// Failures are logged and returned; callers treat them as fatal.
pub async fn connect(settings: &DatabaseSettings) -> Result<Database, DbError> {
    let result = open(settings).await;

    match &result {
        Ok(db) => tracing::info!(target: "bookshelf-db", database = db.name(), "connected to database"),
        Err(err) => tracing::error!(target: "bookshelf-db", error = %err, "error connecting to database"),
    }

    result
}

async fn open(settings: &DatabaseSettings) -> Result<Database, DbError> {
    let uri = settings
        .uri
        .as_deref()
        .filter(|uri| !uri.trim().is_empty())
        .ok_or(DbError::MissingUri(DatabaseSettings::URI_ENV))?;

    let client = Client::with_uri_str(uri).await?;
    let inner = select_database(&client, settings);
    let db = Database { client, inner };

    db.ping().await?;
    Ok(db)
}

fn select_database(client: &Client, settings: &DatabaseSettings) -> mongodb::Database {
    client.default_database().unwrap_or_else(|| {
        client.database(settings.name.as_deref().unwrap_or(FALLBACK_DATABASE))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(uri: Option<&str>) -> DatabaseSettings {
        DatabaseSettings {
            uri: uri.map(str::to_string),
            name: None,
        }
    }

    #[tokio::test]
    async fn missing_uri_is_reported() {
        let err = connect(&settings(None)).await.unwrap_err();
        assert!(matches!(err, DbError::MissingUri("MONGODB")));
    }

    #[tokio::test]
    async fn blank_uri_counts_as_missing() {
        let err = connect(&settings(Some("  "))).await.unwrap_err();
        assert!(matches!(err, DbError::MissingUri(_)));
    }

    #[tokio::test]
    async fn malformed_uri_fails_before_connecting() {
        let err = connect(&settings(Some("http://localhost:27017")))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Driver(_)));
    }

    #[tokio::test]
    async fn database_name_prefers_connection_string() {
        let client = Client::with_uri_str("mongodb://localhost:27017/library")
            .await
            .unwrap();
        let mut settings = settings(None);
        settings.name = Some("ignored".to_string());
        assert_eq!(select_database(&client, &settings).name(), "library");
    }

    #[tokio::test]
    async fn database_name_falls_back_to_settings_then_default() {
        let client = Client::with_uri_str("mongodb://localhost:27017")
            .await
            .unwrap();
        let mut named = settings(None);
        named.name = Some("catalogue".to_string());
        assert_eq!(select_database(&client, &named).name(), "catalogue");
        assert_eq!(
            select_database(&client, &settings(None)).name(),
            FALLBACK_DATABASE
        );
    }

    #[test_with::env(MONGODB)]
    #[tokio::test]
    async fn connects_to_live_server() {
        let uri = std::env::var("MONGODB").unwrap();
        let db = connect(&settings(Some(&uri))).await.unwrap();
        db.ping().await.unwrap();
        db.shutdown().await;
    }
}
