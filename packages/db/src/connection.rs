//! Global SurrealDB connection for the flag tables.

use std::sync::LazyLock;
use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use surrealdb::opt::auth::Root;
use thiserror::Error;
use tokio::sync::OnceCell;

static DB: LazyLock<OnceCell<Surreal<Any>>> = LazyLock::new(OnceCell::new);

/// Connection handle shared by every repository.
pub type Database = Surreal<Any>;

/// Where the flags live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// `mem://` or `rocksdb://<path>`
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    /// Root username and password, when the endpoint requires sign-in
    pub credentials: Option<(String, String)>,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            endpoint: "mem://".to_string(),
            namespace: "block".to_string(),
            database: "flags".to_string(),
            credentials: None,
        }
    }
}

impl DbConfig {
    /// In-memory flags, lost on exit.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Flags kept in a RocksDB directory (requires the `rocksdb` feature).
    pub fn rocksdb(path: impl Into<String>) -> Self {
        Self::default().with_endpoint(format!("rocksdb://{}", path.into()))
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }
}

/// Persistence errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database not initialized - call init_db first")]
    NotInitialized,
    #[error("Connection error: {0}")]
    Connection(#[from] surrealdb::Error),
    #[error("Query error: {0}")]
    Query(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Connect to the configured database.
///
/// Only the first call connects; later calls return that connection and
/// ignore their config.
pub async fn init_db(config: DbConfig) -> Result<&'static Database, DbError> {
    DB.get_or_try_init(|| async {
        tracing::info!("Connecting to flag database at {}", config.endpoint);

        let db = connect(&config.endpoint).await?;

        if let Some((username, password)) = &config.credentials {
            db.signin(Root { username, password }).await?;
        }

        db.use_ns(&config.namespace).use_db(&config.database).await?;

        tracing::info!(
            "Using flag database {}/{}",
            config.namespace,
            config.database
        );

        Ok(db)
    })
    .await
}

/// The connection made by [`init_db`].
pub fn get_db() -> Result<&'static Database, DbError> {
    DB.get().ok_or(DbError::NotInitialized)
}
