//! Database Module
//!
//! Embedded SurrealDB connection (RocksDB on disk, or in-memory) and schema setup.

pub mod models;
pub mod repository;

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

use crate::core::Config;
use crate::utils::AppError;

/// `DB_PATH` value selecting the in-memory engine
pub const MEMORY_DB: &str = "memory";

const SCHEMA: &str = r#"
    DEFINE INDEX IF NOT EXISTS store_due_close ON TABLE store FIELDS open_state, close_time;
    DEFINE INDEX IF NOT EXISTS store_due_open ON TABLE store FIELDS open_state, sale_start, is_auto;
"#;

/// Database service (owns the SurrealDB handle)
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open the database configured in `config` and apply the schema
    pub async fn new(config: &Config) -> Result<Self, AppError> {
        let db_path = config.db_path();
        let db = if db_path == MEMORY_DB {
            Surreal::new::<Mem>(())
                .await
                .map_err(|e| {
                    AppError::database(format!("Failed to open in-memory database: {e}"))
                })?
        } else {
            Surreal::new::<RocksDb>(db_path.as_str())
                .await
                .map_err(|e| {
                    AppError::database(format!("Failed to open database at {db_path}: {e}"))
                })?
        };

        Self::init(db, &config.db_namespace, &config.db_database).await
    }

    /// Select namespace/database and define indexes on an already opened handle
    pub async fn init(db: Surreal<Db>, namespace: &str, database: &str) -> Result<Self, AppError> {
        db.use_ns(namespace)
            .use_db(database)
            .await
            .map_err(|e| {
                AppError::database(format!("Failed to select {namespace}/{database}: {e}"))
            })?;

        db.query(SCHEMA)
            .await
            .and_then(|r| r.check())
            .map_err(|e| AppError::database(format!("Failed to apply schema: {e}")))?;

        tracing::info!(namespace, database, "Database connection established");
        Ok(Self { db })
    }
}
