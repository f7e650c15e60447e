//! Repository Module
//!
//! Query/update layer over the embedded SurrealDB document store.

pub mod store;

pub use store::StoreRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Store not found: {0}")]
    StoreNotFound(String),

    /// The document store could not serve the query or update
    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        RepoError::Unavailable(err.to_string())
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// ID Convention: 店铺 ID 即记录键
// =============================================================================
//
//   - 记录:   type::thing("store", $id)
//   - 读取:   SELECT *, record::id(id) AS store_id ...
//   - 对外只暴露纯键 (不含 "store:" 前缀)

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
