//! Errors surfaced by the catalog store and services.

use thiserror::Error;

use crate::models::category::CategoryId;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("category {id} is still referenced by {products} product(s)")]
    CategoryInUse { id: CategoryId, products: i64 },

    /// Never expected in a healthy store; the transaction that detects it is rolled back.
    #[error("nested-set invariant violated: {0}")]
    InvariantViolation(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn category_not_found(id: &CategoryId) -> Self {
        Self::NotFound {
            entity: "category",
            id: id.to_string(),
        }
    }

    pub fn name_taken(name: &str) -> Self {
        Self::Conflict(format!("category with name '{}' already exists", name))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
