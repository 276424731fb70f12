//! Shared fixtures for store tests.

use std::sync::Arc;

use tempfile::TempDir;

use crate::base::{CategoryRepository, ProductRepository};
use crate::config::Settings;
use crate::data::Database;
use crate::error::CatalogResult;
use crate::models::{Category, CategoryId, NewCategory};

/// Database backed by a file in a fresh temporary directory.
///
/// Keep the `TempDir` alive for as long as the database is used.
pub(crate) fn temp_database() -> (TempDir, Database) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut settings = Settings::default();
    settings.database.path = dir.path().join("catalog.db");
    settings.database.busy_timeout_ms = 30_000;
    let database = Database::open(&settings).expect("open database");
    (dir, database)
}

pub(crate) fn repositories(
    database: &Database,
) -> (Arc<dyn CategoryRepository>, Arc<dyn ProductRepository>) {
    (database.category_repository(), database.product_repository())
}

pub(crate) fn insert(
    repository: &dyn CategoryRepository,
    name: &str,
    parent: Option<&Category>,
) -> CatalogResult<Category> {
    let mut new = NewCategory::new(name, "-");
    if let Some(parent) = parent {
        new = new.with_parent_id(parent.id.clone());
    }
    repository.insert_category(&new)
}

/// `(name, left, right)` for every category, in preorder.
pub(crate) fn bounds(repository: &dyn CategoryRepository) -> Vec<(String, i64, i64)> {
    repository
        .get_all_categories()
        .expect("list categories")
        .into_iter()
        .map(|c| (c.name, c.left, c.right))
        .collect()
}

/// Refetches a category so its bounds reflect later writes.
pub(crate) fn reload(repository: &dyn CategoryRepository, id: &CategoryId) -> Category {
    repository.get_category_by_id(id).expect("reload category")
}
