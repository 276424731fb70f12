pub mod database;
pub mod migration;
pub mod nested_set;
pub mod repositories;
mod types;

pub use database::{ConnectionPool, Database};
pub use migration::MigrationManager;
pub use repositories::{SqliteCategoryRepository, SqliteProductRepository};
