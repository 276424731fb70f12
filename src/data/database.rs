use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;

use crate::base::{CategoryRepository, ProductRepository};
use crate::config::Settings;
use crate::data::migration::MigrationManager;
use crate::data::repositories::{SqliteCategoryRepository, SqliteProductRepository};
use crate::utils;

pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Handle to the catalog database; hands out repositories sharing one pool.
pub struct Database {
    pool: Arc<ConnectionPool>,
    verify_on_write: bool,
}

impl Database {
    /// Opens (creating if needed) the database file and brings the schema up to date.
    pub fn open(settings: &Settings) -> Result<Self> {
        let db_path = &settings.database.path;
        utils::ensure_directory_exists(db_path)?;

        let busy_timeout = Duration::from_millis(settings.database.busy_timeout_ms);
        let manager = SqliteConnectionManager::file(db_path)
            .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE)
            .with_init(move |conn| {
                conn.busy_timeout(busy_timeout)?;
                conn.execute_batch("PRAGMA foreign_keys = ON;")
            });

        let pool = Pool::builder()
            .max_size(settings.database.pool_size)
            .build(manager)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

        {
            let conn = pool.get().context("Failed to get a connection for migrations")?;
            MigrationManager::new(&conn).run_migrations()?;
        }

        info!("Opened catalog database at {}", db_path.display());
        Ok(Self {
            pool: Arc::new(pool),
            verify_on_write: settings.catalog.verify_on_write,
        })
    }

    pub fn pool(&self) -> Arc<ConnectionPool> {
        self.pool.clone()
    }

    pub fn category_repository(&self) -> Arc<dyn CategoryRepository> {
        Arc::new(SqliteCategoryRepository::new(self.pool.clone(), self.verify_on_write))
    }

    pub fn product_repository(&self) -> Arc<dyn ProductRepository> {
        Arc::new(SqliteProductRepository::new(self.pool.clone()))
    }
}
