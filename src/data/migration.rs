use anyhow::{Result, Context};
use log::{info, debug};
use rusqlite::Connection;

/// Ordered schema migrations; each runs once and is recorded by name.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "create_categories",
        "CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            parent_id TEXT REFERENCES categories(id),
            lft INTEGER NOT NULL UNIQUE,
            rgt INTEGER NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_categories_parent ON categories(parent_id);",
    ),
    (
        "create_products",
        "CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            price REAL NOT NULL,
            stock INTEGER NOT NULL DEFAULT 0,
            category_id TEXT NOT NULL REFERENCES categories(id),
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_products_category ON products(category_id);",
    ),
];

/// Database migration manager that handles schema updates
pub struct MigrationManager<'a> {
    connection: &'a Connection,
}

impl<'a> MigrationManager<'a> {
    /// Creates a new migration manager
    pub fn new(connection: &'a Connection) -> Self {
        Self { connection }
    }

    /// Run all pending migrations, returning how many were applied
    pub fn run_migrations(&self) -> Result<usize> {
        info!("Running database migrations");

        self.create_migrations_table()?;

        let mut applied = 0;
        for (name, sql) in MIGRATIONS {
            if self.is_migration_applied(name)? {
                debug!("Migration '{}' already recorded as applied, skipping", name);
                continue;
            }

            info!("Running migration: {}", name);
            // schema change and its record commit together
            let tx = self.connection.unchecked_transaction()
                .context("Failed to begin migration transaction")?;
            tx.execute_batch(sql)
                .with_context(|| format!("Migration '{}' failed", name))?;
            Self::record_migration(&tx, name)?;
            tx.commit().with_context(|| format!("Failed to commit migration '{}'", name))?;
            applied += 1;
        }

        info!("Database migrations completed successfully ({} applied)", applied);
        Ok(applied)
    }

    /// Creates the migrations table to track which migrations have been applied
    fn create_migrations_table(&self) -> Result<()> {
        debug!("Creating migrations table if it doesn't exist");

        self.connection.execute(
            "CREATE TABLE IF NOT EXISTS migrations (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                applied_at TEXT NOT NULL
            )",
            [],
        ).context("Failed to create migrations table")?;

        Ok(())
    }

    /// Checks if a migration has been applied
    fn is_migration_applied(&self, name: &str) -> Result<bool> {
        let count: i64 = self.connection
            .query_row(
                "SELECT COUNT(*) FROM migrations WHERE name = ?",
                [name],
                |row| row.get(0),
            )
            .context("Failed to check if migration has been applied")?;

        Ok(count > 0)
    }

    /// Records that a migration has been applied
    fn record_migration(connection: &Connection, name: &str) -> Result<()> {
        debug!("Recording migration '{}' as applied", name);

        connection
            .execute(
                "INSERT INTO migrations (name, applied_at) VALUES (?, datetime('now'))",
                [name],
            )
            .context("Failed to record migration")?;

        Ok(())
    }
}
