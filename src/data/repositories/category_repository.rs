use std::sync::Arc;

use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Params, Transaction, TransactionBehavior};

use crate::base::repository::CategoryRepository;
use crate::data::database::ConnectionPool;
use crate::data::nested_set::{self, map_category, CATEGORY_COLUMNS};
use crate::data::repositories::product_repository;
use crate::error::{CatalogError, CatalogResult};
use crate::models::category::{Category, CategoryId, NewCategory};
use crate::utils;

/// Nested-set category store on SQLite.
///
/// Structural writes open `BEGIN IMMEDIATE` transactions, which take the
/// database write lock up front, so reading the current bounds and shifting
/// the neighbours can never interleave with another writer. Any error drops
/// the transaction before commit and rolls every shift back.
pub struct SqliteCategoryRepository {
    connection_pool: Arc<ConnectionPool>,
    verify_on_write: bool,
}

impl SqliteCategoryRepository {
    pub fn new(connection_pool: Arc<ConnectionPool>, verify_on_write: bool) -> Self {
        Self { connection_pool, verify_on_write }
    }

    fn fetch(conn: &Connection, id: &CategoryId) -> CatalogResult<Category> {
        conn.query_row(
            &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"),
            [id],
            map_category,
        )
        .optional()?
        .ok_or_else(|| CatalogError::category_not_found(id))
    }

    fn select<P: Params>(
        conn: &Connection,
        clause: &str,
        params: P,
    ) -> CatalogResult<Vec<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories {clause}");
        let mut stmt = conn.prepare(&sql)?;
        let categories = stmt
            .query_map(params, map_category)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    /// True if a category other than `except` already uses `name`.
    fn name_taken(
        conn: &Connection,
        name: &str,
        except: Option<&CategoryId>,
    ) -> rusqlite::Result<bool> {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE name = ?1 AND id IS NOT ?2)",
            params![name, except],
            |row| row.get(0),
        )
    }

    /// Optionally re-checks the tree, then commits.
    fn commit_structural(&self, tx: Transaction<'_>) -> CatalogResult<()> {
        if self.verify_on_write {
            nested_set::verify_table(&tx)?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl CategoryRepository for SqliteCategoryRepository {
    fn insert_category(&self, new: &NewCategory) -> CatalogResult<Category> {
        let mut conn = self.connection_pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if Self::name_taken(&tx, &new.name, None)? {
            return Err(CatalogError::name_taken(&new.name));
        }

        let (left, right) = match &new.parent_id {
            Some(parent_id) => {
                let parent = Self::fetch(&tx, parent_id)?;
                nested_set::open_gap(&tx, parent.right)?;
                (parent.right, parent.right + 1)
            }
            None => {
                let max_right = nested_set::max_right(&tx)?;
                (max_right + 1, max_right + 2)
            }
        };

        let now = utils::current_timestamp();
        let category = Category {
            id: CategoryId::new(),
            name: new.name.clone(),
            description: new.description.clone(),
            parent_id: new.parent_id.clone(),
            left,
            right,
            created_at: now,
            updated_at: now,
        };

        tx.execute(
            "INSERT INTO categories (
                id, name, description, parent_id, lft, rgt, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                category.id,
                category.name,
                category.description,
                category.parent_id,
                category.left,
                category.right,
                category.created_at,
                category.updated_at,
            ],
        )?;

        self.commit_structural(tx)?;
        info!("Created category '{}' at {}..{}", category.name, category.left, category.right);
        Ok(category)
    }

    fn delete_category(&self, category: &Category) -> CatalogResult<()> {
        let mut conn = self.connection_pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        // the caller's copy may predate other writes; only the stored bounds count
        let current = Self::fetch(&tx, &category.id)?;

        let products = product_repository::count_in_bounds(&tx, current.left, current.right)?;
        if products > 0 {
            return Err(CatalogError::CategoryInUse {
                id: current.id,
                products,
            });
        }

        let removed = tx.execute(
            "DELETE FROM categories WHERE lft >= ?1 AND rgt <= ?2",
            params![current.left, current.right],
        )?;
        nested_set::close_gap(&tx, current.right, current.width())?;

        self.commit_structural(tx)?;
        info!(
            "Deleted category '{}' and {} descendant(s)",
            current.name,
            removed.saturating_sub(1)
        );
        Ok(())
    }

    fn update_category(
        &self,
        id: &CategoryId,
        name: &str,
        description: &str,
    ) -> CatalogResult<Category> {
        let mut conn = self.connection_pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut category = Self::fetch(&tx, id)?;
        if Self::name_taken(&tx, name, Some(id))? {
            return Err(CatalogError::name_taken(name));
        }

        category.name = name.to_string();
        category.description = description.to_string();
        category.updated_at = utils::current_timestamp();

        tx.execute(
            "UPDATE categories SET name = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
            params![category.name, category.description, category.updated_at, category.id],
        )?;
        tx.commit()?;

        debug!("Updated category {} to '{}'", category.id, category.name);
        Ok(category)
    }

    fn get_category_by_id(&self, id: &CategoryId) -> CatalogResult<Category> {
        let conn = self.connection_pool.get()?;
        Self::fetch(&conn, id)
    }

    fn find_category_by_name(&self, name: &str) -> CatalogResult<Option<Category>> {
        let conn = self.connection_pool.get()?;
        let category = conn
            .query_row(
                &format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE name = ?1"),
                [name],
                map_category,
            )
            .optional()?;
        Ok(category)
    }

    fn get_all_categories(&self) -> CatalogResult<Vec<Category>> {
        let conn = self.connection_pool.get()?;
        Ok(nested_set::load_preorder(&conn)?)
    }

    fn get_root_categories(&self) -> CatalogResult<Vec<Category>> {
        let conn = self.connection_pool.get()?;
        Self::select(&conn, "WHERE parent_id IS NULL ORDER BY lft", params![])
    }

    fn get_child_categories(&self, parent_id: &CategoryId) -> CatalogResult<Vec<Category>> {
        let mut conn = self.connection_pool.get()?;
        // one snapshot for the existence check and the listing
        let tx = conn.transaction()?;
        Self::fetch(&tx, parent_id)?;
        let children = Self::select(&tx, "WHERE parent_id = ?1 ORDER BY lft", [parent_id])?;
        tx.commit()?;
        Ok(children)
    }

    fn get_descendants(&self, id: &CategoryId) -> CatalogResult<Vec<Category>> {
        let mut conn = self.connection_pool.get()?;
        let tx = conn.transaction()?;
        let anchor = Self::fetch(&tx, id)?;
        let descendants = Self::select(
            &tx,
            "WHERE lft > ?1 AND rgt < ?2 ORDER BY lft",
            params![anchor.left, anchor.right],
        )?;
        tx.commit()?;
        Ok(descendants)
    }

    fn get_ancestors(&self, id: &CategoryId) -> CatalogResult<Vec<Category>> {
        let mut conn = self.connection_pool.get()?;
        let tx = conn.transaction()?;
        let anchor = Self::fetch(&tx, id)?;
        let ancestors = Self::select(
            &tx,
            "WHERE lft < ?1 AND rgt > ?2 ORDER BY lft",
            params![anchor.left, anchor.right],
        )?;
        tx.commit()?;
        Ok(ancestors)
    }

    fn count_categories(&self) -> CatalogResult<i64> {
        let conn = self.connection_pool.get()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?)
    }

    fn verify_integrity(&self) -> CatalogResult<()> {
        let conn = self.connection_pool.get()?;
        nested_set::verify_table(&conn)
    }
}
