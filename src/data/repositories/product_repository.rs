use std::sync::Arc;

use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use crate::base::repository::ProductRepository;
use crate::data::database::ConnectionPool;
use crate::error::{CatalogError, CatalogResult};
use crate::models::category::{Category, CategoryId};
use crate::models::product::{Product, ProductId};

const PRODUCT_COLUMNS: &str =
    "p.id, p.name, p.description, p.price, p.stock, p.category_id, p.created_at";

/// Products filed anywhere inside the interval `left..=right`.
pub(crate) fn count_in_bounds(conn: &Connection, left: i64, right: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM products p
         JOIN categories c ON c.id = p.category_id
         WHERE c.lft >= ?1 AND c.rgt <= ?2",
        params![left, right],
        |row| row.get(0),
    )
}

pub struct SqliteProductRepository {
    connection_pool: Arc<ConnectionPool>,
}

impl SqliteProductRepository {
    pub fn new(connection_pool: Arc<ConnectionPool>) -> Self {
        Self { connection_pool }
    }

    fn map_row(row: &Row) -> rusqlite::Result<Product> {
        Ok(Product {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            price: row.get(3)?,
            stock: row.get(4)?,
            category_id: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn not_found(id: &ProductId) -> CatalogError {
        CatalogError::NotFound {
            entity: "product",
            id: id.to_string(),
        }
    }
}

impl ProductRepository for SqliteProductRepository {
    fn save_product(&self, product: &Product) -> CatalogResult<()> {
        let mut conn = self.connection_pool.get()?;
        // serialized against category deletes, which check for products first
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let category_exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1)",
            [&product.category_id],
            |row| row.get(0),
        )?;
        if !category_exists {
            return Err(CatalogError::category_not_found(&product.category_id));
        }

        tx.execute(
            "INSERT INTO products (
                id, name, description, price, stock, category_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                product.id,
                product.name,
                product.description,
                product.price,
                product.stock,
                product.category_id,
                product.created_at,
            ],
        )?;
        tx.commit()?;

        debug!("Saved product '{}' in category {}", product.name, product.category_id);
        Ok(())
    }

    fn get_product(&self, id: &ProductId) -> CatalogResult<Product> {
        let conn = self.connection_pool.get()?;
        conn.query_row(
            &format!("SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ?1"),
            [id],
            Self::map_row,
        )
        .optional()?
        .ok_or_else(|| Self::not_found(id))
    }

    fn get_all_products(&self) -> CatalogResult<Vec<Product>> {
        let conn = self.connection_pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p ORDER BY p.name"
        ))?;
        let products = stmt
            .query_map([], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(products)
    }

    fn get_products_by_category(
        &self,
        category_id: &CategoryId,
        include_descendants: bool,
    ) -> CatalogResult<Vec<Product>> {
        let conn = self.connection_pool.get()?;

        // the subtree variant is a single range join on the anchor's interval
        let sql = if include_descendants {
            format!(
                "SELECT {PRODUCT_COLUMNS} FROM products p
                 JOIN categories c ON c.id = p.category_id
                 JOIN categories anchor ON anchor.id = ?1
                 WHERE c.lft >= anchor.lft AND c.rgt <= anchor.rgt
                 ORDER BY c.lft, p.name"
            )
        } else {
            format!(
                "SELECT {PRODUCT_COLUMNS} FROM products p
                 WHERE p.category_id = ?1 ORDER BY p.name"
            )
        };

        let mut stmt = conn.prepare(&sql)?;
        let products = stmt
            .query_map([category_id], Self::map_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(products)
    }

    fn count_products_in_subtree(&self, category: &Category) -> CatalogResult<i64> {
        let conn = self.connection_pool.get()?;
        Ok(count_in_bounds(&conn, category.left, category.right)?)
    }

    fn delete_product(&self, id: &ProductId) -> CatalogResult<()> {
        let conn = self.connection_pool.get()?;
        let removed = conn.execute("DELETE FROM products WHERE id = ?1", [id])?;
        if removed == 0 {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::{insert, repositories, temp_database};

    #[test]
    fn test_save_requires_existing_category() {
        let (_dir, db) = temp_database();
        let (_, products) = repositories(&db);

        let product = Product::new("Core i7".to_string(), 399.0, CategoryId::new());
        let err = products.save_product(&product).unwrap_err();

        assert!(err.is_not_found());
        assert!(products.get_all_products().unwrap().is_empty());
    }

    #[test]
    fn test_products_by_category_and_subtree() {
        let (_dir, db) = temp_database();
        let (categories, products) = repositories(&db);

        let cpus = insert(&*categories, "CPUs", None).unwrap();
        let intel = insert(&*categories, "Intel", Some(&cpus)).unwrap();
        let amd = insert(&*categories, "AMD", Some(&cpus)).unwrap();
        let gpus = insert(&*categories, "GPUs", None).unwrap();

        let stocked = [
            ("Core i7", &intel),
            ("Ryzen 7", &amd),
            ("Ryzen 9", &amd),
            ("RTX 4070", &gpus),
        ];
        for (name, category) in stocked {
            products
                .save_product(&Product::new(name.to_string(), 100.0, category.id.clone()))
                .unwrap();
        }

        let direct = products.get_products_by_category(&cpus.id, false).unwrap();
        assert!(direct.is_empty());

        let subtree: Vec<String> = products
            .get_products_by_category(&cpus.id, true)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(subtree, vec!["Core i7", "Ryzen 7", "Ryzen 9"]);

        let cpus = categories.get_category_by_id(&cpus.id).unwrap();
        assert_eq!(products.count_products_in_subtree(&cpus).unwrap(), 3);
        let gpus = categories.get_category_by_id(&gpus.id).unwrap();
        assert_eq!(products.count_products_in_subtree(&gpus).unwrap(), 1);
    }

    #[test]
    fn test_delete_category_with_products_is_refused() {
        let (_dir, db) = temp_database();
        let (categories, products) = repositories(&db);

        let cpus = insert(&*categories, "CPUs", None).unwrap();
        let intel = insert(&*categories, "Intel", Some(&cpus)).unwrap();
        let product = Product::new("Core i5".to_string(), 199.0, intel.id.clone()).with_stock(4);
        products.save_product(&product).unwrap();

        let err = categories.delete_category(&cpus).unwrap_err();
        assert!(
            matches!(err, CatalogError::CategoryInUse { products: 1, .. }),
            "unexpected error: {err}"
        );
        assert_eq!(categories.count_categories().unwrap(), 2);

        products.delete_product(&product.id).unwrap();
        categories.delete_category(&cpus).unwrap();
        assert_eq!(categories.count_categories().unwrap(), 0);
    }

    #[test]
    fn test_get_and_delete_missing_product() {
        let (_dir, db) = temp_database();
        let (categories, products) = repositories(&db);

        let cpus = insert(&*categories, "CPUs", None).unwrap();
        let product = Product::new("Athlon".to_string(), 49.0, cpus.id.clone());
        products.save_product(&product).unwrap();

        let stored = products.get_product(&product.id).unwrap();
        assert_eq!(stored.name, "Athlon");
        assert_eq!(stored.category_id, cpus.id);

        products.delete_product(&product.id).unwrap();
        assert!(products.get_product(&product.id).unwrap_err().is_not_found());
        assert!(products.delete_product(&product.id).unwrap_err().is_not_found());
    }
}
