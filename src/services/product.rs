use std::sync::Arc;

use crate::base::repository::{CategoryRepository, ProductRepository};
use crate::error::CatalogResult;
use crate::models::category::CategoryId;
use crate::models::product::{Product, ProductId};

/// Catalog operations that resolve products against the category tree.
#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductRepository>,
    categories: Arc<dyn CategoryRepository>,
}

impl ProductService {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        categories: Arc<dyn CategoryRepository>,
    ) -> Self {
        Self { products, categories }
    }

    pub fn add_product(
        &self,
        name: &str,
        description: &str,
        price: f64,
        stock: i64,
        category_id: &CategoryId,
    ) -> CatalogResult<Product> {
        self.categories.get_category_by_id(category_id)?;

        let product = Product::new(name.to_string(), price, category_id.clone())
            .with_description(description.to_string())
            .with_stock(stock);
        self.products.save_product(&product)?;
        Ok(product)
    }

    pub fn get_product(&self, id: &ProductId) -> CatalogResult<Product> {
        self.products.get_product(id)
    }

    pub fn list_products(&self) -> CatalogResult<Vec<Product>> {
        self.products.get_all_products()
    }

    /// Products of a category, optionally including every subcategory.
    pub fn products_in_category(
        &self,
        category_id: &CategoryId,
        include_subcategories: bool,
    ) -> CatalogResult<Vec<Product>> {
        self.categories.get_category_by_id(category_id)?;
        self.products.get_products_by_category(category_id, include_subcategories)
    }

    pub fn remove_product(&self, id: &ProductId) -> CatalogResult<()> {
        self.products.delete_product(id)
    }
}
