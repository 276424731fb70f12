use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::category::CategoryId;

/// A unique identifier for a product
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new() -> Self {
        ProductId(Uuid::new_v4().to_string())
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog item filed under exactly one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: f64,
    /// Units on hand
    pub stock: i64,
    pub category_id: CategoryId,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product in the given category
    pub fn new(name: String, price: f64, category_id: CategoryId) -> Self {
        Self {
            id: ProductId::new(),
            name,
            description: String::new(),
            price,
            stock: 0,
            category_id,
            created_at: Utc::now(),
        }
    }

    /// Sets the product's description
    pub fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    /// Sets the units on hand
    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_creation() {
        let category_id = CategoryId::new();
        let product = Product::new("Ryzen 7 7800X3D".to_string(), 449.0, category_id.clone())
            .with_description("8 cores".to_string())
            .with_stock(3);

        assert_eq!(product.category_id, category_id);
        assert_eq!(product.description, "8 cores");
        assert!(product.in_stock());
    }

    #[test]
    fn test_product_without_stock() {
        let product = Product::new("Core i9".to_string(), 589.0, CategoryId::new());
        assert!(!product.in_stock());
    }
}
