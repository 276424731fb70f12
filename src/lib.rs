pub mod base;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

// Re-export repository traits
pub use base::repository::{CategoryRepository, ProductRepository};

pub use config::Settings;
pub use data::Database;
pub use error::{CatalogError, CatalogResult};

// Re-export models
pub use models::{
    category::{Category, CategoryId, NewCategory},
    product::{Product, ProductId},
    tree::CategoryNode,
};

pub use services::{CategoryService, ProductService};
