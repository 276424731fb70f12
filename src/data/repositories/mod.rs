mod category_repository;
mod product_repository;

pub use category_repository::SqliteCategoryRepository;
pub use product_repository::SqliteProductRepository;
