pub mod category;
pub mod product;

pub use category::CategoryService;
pub use product::ProductService;
