pub mod category;
pub mod product;
pub mod tree;

pub use category::{Category, CategoryId, NewCategory};
pub use product::{Product, ProductId};
pub use tree::CategoryNode;
