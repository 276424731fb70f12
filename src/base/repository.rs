use crate::error::CatalogResult;
use crate::models::{
    category::{Category, CategoryId, NewCategory},
    product::{Product, ProductId},
};

/// Storage for the category tree.
///
/// Implementations keep the nested-set bounds consistent: `insert_category`
/// and `delete_category` each run as one atomic, write-serialized unit, and
/// nothing else ever touches `left`, `right` or `parent_id`.
pub trait CategoryRepository: Send + Sync {
    /// Inserts a root category, or the last child of `parent_id`.
    fn insert_category(&self, new: &NewCategory) -> CatalogResult<Category>;

    /// Removes the category together with its whole subtree and closes the gap.
    fn delete_category(&self, category: &Category) -> CatalogResult<()>;

    /// Changes name and description only.
    fn update_category(
        &self,
        id: &CategoryId,
        name: &str,
        description: &str,
    ) -> CatalogResult<Category>;

    fn get_category_by_id(&self, id: &CategoryId) -> CatalogResult<Category>;

    fn find_category_by_name(&self, name: &str) -> CatalogResult<Option<Category>>;

    /// All categories in preorder (ascending `left`).
    fn get_all_categories(&self) -> CatalogResult<Vec<Category>>;

    fn get_root_categories(&self) -> CatalogResult<Vec<Category>>;

    fn get_child_categories(&self, parent_id: &CategoryId) -> CatalogResult<Vec<Category>>;

    /// Strict descendants in preorder.
    fn get_descendants(&self, id: &CategoryId) -> CatalogResult<Vec<Category>>;

    /// Strict ancestors, outermost first.
    fn get_ancestors(&self, id: &CategoryId) -> CatalogResult<Vec<Category>>;

    fn count_categories(&self) -> CatalogResult<i64>;

    /// Runs the full invariant check over the stored tree.
    fn verify_integrity(&self) -> CatalogResult<()>;
}

pub trait ProductRepository: Send + Sync {
    fn save_product(&self, product: &Product) -> CatalogResult<()>;
    fn get_product(&self, id: &ProductId) -> CatalogResult<Product>;
    fn get_all_products(&self) -> CatalogResult<Vec<Product>>;
    /// Products filed directly under the category, or anywhere in its subtree.
    fn get_products_by_category(
        &self,
        category_id: &CategoryId,
        include_descendants: bool,
    ) -> CatalogResult<Vec<Product>>;
    fn count_products_in_subtree(&self, category: &Category) -> CatalogResult<i64>;
    fn delete_product(&self, id: &ProductId) -> CatalogResult<()>;
}
