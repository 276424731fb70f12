use std::sync::Arc;

use log::{info, warn};

use crate::base::repository::CategoryRepository;
use crate::error::{CatalogError, CatalogResult};
use crate::models::category::{Category, CategoryId, NewCategory};
use crate::models::tree::{self, CategoryNode};

/// Category administration: validates requests before they reach the tree store.
#[derive(Clone)]
pub struct CategoryService {
    repository: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repository: Arc<dyn CategoryRepository>) -> Self {
        Self { repository }
    }

    /// Creates a root category, or the last child of `parent_id`.
    ///
    /// Rejects a name used anywhere in the tree and an unknown parent before
    /// any bounds are touched.
    pub fn create_category(
        &self,
        name: &str,
        description: &str,
        parent_id: Option<&CategoryId>,
    ) -> CatalogResult<Category> {
        if self.repository.find_category_by_name(name)?.is_some() {
            warn!("Refusing to create duplicate category '{}'", name);
            return Err(CatalogError::name_taken(name));
        }

        let mut new = NewCategory::new(name, description);
        if let Some(parent_id) = parent_id {
            self.repository.get_category_by_id(parent_id)?;
            new = new.with_parent_id(parent_id.clone());
        }

        self.repository.insert_category(&new)
    }

    pub fn get_category(&self, id: &CategoryId) -> CatalogResult<Category> {
        self.repository.get_category_by_id(id)
    }

    /// Every category in preorder.
    pub fn list_categories(&self) -> CatalogResult<Vec<Category>> {
        self.repository.get_all_categories()
    }

    /// Renames a category and replaces its description. The tree shape never
    /// changes here; moving a branch to another parent is not supported.
    pub fn update_category(
        &self,
        id: &CategoryId,
        name: &str,
        description: &str,
    ) -> CatalogResult<Category> {
        let current = self.repository.get_category_by_id(id)?;
        if current.name != name {
            if let Some(existing) = self.repository.find_category_by_name(name)? {
                if existing.id != current.id {
                    return Err(CatalogError::name_taken(name));
                }
            }
        }
        self.repository.update_category(id, name, description)
    }

    /// Deletes the category and its whole subtree.
    pub fn delete_category(&self, id: &CategoryId) -> CatalogResult<()> {
        let category = self.repository.get_category_by_id(id)?;
        self.repository.delete_category(&category)?;
        info!("Category '{}' removed", category.name);
        Ok(())
    }

    pub fn root_categories(&self) -> CatalogResult<Vec<Category>> {
        self.repository.get_root_categories()
    }

    pub fn subcategories(&self, id: &CategoryId) -> CatalogResult<Vec<Category>> {
        self.repository.get_child_categories(id)
    }

    /// Path from the outermost ancestor down to the category itself.
    pub fn breadcrumbs(&self, id: &CategoryId) -> CatalogResult<Vec<Category>> {
        let category = self.repository.get_category_by_id(id)?;
        let mut path = self.repository.get_ancestors(id)?;
        path.push(category);
        Ok(path)
    }

    pub fn category_tree(&self) -> CatalogResult<Vec<CategoryNode>> {
        Ok(tree::build_forest(self.repository.get_all_categories()?))
    }

    /// The nested forest as pretty-printed JSON, for export to other tools.
    pub fn export_tree_json(&self) -> CatalogResult<String> {
        Ok(serde_json::to_string_pretty(&self.category_tree()?)?)
    }

    /// Indented text listing of the whole tree.
    pub fn outline(&self) -> CatalogResult<String> {
        let categories = self.repository.get_all_categories()?;
        Ok(tree::render_outline(&categories))
    }

    pub fn is_empty(&self) -> CatalogResult<bool> {
        Ok(self.repository.count_categories()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::{bounds, repositories, temp_database};

    fn service() -> (tempfile::TempDir, CategoryService) {
        let (dir, db) = temp_database();
        let (categories, _) = repositories(&db);
        (dir, CategoryService::new(categories))
    }

    #[test]
    fn test_create_guards_name_and_parent() {
        let (_dir, service) = service();
        let cpus = service.create_category("CPUs", "-", None).unwrap();
        let before = bounds(&*service.repository);

        let err = service.create_category("CPUs", "again", None).unwrap_err();
        assert!(err.is_conflict());

        let err = service.create_category("Intel", "-", Some(&CategoryId::new())).unwrap_err();
        assert!(err.is_not_found());

        assert_eq!(bounds(&*service.repository), before);

        let intel = service.create_category("Intel", "-", Some(&cpus.id)).unwrap();
        assert_eq!((intel.left, intel.right), (2, 3));
    }

    #[test]
    fn test_update_and_delete() {
        let (_dir, service) = service();
        let cpus = service.create_category("CPUs", "-", None).unwrap();
        service.create_category("GPUs", "-", None).unwrap();

        assert!(service.update_category(&cpus.id, "GPUs", "-").unwrap_err().is_conflict());
        let renamed = service.update_category(&cpus.id, "Processors", "all CPUs").unwrap();
        assert_eq!(renamed.name, "Processors");

        service.delete_category(&cpus.id).unwrap();
        assert!(service.get_category(&cpus.id).unwrap_err().is_not_found());
        assert!(service.delete_category(&cpus.id).unwrap_err().is_not_found());

        let remaining = service.list_categories().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!((remaining[0].left, remaining[0].right), (1, 2));
    }

    #[test]
    fn test_breadcrumbs_and_tree() {
        let (_dir, service) = service();
        let components = service.create_category("Components", "-", None).unwrap();
        let storage = service.create_category("Storage", "-", Some(&components.id)).unwrap();
        let ssd = service.create_category("SSD", "-", Some(&storage.id)).unwrap();
        service.create_category("HDD", "-", Some(&storage.id)).unwrap();
        service.create_category("Peripherals", "-", None).unwrap();

        let path: Vec<String> = service
            .breadcrumbs(&ssd.id)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(path, vec!["Components", "Storage", "SSD"]);

        let subcategories: Vec<String> = service
            .subcategories(&storage.id)
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(subcategories, vec!["SSD", "HDD"]);

        let forest = service.category_tree().unwrap();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].size(), 4);
        assert_eq!(forest[0].children[0].children[1].category.name, "HDD");
        assert_eq!(forest[0].children[0].children[1].depth, 2);

        assert_eq!(
            service.outline().unwrap(),
            "Components\n  Storage\n    SSD\n    HDD\nPeripherals\n"
        );
        assert_eq!(service.root_categories().unwrap().len(), 2);
        assert!(!service.is_empty().unwrap());
    }

    #[test]
    fn test_export_tree_json_keeps_nesting() {
        let (_dir, service) = service();
        let memory = service.create_category("Memory", "-", None).unwrap();
        let ddr4 = service.create_category("DDR4", "-", Some(&memory.id)).unwrap();
        service.create_category("DDR5", "-", Some(&memory.id)).unwrap();
        service.create_category("SODIMM", "-", Some(&ddr4.id)).unwrap();
        service.create_category("Monitors", "-", None).unwrap();

        let json = service.export_tree_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["category"]["name"], "Memory");
        assert_eq!(value[0]["children"][0]["children"][0]["category"]["name"], "SODIMM");
        assert_eq!(value[0]["children"][0]["children"][0]["depth"], 2);
        assert_eq!(value[1]["children"].as_array().unwrap().len(), 0);

        let restored: Vec<CategoryNode> = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, service.category_tree().unwrap());
    }

    #[test]
    fn test_export_tree_json_of_empty_store() {
        let (_dir, service) = service();
        assert_eq!(service.export_tree_json().unwrap(), "[]");
    }
}
