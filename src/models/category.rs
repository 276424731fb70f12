use uuid::Uuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub String);

impl CategoryId {
    pub fn new() -> Self {
        CategoryId(Uuid::new_v4().to_string())
    }
}

impl Default for CategoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node of the product category tree.
///
/// `left` and `right` are the node's nested-set bounds. They are owned by the
/// tree store and only change through structural inserts and deletes; callers
/// never set them directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: CategoryId,
    /// Category name, unique across the whole tree
    pub name: String,
    /// Category description
    pub description: String,
    /// Parent category ID, `None` for root categories
    pub parent_id: Option<CategoryId>,
    /// Opening bound of the node's interval
    pub left: i64,
    /// Closing bound of the node's interval
    pub right: i64,
    /// When the category was created
    pub created_at: DateTime<Utc>,
    /// When the category was last updated
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Number of bound slots the node and its subtree occupy.
    pub fn width(&self) -> i64 {
        self.right - self.left + 1
    }

    /// Number of strict descendants, derived from the interval alone.
    pub fn descendant_count(&self) -> i64 {
        (self.right - self.left - 1) / 2
    }

    pub fn is_leaf(&self) -> bool {
        self.right == self.left + 1
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// True when `other` lies strictly inside this node's interval.
    pub fn is_ancestor_of(&self, other: &Category) -> bool {
        self.left < other.left && other.right < self.right
    }

    pub fn is_descendant_of(&self, other: &Category) -> bool {
        other.is_ancestor_of(self)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Input for creating a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub parent_id: Option<CategoryId>,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parent_id: None,
        }
    }

    /// Places the new category as the last child of `parent_id`
    pub fn with_parent_id(mut self, parent_id: CategoryId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}
