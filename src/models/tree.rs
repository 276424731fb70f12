use serde::{Deserialize, Serialize};

use crate::models::category::Category;

/// A category together with its children, for callers that want a nested view.
///
/// Built from the flat preorder listing; storage never holds this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub category: Category,
    /// Zero for roots
    pub depth: usize,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    fn leaf(category: Category, depth: usize) -> Self {
        Self {
            category,
            depth,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(CategoryNode::size).sum::<usize>()
    }
}

/// Assembles the nested forest from categories in any order.
///
/// Sorting by `left` yields preorder, so a single pass with a stack of open
/// intervals is enough: a node is closed once the next node starts past its
/// `right` bound.
pub fn build_forest(mut categories: Vec<Category>) -> Vec<CategoryNode> {
    categories.sort_by_key(|c| c.left);

    let mut roots = Vec::new();
    let mut open: Vec<CategoryNode> = Vec::new();

    for category in categories {
        close_nodes(&mut open, &mut roots, Some(category.left));
        let depth = open.len();
        open.push(CategoryNode::leaf(category, depth));
    }
    close_nodes(&mut open, &mut roots, None);

    roots
}

fn close_nodes(
    open: &mut Vec<CategoryNode>,
    roots: &mut Vec<CategoryNode>,
    next_left: Option<i64>,
) {
    while let Some(top) = open.last() {
        if let Some(left) = next_left {
            if top.category.right > left {
                break;
            }
        }
        let Some(done) = open.pop() else { break };
        match open.last_mut() {
            Some(parent) => parent.children.push(done),
            None => roots.push(done),
        }
    }
}

/// Preorder listing annotated with each category's depth.
pub fn outline(categories: &[Category]) -> Vec<(usize, &Category)> {
    let mut ordered: Vec<&Category> = categories.iter().collect();
    ordered.sort_by_key(|c| c.left);

    let mut open_rights: Vec<i64> = Vec::new();
    let mut lines = Vec::with_capacity(ordered.len());
    for category in ordered {
        while open_rights.last().is_some_and(|right| *right < category.left) {
            open_rights.pop();
        }
        lines.push((open_rights.len(), category));
        open_rights.push(category.right);
    }
    lines
}

/// Renders the outline as indented text, two spaces per level.
pub fn render_outline(categories: &[Category]) -> String {
    outline(categories)
        .into_iter()
        .map(|(depth, category)| format!("{}{}\n", "  ".repeat(depth), category.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::category::CategoryId;
    use chrono::Utc;

    fn node(name: &str, left: i64, right: i64, parent: Option<&Category>) -> Category {
        let now = Utc::now();
        Category {
            id: CategoryId::new(),
            name: name.to_string(),
            description: "-".to_string(),
            parent_id: parent.map(|p| p.id.clone()),
            left,
            right,
            created_at: now,
            updated_at: now,
        }
    }

    // CPUs(1,6) [Intel(2,3), AMD(4,5)], GPUs(7,10) [NVIDIA(8,9)]
    fn sample() -> Vec<Category> {
        let cpus = node("CPUs", 1, 6, None);
        let intel = node("Intel", 2, 3, Some(&cpus));
        let amd = node("AMD", 4, 5, Some(&cpus));
        let gpus = node("GPUs", 7, 10, None);
        let nvidia = node("NVIDIA", 8, 9, Some(&gpus));
        vec![nvidia, amd, gpus, intel, cpus]
    }

    #[test]
    fn test_build_forest_nests_by_interval() {
        let forest = build_forest(sample());

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].category.name, "CPUs");
        assert_eq!(forest[0].size(), 3);
        let children: Vec<&str> = forest[0]
            .children
            .iter()
            .map(|n| n.category.name.as_str())
            .collect();
        assert_eq!(children, vec!["Intel", "AMD"]);
        assert_eq!(forest[0].children[1].depth, 1);

        assert_eq!(forest[1].category.name, "GPUs");
        assert_eq!(forest[1].children[0].category.name, "NVIDIA");
    }

    #[test]
    fn test_build_forest_empty() {
        assert!(build_forest(Vec::new()).is_empty());
    }

    #[test]
    fn test_outline_depths() {
        let categories = sample();
        let lines: Vec<(usize, &str)> = outline(&categories)
            .into_iter()
            .map(|(depth, c)| (depth, c.name.as_str()))
            .collect();

        assert_eq!(
            lines,
            vec![(0, "CPUs"), (1, "Intel"), (1, "AMD"), (0, "GPUs"), (1, "NVIDIA")]
        );
    }

    #[test]
    fn test_render_outline() {
        let text = render_outline(&sample());
        assert_eq!(text, "CPUs\n  Intel\n  AMD\nGPUs\n  NVIDIA\n");
    }
}
