//! Interval bookkeeping for the category table.
//!
//! Every category owns the slots `lft` and `rgt`; a node's descendants are
//! exactly the rows whose bounds fall strictly inside its own. The helpers here
//! take a plain `&Connection` so they can run on a `Transaction` (which derefs
//! to one); callers are responsible for holding the write transaction.

use std::collections::HashSet;

use log::debug;
use rusqlite::{params, Connection, Row};

use crate::error::{CatalogError, CatalogResult};
use crate::models::category::Category;

pub(crate) const CATEGORY_COLUMNS: &str =
    "id, name, description, parent_id, lft, rgt, created_at, updated_at";

pub(crate) fn map_category(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        parent_id: row.get(3)?,
        left: row.get(4)?,
        right: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    Left,
    Right,
}

impl Bound {
    fn column(self) -> &'static str {
        match self {
            Bound::Left => "lft",
            Bound::Right => "rgt",
        }
    }
}

/// Adds `delta` to every `bound` satisfying `bound <op> pivot`.
///
/// The shifted values are first written negated and then flipped back, so the
/// UNIQUE index on the column never sees two rows holding the same value while
/// the multi-row UPDATE is in progress.
fn shift(
    conn: &Connection,
    bound: Bound,
    op: &str,
    pivot: i64,
    delta: i64,
) -> rusqlite::Result<usize> {
    let column = bound.column();
    let moved = conn.execute(
        &format!("UPDATE categories SET {column} = -({column} + ?1) WHERE {column} {op} ?2"),
        params![delta, pivot],
    )?;
    if moved > 0 {
        conn.execute(
            &format!("UPDATE categories SET {column} = -{column} WHERE {column} < 0"),
            [],
        )?;
    }
    Ok(moved)
}

/// Opens a two-slot gap just before `parent_right`, widening the parent, all of
/// its ancestors and everything to its right.
pub(crate) fn open_gap(conn: &Connection, parent_right: i64) -> rusqlite::Result<()> {
    let rights = shift(conn, Bound::Right, ">=", parent_right, 2)?;
    let lefts = shift(conn, Bound::Left, ">", parent_right, 2)?;
    debug!("Opened gap at {}: shifted {} right and {} left bounds", parent_right, rights, lefts);
    Ok(())
}

/// Closes the gap left behind by a removed subtree that ended at `right`.
pub(crate) fn close_gap(conn: &Connection, right: i64, width: i64) -> rusqlite::Result<()> {
    let lefts = shift(conn, Bound::Left, ">", right, -width)?;
    let rights = shift(conn, Bound::Right, ">", right, -width)?;
    debug!(
        "Closed gap of {} after {}: shifted {} left and {} right bounds",
        width, right, lefts, rights
    );
    Ok(())
}

/// Largest `rgt` in the table, 0 when empty.
pub(crate) fn max_right(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COALESCE(MAX(rgt), 0) FROM categories", [], |row| row.get(0))
}

/// Every category ascending by `lft`, which is preorder.
pub(crate) fn load_preorder(conn: &Connection) -> rusqlite::Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY lft"
    ))?;
    let categories = stmt
        .query_map([], map_category)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(categories)
}

/// Checks the whole table; used inside write transactions before commit.
pub(crate) fn verify_table(conn: &Connection) -> CatalogResult<()> {
    verify(&load_preorder(conn)?)
}

fn violation(message: String) -> CatalogError {
    CatalogError::InvariantViolation(message)
}

/// Validates a preorder (ascending `left`) listing of the full tree.
///
/// Fails on the first of: unordered input, `left >= right`, even `right - left`,
/// duplicate names, bounds that are not exactly `1..=2n`, partial overlap, a
/// `parent_id` that differs from the nearest enclosing node, or a width that
/// does not match the subtree size.
pub fn verify(categories: &[Category]) -> CatalogResult<()> {
    let mut bounds = Vec::with_capacity(categories.len() * 2);
    let mut names = HashSet::with_capacity(categories.len());

    for (index, category) in categories.iter().enumerate() {
        if index > 0 && categories[index - 1].left >= category.left {
            return Err(violation(format!(
                "'{}' is out of preorder (left {} after {})",
                category.name,
                category.left,
                categories[index - 1].left
            )));
        }
        if category.left >= category.right {
            return Err(violation(format!(
                "'{}' has left {} >= right {}",
                category.name, category.left, category.right
            )));
        }
        if (category.right - category.left) % 2 == 0 {
            return Err(violation(format!(
                "'{}' spans an even distance ({}..{})",
                category.name, category.left, category.right
            )));
        }
        if !names.insert(category.name.as_str()) {
            return Err(violation(format!("name '{}' is used twice", category.name)));
        }
        bounds.push(category.left);
        bounds.push(category.right);
    }

    bounds.sort_unstable();
    for (expected, actual) in (1..).zip(&bounds) {
        if *actual != expected {
            return Err(violation(format!(
                "bounds are not contiguous: expected {}, found {}",
                expected, actual
            )));
        }
    }

    verify_nesting(categories)?;
    verify_widths(categories)
}

/// Every interval sits wholly inside its nearest enclosing one, which must be
/// the node's recorded parent.
fn verify_nesting(categories: &[Category]) -> CatalogResult<()> {
    let mut open: Vec<&Category> = Vec::new();
    for category in categories {
        while open.last().is_some_and(|top| top.right < category.left) {
            open.pop();
        }

        match open.last() {
            Some(enclosing) => {
                if category.right > enclosing.right {
                    return Err(violation(format!(
                        "'{}' ({}..{}) overlaps '{}' ({}..{})",
                        category.name,
                        category.left,
                        category.right,
                        enclosing.name,
                        enclosing.left,
                        enclosing.right
                    )));
                }
                if category.parent_id.as_ref() != Some(&enclosing.id) {
                    return Err(violation(format!(
                        "'{}' is nested in '{}' but points at parent {:?}",
                        category.name, enclosing.name, category.parent_id
                    )));
                }
            }
            None if !category.is_root() => {
                return Err(violation(format!(
                    "'{}' references parent {:?} but is not nested in it",
                    category.name, category.parent_id
                )));
            }
            None => {}
        }

        open.push(category);
    }
    Ok(())
}

/// Width `2 * (subtree size)` for every node.
fn verify_widths(categories: &[Category]) -> CatalogResult<()> {
    let lefts: Vec<i64> = categories.iter().map(|c| c.left).collect();
    for (index, category) in categories.iter().enumerate() {
        // nodes from `index` up to the first left past our right form the subtree
        let subtree = (lefts.partition_point(|left| *left < category.right) - index) as i64;
        if category.width() != 2 * subtree {
            return Err(violation(format!(
                "'{}' has width {} but its subtree holds {} node(s)",
                category.name,
                category.width(),
                subtree
            )));
        }
    }
    Ok(())
}
