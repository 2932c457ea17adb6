//! Sibling rank allocation and move planning.
//!
//! Ranks (`display_order`) form a dense `0..n` sequence inside every
//! `(wiki_id, parent_id)` group. New pages are appended; a move rewrites the
//! whole target group and, when the parent changes, compacts the group the
//! page left.

use crate::error::CoreError;
use crate::page_tree::PageTree;
use crate::types::DbId;

/// Rank for a page appended to a group that currently holds `sibling_count`
/// pages.
pub fn append_position(sibling_count: i64) -> Result<i32, CoreError> {
    i32::try_from(sibling_count)
        .map_err(|_| CoreError::Internal(format!("Sibling count {sibling_count} exceeds rank range")))
}

/// A rank rewrite for a page that is not itself being moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankChange {
    pub page_id: DbId,
    pub display_order: i32,
}

/// The writes that relocate one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    pub page_id: DbId,
    pub parent_id: Option<DbId>,
    pub display_order: i32,
    /// Other pages whose rank changes; pages already at their new rank are
    /// omitted.
    pub rank_changes: Vec<RankChange>,
}

/// Plan moving `page_id` under `target` (`None` = root) at `index`.
///
/// `index` counts the target's current children excluding the moving page,
/// so `0..=n` is valid where `n` is that count; anything else is
/// `InvalidParam("index")`. The cycle guard must already have accepted the
/// target.
pub fn plan_move(
    tree: &PageTree,
    page_id: DbId,
    target: Option<DbId>,
    index: i64,
) -> Result<MovePlan, CoreError> {
    let moving = tree.get(page_id).ok_or(CoreError::NotFound {
        entity: "WikiPage",
        id: page_id,
    })?;

    let mut group: Vec<DbId> = tree
        .children(target)
        .filter(|p| p.id != page_id)
        .map(|p| p.id)
        .collect();
    let index = usize::try_from(index)
        .ok()
        .filter(|&i| i <= group.len())
        .ok_or_else(|| CoreError::invalid_param("index"))?;
    group.insert(index, page_id);

    let mut rank_changes = Vec::new();
    collect_rank_changes(tree, group.iter().copied(), page_id, &mut rank_changes)?;

    if moving.parent_id != target {
        let left_behind = tree
            .children(moving.parent_id)
            .filter(|p| p.id != page_id)
            .map(|p| p.id);
        collect_rank_changes(tree, left_behind, page_id, &mut rank_changes)?;
    }

    Ok(MovePlan {
        page_id,
        parent_id: target,
        display_order: to_rank(index)?,
        rank_changes,
    })
}

/// Rank every page of `group` by position, recording the ones that differ
/// from their current rank.
fn collect_rank_changes(
    tree: &PageTree,
    group: impl Iterator<Item = DbId>,
    moving_id: DbId,
    out: &mut Vec<RankChange>,
) -> Result<(), CoreError> {
    for (position, id) in group.enumerate() {
        if id == moving_id {
            continue;
        }
        let rank = to_rank(position)?;
        if tree.get(id).map(|p| p.display_order) != Some(rank) {
            out.push(RankChange {
                page_id: id,
                display_order: rank,
            });
        }
    }
    Ok(())
}

fn to_rank(position: usize) -> Result<i32, CoreError> {
    i32::try_from(position)
        .map_err(|_| CoreError::Internal(format!("Position {position} exceeds rank range")))
}
