//! Page hierarchy construction and ancestor-cycle checks.
//!
//! [`PageTree`] is an arena over one wiki's pages plus a parent -> children
//! index built once per query. It is immutable after construction, so a single
//! snapshot can back the forest view, the flat id lookup, the cycle guard, and
//! the reorder engine without any of them observing a different state.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::models::{WikiPage, WikiPageNode};
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// An indexed snapshot of every page in one wiki.
#[derive(Debug, Clone)]
pub struct PageTree {
    pages: Vec<WikiPage>,
    index: HashMap<DbId, usize>,
    /// Child slots per parent (`None` = root), sorted by `display_order`.
    children: HashMap<Option<DbId>, Vec<usize>>,
}

impl PageTree {
    /// Index a flat page list.
    ///
    /// Children are ordered by `display_order`; the sort is stable, so equal
    /// ranks keep their input order.
    pub fn new(pages: Vec<WikiPage>) -> Self {
        let index = pages
            .iter()
            .enumerate()
            .map(|(slot, page)| (page.id, slot))
            .collect();

        let mut children: HashMap<Option<DbId>, Vec<usize>> = HashMap::new();
        for (slot, page) in pages.iter().enumerate() {
            children.entry(page.parent_id).or_default().push(slot);
        }
        for slots in children.values_mut() {
            slots.sort_by_key(|&slot| pages[slot].display_order);
        }

        Self {
            pages,
            index,
            children,
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Look up a page by id.
    pub fn get(&self, id: DbId) -> Option<&WikiPage> {
        self.index.get(&id).map(|&slot| &self.pages[slot])
    }

    /// Children of `parent` (`None` = root) in rank order.
    pub fn children(&self, parent: Option<DbId>) -> impl Iterator<Item = &WikiPage> + '_ {
        self.children
            .get(&parent)
            .into_iter()
            .flatten()
            .map(|&slot| &self.pages[slot])
    }

    /// Flat `id -> page` view of the snapshot.
    pub fn into_page_map(self) -> HashMap<DbId, WikiPage> {
        self.pages.into_iter().map(|page| (page.id, page)).collect()
    }

    /// Build the ordered forest hanging off the root.
    ///
    /// Each page is moved out of its slot when attached, so no page appears
    /// twice and the walk terminates even over corrupt parent links. Pages
    /// that cannot be reached from the root (dangling parent, cycle) are left
    /// out.
    pub fn into_forest(self) -> Vec<WikiPageNode> {
        let mut slots: Vec<Option<WikiPage>> = self.pages.into_iter().map(Some).collect();
        let forest = attach_children(None, &self.children, &mut slots);

        let unreachable = slots.iter().filter(|slot| slot.is_some()).count();
        if unreachable > 0 {
            tracing::warn!(unreachable, "Pages unreachable from the wiki root were left out of the tree");
        }
        forest
    }

    /// Scan the snapshot for violations of the hierarchy invariants.
    pub fn integrity_issues(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();

        for (parent, slots) in &self.children {
            for (expected, &slot) in slots.iter().enumerate() {
                let page = &self.pages[slot];
                if usize::try_from(page.display_order).ok() != Some(expected) {
                    issues.push(IntegrityIssue::RankOutOfSequence {
                        parent_id: *parent,
                        page_id: page.id,
                        display_order: page.display_order,
                        expected,
                    });
                }
            }
        }

        for page in &self.pages {
            let Some(parent_id) = page.parent_id else {
                continue;
            };
            match self.get(parent_id) {
                None => issues.push(IntegrityIssue::MissingParent { page_id: page.id }),
                Some(parent) if parent.wiki_id != page.wiki_id => {
                    issues.push(IntegrityIssue::ForeignParent { page_id: page.id })
                }
                Some(_) => {}
            }
            if self.chain_end(page.id) == ChainEnd::Cycle {
                issues.push(IntegrityIssue::Cycle { page_id: page.id });
            }
        }

        issues
    }

    /// Follow parent links from `id` for at most `len()` steps.
    fn chain_end(&self, id: DbId) -> ChainEnd {
        let mut current = self.get(id);
        for _ in 0..=self.pages.len() {
            let Some(page) = current else {
                return ChainEnd::Dangling;
            };
            match page.parent_id {
                None => return ChainEnd::Root,
                Some(parent_id) => current = self.get(parent_id),
            }
        }
        ChainEnd::Cycle
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ChainEnd {
    Root,
    Dangling,
    Cycle,
}

fn attach_children(
    parent: Option<DbId>,
    children: &HashMap<Option<DbId>, Vec<usize>>,
    slots: &mut [Option<WikiPage>],
) -> Vec<WikiPageNode> {
    let Some(child_slots) = children.get(&parent) else {
        return Vec::new();
    };
    let mut nodes = Vec::with_capacity(child_slots.len());
    for &slot in child_slots {
        let Some(page) = slots[slot].take() else {
            continue;
        };
        let grandchildren = attach_children(Some(page.id), children, slots);
        nodes.push(WikiPageNode {
            page,
            children: grandchildren,
        });
    }
    nodes
}

/// A violated hierarchy invariant found by [`PageTree::integrity_issues`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// Sibling ranks are not exactly `0..n`.
    RankOutOfSequence {
        parent_id: Option<DbId>,
        page_id: DbId,
        display_order: i32,
        expected: usize,
    },
    /// The parent id does not resolve inside this wiki snapshot.
    MissingParent { page_id: DbId },
    /// The parent belongs to another wiki.
    ForeignParent { page_id: DbId },
    /// The parent chain never reaches the root.
    Cycle { page_id: DbId },
}

// ---------------------------------------------------------------------------
// Cycle guard
// ---------------------------------------------------------------------------

/// Check that `moving` may be attached under `target` (`None` = root).
///
/// Walks up from the target through the snapshot; meeting `moving` on the way
/// means the move would make the page its own ancestor. A target in another
/// wiki is rejected as `InvalidParam("target_id")`.
pub fn check_move_target(
    tree: &PageTree,
    moving: &WikiPage,
    target: Option<&WikiPage>,
) -> Result<(), CoreError> {
    let Some(target) = target else {
        return Ok(());
    };
    if target.wiki_id != moving.wiki_id {
        return Err(CoreError::invalid_param("target_id"));
    }

    let mut current = Some(target.id);
    let mut steps = 0usize;
    while let Some(id) = current {
        if id == moving.id {
            return Err(CoreError::RecursiveMove {
                page_id: moving.id,
                target_id: target.id,
            });
        }
        steps += 1;
        if steps > tree.len() {
            return Err(CoreError::Internal(format!(
                "Parent chain above page {} does not reach the root",
                target.id
            )));
        }
        current = match tree.get(id) {
            Some(page) => page.parent_id,
            None => {
                return Err(CoreError::Internal(format!(
                    "Page {id} is missing from the wiki snapshot"
                )))
            }
        };
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
