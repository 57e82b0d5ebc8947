//! Ancestor/descendant walking and navigation-tree construction.
//!
//! The parent edge set is expected to be a forest, but nothing in the schema
//! enforces that, so both walks keep a visited set seeded with the starting
//! structure. A cycle therefore ends the walk instead of looping, and the
//! starting structure never shows up among its own ancestors or descendants.

use std::collections::{HashSet, VecDeque};

use anyhow::Result;
use serde::Serialize;

use crate::models::{Lineage, StructureRef};
use crate::store::Store;

#[derive(Clone, Copy)]
pub(crate) enum Walk {
    Up,
    Down,
}

pub(crate) async fn breadth_first<S: Store + ?Sized>(
    store: &S,
    start_id: &str,
    first_level: &[StructureRef],
    model: Option<&str>,
    walk: Walk,
) -> Result<Vec<StructureRef>> {
    let mut visited: HashSet<String> = HashSet::from([start_id.to_string()]);
    let mut queue: VecDeque<StructureRef> = first_level.iter().cloned().collect();
    let mut out = Vec::new();

    while let Some(node) = queue.pop_front() {
        if !visited.insert(node.structure_id.clone()) {
            continue;
        }
        let next = match walk {
            Walk::Up => store.parents_of(&node.structure_id, model).await?,
            Walk::Down => store.children_of(&node.structure_id, model).await?,
        };
        queue.extend(next);
        out.push(node);
    }

    Ok(out)
}

/// Computes the full lineage of `start_id` given its already-fetched direct
/// parents.
///
/// Ancestors come back root first; descendants nearest first, as produced
/// by [`Store::descendants_of`].
pub async fn lineage(
    store: &dyn Store,
    start_id: &str,
    parents: &[StructureRef],
    model: Option<&str>,
) -> Result<Lineage> {
    let mut ancestors = breadth_first(store, start_id, parents, model, Walk::Up).await?;
    ancestors.reverse();
    let descendants = store.descendants_of(start_id, model).await?;
    Ok(Lineage {
        ancestors,
        descendants,
    })
}

/// One node of the nested navigation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub structure_id: String,
    pub name: String,
    /// Set only on the structure being viewed.
    pub current: bool,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(r: &StructureRef) -> Self {
        Self {
            structure_id: r.structure_id.clone(),
            name: r.name.clone(),
            current: false,
            children: Vec::new(),
        }
    }
}

/// Nests `ancestors` (root first) outer to inner, places `current` at the
/// innermost level and hangs its direct `children` beneath it.
pub fn build_tree(
    ancestors: &[StructureRef],
    current: &StructureRef,
    children: &[StructureRef],
) -> TreeNode {
    let mut node = TreeNode {
        structure_id: current.structure_id.clone(),
        name: current.name.clone(),
        current: true,
        children: children.iter().map(TreeNode::leaf).collect(),
    };
    for ancestor in ancestors.iter().rev() {
        let mut outer = TreeNode::leaf(ancestor);
        outer.children.push(node);
        node = outer;
    }
    node
}
