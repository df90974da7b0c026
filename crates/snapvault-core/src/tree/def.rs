//! Structural descriptors.

use super::Tree;
use serde::{Deserialize, Serialize};

/// Shape of a value tree with leaf values erased
///
/// Two trees are structurally compatible iff their descriptors are equal:
/// same node kind at every position, same mapping key sets, same sequence
/// lengths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeDef {
    Leaf,
    /// Keys in traversal (ascending) order
    Mapping(Vec<(String, TreeDef)>),
    Sequence(Vec<TreeDef>),
}

impl TreeDef {
    /// Descriptor of `tree`
    pub fn of<L>(tree: &Tree<L>) -> Self {
        match tree {
            Tree::Leaf(_) => TreeDef::Leaf,
            Tree::Mapping(entries) => TreeDef::Mapping(
                entries
                    .iter()
                    .map(|(k, child)| (k.clone(), TreeDef::of(child)))
                    .collect(),
            ),
            Tree::Sequence(items) => TreeDef::Sequence(items.iter().map(TreeDef::of).collect()),
        }
    }

    /// Number of leaf slots described
    pub fn leaf_count(&self) -> usize {
        match self {
            TreeDef::Leaf => 1,
            TreeDef::Mapping(entries) => entries.iter().map(|(_, d)| d.leaf_count()).sum(),
            TreeDef::Sequence(items) => items.iter().map(TreeDef::leaf_count).sum(),
        }
    }

    /// Whether `tree` has exactly this shape
    pub fn matches<L>(&self, tree: &Tree<L>) -> bool {
        match (self, tree) {
            (TreeDef::Leaf, Tree::Leaf(_)) => true,
            (TreeDef::Mapping(defs), Tree::Mapping(entries)) => {
                defs.len() == entries.len()
                    && defs
                        .iter()
                        .zip(entries.iter())
                        .all(|((dk, d), (k, child))| dk == k && d.matches(child))
            }
            (TreeDef::Sequence(defs), Tree::Sequence(items)) => {
                defs.len() == items.len() && defs.iter().zip(items).all(|(d, child)| d.matches(child))
            }
            _ => false,
        }
    }
}

/// Shape comparison without building descriptors
pub(crate) fn same_shape<A, B>(a: &Tree<A>, b: &Tree<B>) -> bool {
    match (a, b) {
        (Tree::Leaf(_), Tree::Leaf(_)) => true,
        (Tree::Mapping(xs), Tree::Mapping(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys.iter())
                    .all(|((kx, x), (ky, y))| kx == ky && same_shape(x, y))
        }
        (Tree::Sequence(xs), Tree::Sequence(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_shape(x, y))
        }
        _ => false,
    }
}
