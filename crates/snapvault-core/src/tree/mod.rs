//! Value trees: nested mapping/sequence/leaf payloads.
//!
//! ## Responsibilities
//!
//! - Define the closed recursive [`Tree`] type and its structural descriptor
//! - Flatten/unflatten, leaf-wise map and leaf-wise zip-combine (the codec)
//! - Shared/isolated ownership through [`TreeHandle`]
//!
//! ## Traversal Order
//!
//! Depth-first. Mapping entries are visited in ascending key order,
//! sequence entries in index order. Every function in this module uses
//! the same order, so leaf position `i` means the same slot everywhere.

pub mod codec;
pub mod def;
pub mod handle;

pub use codec::{flatten, map_leaves, map_leaves_in_place, unflatten, zip_combine, LeafCombiner};
pub use def::TreeDef;
pub use handle::TreeHandle;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A nested value tree with opaque leaves of type `L`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tree<L> {
    /// Terminal value, never interpreted by the store
    Leaf(L),
    /// Named children, unique keys, visited in key order
    Mapping(BTreeMap<String, Tree<L>>),
    /// Positional children
    Sequence(Vec<Tree<L>>),
}

impl<L> Tree<L> {
    /// Build a leaf node
    pub fn leaf(value: L) -> Self {
        Tree::Leaf(value)
    }

    /// Build a mapping node from `(key, child)` pairs
    ///
    /// A repeated key keeps the last child supplied for it.
    pub fn mapping<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Tree<L>)>,
    {
        Tree::Mapping(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a sequence node
    pub fn sequence<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Tree<L>>,
    {
        Tree::Sequence(items.into_iter().collect())
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Tree::Leaf(_))
    }

    pub fn as_leaf(&self) -> Option<&L> {
        match self {
            Tree::Leaf(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Tree<L>>> {
        match self {
            Tree::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Tree<L>]> {
        match self {
            Tree::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Mutable access to a sequence node, e.g. to append children
    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<Tree<L>>> {
        match self {
            Tree::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Mutable access to a mapping node
    pub fn as_mapping_mut(&mut self) -> Option<&mut BTreeMap<String, Tree<L>>> {
        match self {
            Tree::Mapping(entries) => Some(entries),
            _ => None,
        }
    }

    /// Child of a mapping node by key; `None` for other node kinds
    pub fn get(&self, key: &str) -> Option<&Tree<L>> {
        self.as_mapping().and_then(|entries| entries.get(key))
    }

    /// Whether this is a mapping node holding `key`
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Child of a sequence node by position; `None` for other node kinds
    pub fn index(&self, i: usize) -> Option<&Tree<L>> {
        self.as_sequence().and_then(|items| items.get(i))
    }

    /// Borrowed leaves in traversal order
    pub fn leaves(&self) -> Vec<&L> {
        let mut out = Vec::new();
        collect_leaf_refs(self, &mut out);
        out
    }

    /// Number of leaves in the tree
    pub fn leaf_count(&self) -> usize {
        match self {
            Tree::Leaf(_) => 1,
            Tree::Mapping(entries) => entries.values().map(Tree::leaf_count).sum(),
            Tree::Sequence(items) => items.iter().map(Tree::leaf_count).sum(),
        }
    }

    /// Structural descriptor of this tree
    pub fn def(&self) -> TreeDef {
        TreeDef::of(self)
    }

    /// Whether both trees share one structural descriptor
    pub fn same_structure<M>(&self, other: &Tree<M>) -> bool {
        def::same_shape(self, other)
    }
}

fn collect_leaf_refs<'a, L>(tree: &'a Tree<L>, out: &mut Vec<&'a L>) {
    match tree {
        Tree::Leaf(value) => out.push(value),
        Tree::Mapping(entries) => entries.values().for_each(|child| collect_leaf_refs(child, out)),
        Tree::Sequence(items) => items.iter().for_each(|child| collect_leaf_refs(child, out)),
    }
}
