//! Flatten/unflatten and leaf-wise transforms over value trees.

use super::{def::same_shape, Tree, TreeDef};
use crate::errors::{Result, SnapshotError};

/// Combines the leaves found at one position across several trees
///
/// `leaves` arrives in the same order as the trees handed to
/// [`zip_combine`]. Implemented for every `Fn(&[&L]) -> L`.
pub trait LeafCombiner<L> {
    fn combine(&self, leaves: &[&L]) -> L;
}

impl<L, F> LeafCombiner<L> for F
where
    F: Fn(&[&L]) -> L,
{
    fn combine(&self, leaves: &[&L]) -> L {
        self(leaves)
    }
}

/// Split a tree into its leaves (traversal order) and its descriptor
pub fn flatten<L: Clone>(tree: &Tree<L>) -> (Vec<L>, TreeDef) {
    let leaves = tree.leaves().into_iter().cloned().collect();
    (leaves, TreeDef::of(tree))
}

/// Rebuild a tree from a descriptor and leaves in traversal order
///
/// # Errors
///
/// Returns `StructureMismatch` if `leaves.len()` differs from the
/// descriptor's leaf count.
pub fn unflatten<L>(def: &TreeDef, leaves: Vec<L>) -> Result<Tree<L>> {
    let expected = def.leaf_count();
    if leaves.len() != expected {
        return Err(SnapshotError::structure_mismatch(format!(
            "descriptor has {} leaf slots but {} leaves were supplied",
            expected,
            leaves.len()
        )));
    }
    let mut iter = leaves.into_iter();
    build(def, &mut iter)
}

fn build<L, I>(def: &TreeDef, leaves: &mut I) -> Result<Tree<L>>
where
    I: Iterator<Item = L>,
{
    match def {
        TreeDef::Leaf => leaves
            .next()
            .map(Tree::Leaf)
            .ok_or_else(|| SnapshotError::structure_mismatch("ran out of leaves")),
        TreeDef::Mapping(entries) => {
            let mut out = std::collections::BTreeMap::new();
            for (key, child) in entries {
                out.insert(key.clone(), build(child, leaves)?);
            }
            Ok(Tree::Mapping(out))
        }
        TreeDef::Sequence(items) => items
            .iter()
            .map(|child| build(child, leaves))
            .collect::<Result<Vec<_>>>()
            .map(Tree::Sequence),
    }
}

/// Copy of `tree` with every leaf replaced by `f(leaf)`
pub fn map_leaves<L, M, F>(tree: &Tree<L>, mut f: F) -> Tree<M>
where
    F: FnMut(&L) -> M,
{
    map_node(tree, &mut f)
}

fn map_node<L, M, F>(tree: &Tree<L>, f: &mut F) -> Tree<M>
where
    F: FnMut(&L) -> M,
{
    match tree {
        Tree::Leaf(value) => Tree::Leaf(f(value)),
        Tree::Mapping(entries) => Tree::Mapping(
            entries
                .iter()
                .map(|(k, child)| (k.clone(), map_node(child, f)))
                .collect(),
        ),
        Tree::Sequence(items) => Tree::Sequence(items.iter().map(|child| map_node(child, f)).collect()),
    }
}

/// Replace every leaf with `f(leaf)`, keeping the container nodes
pub fn map_leaves_in_place<L, F>(tree: &mut Tree<L>, mut f: F)
where
    F: FnMut(&L) -> L,
{
    map_node_in_place(tree, &mut f);
}

fn map_node_in_place<L, F>(tree: &mut Tree<L>, f: &mut F)
where
    F: FnMut(&L) -> L,
{
    match tree {
        Tree::Leaf(value) => *value = f(value),
        Tree::Mapping(entries) => entries
            .values_mut()
            .for_each(|child| map_node_in_place(child, f)),
        Tree::Sequence(items) => items
            .iter_mut()
            .for_each(|child| map_node_in_place(child, f)),
    }
}

/// Combine structurally identical trees leaf by leaf
///
/// For each leaf position the combiner receives that position's leaf from
/// every input tree, in input order. The result has the shared structure.
///
/// # Errors
///
/// Returns `StructureMismatch` if `trees` is empty or any tree's shape
/// differs from the first one's.
pub fn zip_combine<L, C>(trees: &[&Tree<L>], combiner: &C) -> Result<Tree<L>>
where
    C: LeafCombiner<L> + ?Sized,
{
    let (first, rest) = trees
        .split_first()
        .ok_or_else(|| SnapshotError::structure_mismatch("no trees to combine"))?;

    if let Some(pos) = rest.iter().position(|t| !same_shape(*first, *t)) {
        return Err(SnapshotError::structure_mismatch(format!(
            "tree at position {} does not match the structure of tree 0",
            pos + 1
        )));
    }

    let columns: Vec<Vec<&L>> = trees.iter().map(|t| t.leaves()).collect();
    let width = first.leaf_count();
    let combined = (0..width)
        .map(|slot| {
            let column: Vec<&L> = columns.iter().map(|leaves| leaves[slot]).collect();
            combiner.combine(&column)
        })
        .collect();

    unflatten(&first.def(), combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layered(a: f64, b: f64, c: f64) -> Tree<f64> {
        Tree::mapping([
            ("layer1", Tree::sequence([Tree::leaf(a), Tree::leaf(b)])),
            ("layer2", Tree::sequence([Tree::leaf(c)])),
        ])
    }

    #[test]
    fn test_flatten_then_unflatten_restores_tree() {
        let tree = layered(1.0, 2.0, 3.0);
        let (leaves, def) = flatten(&tree);
        assert_eq!(leaves, vec![1.0, 2.0, 3.0]);
        assert_eq!(unflatten(&def, leaves).unwrap(), tree);
    }

    #[test]
    fn test_unflatten_rejects_wrong_leaf_count() {
        let (_, def) = flatten(&layered(1.0, 2.0, 3.0));
        let result = unflatten(&def, vec![1.0, 2.0]);
        assert!(matches!(result, Err(SnapshotError::StructureMismatch { .. })));
        let result = unflatten(&def, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(matches!(result, Err(SnapshotError::StructureMismatch { .. })));
    }

    #[test]
    fn test_map_leaves_can_change_leaf_type() {
        let tree = layered(1.0, 2.0, 3.0);
        let labels = map_leaves(&tree, |v| format!("{:.1}", v));
        assert!(labels.same_structure(&tree));
        assert_eq!(labels.leaves(), vec!["1.0", "2.0", "3.0"]);
    }

    #[test]
    fn test_map_leaves_in_place_keeps_structure() {
        let mut tree = layered(1.0, 2.0, 3.0);
        let before = tree.def();
        map_leaves_in_place(&mut tree, |v| v + 10.0);
        assert_eq!(tree.def(), before);
        assert_eq!(tree, layered(11.0, 12.0, 13.0));
    }

    #[test]
    fn test_zip_combine_mean() {
        let a = layered(1.0, 2.0, 3.0);
        let b = layered(4.0, 5.0, 6.0);
        let c = layered(7.0, 8.0, 9.0);
        let mean = |leaves: &[&f64]| leaves.iter().copied().sum::<f64>() / leaves.len() as f64;

        let combined = zip_combine(&[&a, &b, &c], &mean).unwrap();
        assert_eq!(combined, layered(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_zip_combine_preserves_input_order() {
        let a = Tree::leaf(1.0);
        let b = Tree::leaf(10.0);
        let first_minus_second = |leaves: &[&f64]| leaves[0] - leaves[1];
        assert_eq!(zip_combine(&[&a, &b], &first_minus_second).unwrap(), Tree::leaf(-9.0));
    }

    #[test]
    fn test_zip_combine_rejects_mismatched_shapes() {
        let a = layered(1.0, 2.0, 3.0);
        let b = Tree::mapping([("layer1", Tree::leaf(1.0))]);
        let sum = |leaves: &[&f64]| leaves.iter().copied().sum::<f64>();
        let result = zip_combine(&[&a, &b], &sum);
        assert!(matches!(result, Err(SnapshotError::StructureMismatch { .. })));
    }

    #[test]
    fn test_zip_combine_rejects_empty_input() {
        let sum = |leaves: &[&f64]| leaves.iter().copied().sum::<f64>();
        let result = zip_combine::<f64, _>(&[], &sum);
        assert!(matches!(result, Err(SnapshotError::StructureMismatch { .. })));
    }
}
