use snapvault_core::{
    Comparator, ManagerConfig, Metadata, SaveOptions, SnapshotManager, Tree,
};
use std::collections::BTreeSet;

/// FIFO manager with default copy policies
#[allow(dead_code)]
pub fn fifo_manager(capacity: usize) -> SnapshotManager<f64> {
    SnapshotManager::new(ManagerConfig::default().with_max_capacity(capacity))
        .expect("capacity is positive")
}

/// Manager ranked by the `accuracy` metadata value
#[allow(dead_code)]
pub fn accuracy_manager(capacity: usize) -> SnapshotManager<f64> {
    fifo_manager(capacity).with_comparator(Comparator::by_metadata_key("accuracy"))
}

/// `{"p": [x0, x1, ...]}`
#[allow(dead_code)]
pub fn param_tree(values: &[f64]) -> Tree<f64> {
    Tree::mapping([(
        "p",
        Tree::sequence(values.iter().copied().map(Tree::leaf)),
    )])
}

/// Save options carrying an id and an accuracy
#[allow(dead_code)]
pub fn scored(id: &str, accuracy: f64) -> SaveOptions {
    SaveOptions::new()
        .with_id(id)
        .with_metadata(Metadata::new().with("accuracy", accuracy))
}

#[allow(dead_code)]
pub fn id_set(ids: &[&str]) -> BTreeSet<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

/// Leaves of a tree in traversal order
#[allow(dead_code)]
pub fn leaves(tree: &Tree<f64>) -> Vec<f64> {
    tree.leaves().into_iter().copied().collect()
}
