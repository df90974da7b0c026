use super::Metadata;
use crate::tree::{Tree, TreeHandle};
use std::collections::BTreeSet;
use std::sync::RwLockReadGuard;

/// One identified, versioned value tree plus metadata and tags
///
/// `insertion_seq` is assigned once at creation and never changes; it
/// orders records for FIFO eviction and breaks fitness ties.
#[derive(Debug, Clone)]
pub struct SnapshotRecord<L> {
    pub(crate) id: String,
    pub(crate) tree: TreeHandle<L>,
    pub(crate) metadata: Metadata,
    pub(crate) tags: BTreeSet<String>,
    pub(crate) insertion_seq: u64,
}

impl<L> SnapshotRecord<L> {
    pub fn new(
        id: String,
        tree: TreeHandle<L>,
        metadata: Metadata,
        tags: BTreeSet<String>,
        insertion_seq: u64,
    ) -> Self {
        Self {
            id,
            tree,
            metadata,
            tags,
            insertion_seq,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The record's tree handle (shared, not copied)
    pub fn handle(&self) -> &TreeHandle<L> {
        &self.tree
    }

    /// Read access to the stored tree
    pub fn tree(&self) -> RwLockReadGuard<'_, Tree<L>> {
        self.tree.read()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn insertion_seq(&self) -> u64 {
        self.insertion_seq
    }
}
