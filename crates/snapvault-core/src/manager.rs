//! SnapshotManager façade
//!
//! The public operation set over one bounded store: save/get, metadata and
//! tag bookkeeping, queries, in-place leaf updates, leaf-wise combination
//! and whole-state persistence.
//!
//! ## Logging
//!
//! Every public operation owns its boundary:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! The store and the codecs below use only `tracing::debug!()`.

use crate::config::ManagerConfig;
use crate::errors::{Result, SnapshotError};
use crate::model::{Metadata, SnapshotRecord};
use crate::ops::{InsertOutcome, SnapshotStore};
use crate::persist::{self, RecordPayload, StateBody};
use crate::queries::{Query, QueryEngine};
use crate::ranking::{Comparator, ComparatorRegistry};
use crate::tree::{map_leaves_in_place, zip_combine, LeafCombiner, Tree, TreeHandle};
use crate::{log_op_end, log_op_error, log_op_start};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::Instant;

/// Prefix of generated snapshot ids
pub const GENERATED_ID_PREFIX: &str = "snapshot-";

/// Optional inputs to a save
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    id: Option<String>,
    metadata: Metadata,
    tags: BTreeSet<String>,
    copy: Option<bool>,
}

impl SaveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this id instead of generating one
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Override the manager's `copy_on_save` for this save
    pub fn with_copy(mut self, copy: bool) -> Self {
        self.copy = Some(copy);
        self
    }
}

/// What a save did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    /// The assigned id, returned even when the save was rejected
    pub id: String,
    pub outcome: InsertOutcome,
}

impl SaveReceipt {
    pub fn is_stored(&self) -> bool {
        self.outcome.is_stored()
    }
}

/// Bounded snapshot manager
///
/// Single-threaded: no internal locking beyond what tree handles need.
/// Wrap the manager in a mutex to share it across threads.
#[derive(Debug)]
pub struct SnapshotManager<L> {
    store: SnapshotStore<L>,
    config: ManagerConfig,
    next_id: u64,
    next_seq: u64,
}

impl<L> SnapshotManager<L> {
    /// Create an empty FIFO manager
    ///
    /// # Errors
    ///
    /// Returns `InvalidCapacity` if `config.max_capacity` is zero.
    pub fn new(config: ManagerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: SnapshotStore::new(config.max_capacity)?,
            config,
            next_id: 0,
            next_seq: 0,
        })
    }

    /// Rank snapshots with `comparator` instead of FIFO
    pub fn with_comparator(mut self, comparator: Comparator<L>) -> Self {
        self.store = self.store.with_comparator(comparator);
        self
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Read-only view of the underlying store
    pub fn store(&self) -> &SnapshotStore<L> {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.store.contains(id)
    }

    /// Ids in storage order
    pub fn ids(&self) -> &[String] {
        self.store.ids()
    }

    /// Metadata of a snapshot
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is not stored.
    pub fn get_metadata(&self, id: &str) -> Result<&Metadata> {
        Ok(self.store.record(id)?.metadata())
    }

    /// Tags of a snapshot
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is not stored.
    pub fn get_tags(&self, id: &str) -> Result<&BTreeSet<String>> {
        Ok(self.store.record(id)?.tags())
    }

    /// Merge `partial` into a snapshot's metadata, overwriting on collision
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is not stored; metadata is unchanged.
    pub fn update_metadata(&mut self, id: &str, partial: Metadata) -> Result<()> {
        log_op_start!("update_metadata", snapshot_id = %id, keys = partial.len());
        let start = Instant::now();

        let result = self
            .store
            .record_mut(id)
            .map(|record| record.metadata.merge(partial));
        finish("update_metadata", id, start, result)
    }

    /// Add tags to a snapshot
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is not stored.
    pub fn add_tags<I, S>(&mut self, id: &str, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        log_op_start!("add_tags", snapshot_id = %id);
        let start = Instant::now();

        let result = self
            .store
            .record_mut(id)
            .map(|record| record.tags.extend(tags.into_iter().map(Into::into)));
        finish("add_tags", id, start, result)
    }

    /// Remove tags from a snapshot; absent tags are ignored
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is not stored.
    pub fn remove_tags<I, S>(&mut self, id: &str, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        log_op_start!("remove_tags", snapshot_id = %id);
        let start = Instant::now();

        let result = self.store.record_mut(id).map(|record| {
            for tag in tags {
                record.tags.remove(tag.as_ref());
            }
        });
        finish("remove_tags", id, start, result)
    }

    /// Remove a snapshot
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is not stored.
    pub fn remove_snapshot(&mut self, id: &str) -> Result<()> {
        log_op_start!("remove_snapshot", snapshot_id = %id);
        let start = Instant::now();

        let result = self.store.remove(id).map(|_| ());
        finish("remove_snapshot", id, start, result)
    }

    /// Ids best-to-worst by comparator, or insertion order without one
    pub fn get_ranked_snapshots(&self) -> Vec<String> {
        self.store.ranked_ids()
    }

    /// Query engine over the current contents
    pub fn query_engine(&self) -> QueryEngine<'_, L> {
        QueryEngine::new(&self.store)
    }

    /// Ids of every snapshot matching `query`
    pub fn query(&self, query: &Query<L>) -> BTreeSet<String> {
        log_op_start!("query");
        let start = Instant::now();

        let matched = self.query_engine().evaluate(query);
        log_op_end!(
            "query",
            duration_ms = start.elapsed().as_millis() as u64,
            result_len = matched.len()
        );
        matched
    }

    /// Apply `f` to every leaf of the named snapshots, in place
    ///
    /// Structure and ids never change. A tree shared by several ids (or
    /// listed twice) is transformed once.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for the first missing id; no tree is touched.
    pub fn update_leaf_nodes<S, F>(&mut self, ids: &[S], f: F) -> Result<()>
    where
        S: AsRef<str>,
        F: FnMut(&L) -> L,
    {
        log_op_start!("update_leaf_nodes", requested = ids.len());
        let start = Instant::now();

        let result = ids
            .iter()
            .map(|id| self.store.record(id.as_ref()).map(SnapshotRecord::handle))
            .collect::<Result<Vec<_>>>()
            .map(|handles| transform_unique(handles, f));
        match result {
            Ok(updated) => {
                log_op_end!(
                    "update_leaf_nodes",
                    duration_ms = start.elapsed().as_millis() as u64,
                    result_len = updated
                );
                Ok(())
            }
            Err(e) => {
                log_op_error!(
                    "update_leaf_nodes",
                    &e,
                    duration_ms = start.elapsed().as_millis() as u64
                );
                Err(e)
            }
        }
    }

    /// Apply `f` to every leaf of every stored snapshot, in place
    pub fn update_all_leaf_nodes<F>(&mut self, f: F)
    where
        F: FnMut(&L) -> L,
    {
        log_op_start!("update_all_leaf_nodes", store_len = self.store.len());
        let start = Instant::now();

        let handles: Vec<&TreeHandle<L>> = self.store.records().map(SnapshotRecord::handle).collect();
        let updated = transform_unique(handles, f);
        log_op_end!(
            "update_all_leaf_nodes",
            duration_ms = start.elapsed().as_millis() as u64,
            result_len = updated
        );
    }

    /// Combine the named snapshots leaf by leaf
    ///
    /// The combiner receives one leaf per id, in `ids` order. The result is
    /// not stored; stored trees are only read.
    ///
    /// # Errors
    ///
    /// - `NotFound` if any id is not stored
    /// - `StructureMismatch` if `ids` is empty or the trees' shapes differ
    pub fn combine_snapshots<S, C>(&self, ids: &[S], combiner: &C) -> Result<Tree<L>>
    where
        S: AsRef<str>,
        C: LeafCombiner<L> + ?Sized,
    {
        log_op_start!("combine_snapshots", requested = ids.len());
        let start = Instant::now();

        let result = self.combine_impl(ids, combiner);
        match &result {
            Ok(tree) => log_op_end!(
                "combine_snapshots",
                duration_ms = start.elapsed().as_millis() as u64,
                result_len = tree.leaf_count()
            ),
            Err(e) => log_op_error!(
                "combine_snapshots",
                e,
                duration_ms = start.elapsed().as_millis() as u64
            ),
        }
        result
    }

    fn combine_impl<S, C>(&self, ids: &[S], combiner: &C) -> Result<Tree<L>>
    where
        S: AsRef<str>,
        C: LeafCombiner<L> + ?Sized,
    {
        let handles = ids
            .iter()
            .map(|id| self.store.record(id.as_ref()).map(SnapshotRecord::handle))
            .collect::<Result<Vec<_>>>()?;

        // one read guard per distinct tree
        let mut unique: Vec<&TreeHandle<L>> = Vec::new();
        let mut slots = Vec::with_capacity(handles.len());
        for &handle in &handles {
            match unique.iter().position(|u| TreeHandle::ptr_eq(u, handle)) {
                Some(slot) => slots.push(slot),
                None => {
                    slots.push(unique.len());
                    unique.push(handle);
                }
            }
        }
        let guards: Vec<_> = unique.iter().map(|h| h.read()).collect();
        let trees: Vec<&Tree<L>> = slots.iter().map(|&slot| &*guards[slot]).collect();

        zip_combine(&trees, combiner)
    }

    fn generate_id(&mut self) -> String {
        loop {
            let candidate = format!("{}{}", GENERATED_ID_PREFIX, self.next_id);
            self.next_id += 1;
            if !self.store.contains(&candidate) {
                return candidate;
            }
        }
    }
}

impl<L: Clone> SnapshotManager<L> {
    /// Save a tree and return its id
    ///
    /// A ranked store at capacity may silently reject the snapshot; the
    /// returned id is then never retrievable. Use
    /// [`SnapshotManager::save_snapshot_detailed`] to observe the outcome.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if a supplied id is already stored.
    pub fn save_snapshot(&mut self, tree: &TreeHandle<L>, options: SaveOptions) -> Result<String> {
        self.save_snapshot_detailed(tree, options)
            .map(|receipt| receipt.id)
    }

    /// Save a tree and report whether it was stored, and what it evicted
    ///
    /// With copying disabled the stored record shares `tree` with the caller
    /// and mutations are visible both ways. Do not hold a guard on `tree`
    /// across later manager calls; see [`TreeHandle`].
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if a supplied id is already stored.
    pub fn save_snapshot_detailed(
        &mut self,
        tree: &TreeHandle<L>,
        options: SaveOptions,
    ) -> Result<SaveReceipt> {
        log_op_start!("save_snapshot", requested_id = ?options.id);
        let start = Instant::now();

        let result = self.save_impl(tree, options);
        match &result {
            Ok(receipt) => {
                let evicted = match &receipt.outcome {
                    InsertOutcome::Stored { evicted } => evicted.as_deref(),
                    InsertOutcome::Rejected => None,
                };
                log_op_end!(
                    "save_snapshot",
                    duration_ms = start.elapsed().as_millis() as u64,
                    snapshot_id = %receipt.id,
                    stored = receipt.is_stored(),
                    evicted_id = ?evicted,
                    store_len = self.store.len()
                );
            }
            Err(e) => log_op_error!(
                "save_snapshot",
                e,
                duration_ms = start.elapsed().as_millis() as u64
            ),
        }
        result
    }

    fn save_impl(&mut self, tree: &TreeHandle<L>, options: SaveOptions) -> Result<SaveReceipt> {
        let id = match options.id {
            Some(id) if self.store.contains(&id) => {
                return Err(SnapshotError::DuplicateId { snapshot_id: id })
            }
            Some(id) => id,
            None => self.generate_id(),
        };

        let copy = options.copy.unwrap_or(self.config.copy_on_save);
        let seq = self.next_seq;
        self.next_seq += 1;

        let record = SnapshotRecord::new(
            id.clone(),
            tree.share_or_copy(copy),
            options.metadata,
            options.tags,
            seq,
        );
        let outcome = self.store.insert(record)?;
        Ok(SaveReceipt { id, outcome })
    }

    /// Save an owned tree; the record takes ownership of it
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if a supplied id is already stored.
    pub fn save_tree(&mut self, tree: Tree<L>, options: SaveOptions) -> Result<String> {
        let handle = TreeHandle::new(tree);
        self.save_snapshot(&handle, options.with_copy(false))
    }

    /// Retrieve a snapshot's tree
    ///
    /// `copy` overrides the manager's `copy_on_retrieve`. Without a copy the
    /// returned handle shares the stored tree, and mutations are visible
    /// both ways. Holding its write guard while calling back into the
    /// manager deadlocks; see [`TreeHandle`].
    ///
    /// # Errors
    ///
    /// Returns `NotFound` ("Snapshot with ID <id> not found") if absent.
    pub fn get_snapshot(&self, id: &str, copy: Option<bool>) -> Result<TreeHandle<L>> {
        log_op_start!("get_snapshot", snapshot_id = %id);
        let start = Instant::now();

        let copy = copy.unwrap_or(self.config.copy_on_retrieve);
        let result = self.store.get(id, copy);
        match &result {
            Ok(_) => log_op_end!(
                "get_snapshot",
                duration_ms = start.elapsed().as_millis() as u64,
                snapshot_id = %id,
                copied = copy
            ),
            Err(e) => log_op_error!(
                "get_snapshot",
                e,
                duration_ms = start.elapsed().as_millis() as u64,
                snapshot_id = %id
            ),
        }
        result
    }

    /// Owned copy of a snapshot's tree
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is not stored.
    pub fn get_tree(&self, id: &str) -> Result<Tree<L>> {
        Ok(self.store.record(id)?.handle().to_tree())
    }

    /// Everything needed to rebuild this manager
    pub fn to_state_body(&self) -> StateBody<L> {
        StateBody {
            max_capacity: self.store.max_capacity(),
            comparator: self.store.comparator().map(|c| c.name().to_string()),
            copy_on_save: self.config.copy_on_save,
            copy_on_retrieve: self.config.copy_on_retrieve,
            next_id: self.next_id,
            next_seq: self.next_seq,
            order: self.store.ids().to_vec(),
            records: self
                .store
                .records()
                .map(|record| RecordPayload {
                    id: record.id().to_string(),
                    tree: record.handle().to_tree(),
                    metadata: record.metadata().clone(),
                    tags: record.tags().clone(),
                    insertion_seq: record.insertion_seq(),
                })
                .collect(),
        }
    }
}

impl<L: Clone + Serialize + DeserializeOwned> SnapshotManager<L> {
    /// Write the full state to `path`, replacing any existing file
    ///
    /// The payload is encoded before the file is opened, so an encoding
    /// failure leaves an existing file untouched. A failed write leaves the
    /// file in an undefined state; see [`SnapshotManager::save_state_atomic`].
    ///
    /// # Errors
    ///
    /// - `Serialization` if a leaf or metadata value cannot be encoded, or
    ///   would not decode back (NaN or infinite float leaves)
    /// - `Io` with the transport error unmodified
    pub fn save_state(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        log_op_start!("save_state", path = %path.display());
        let start = Instant::now();

        let result = persist::encode_state(&self.to_state_body()).and_then(|bytes| {
            let file = File::create(path)?;
            write_bytes(BufWriter::new(file), &bytes)
        });
        self.finish_save("save_state", start, result)
    }

    /// Write the full state to `writer`
    ///
    /// # Errors
    ///
    /// Same as [`SnapshotManager::save_state`].
    pub fn save_state_to<W: Write>(&self, writer: W) -> Result<()> {
        log_op_start!("save_state_to");
        let start = Instant::now();

        let result = self.write_state(writer);
        self.finish_save("save_state_to", start, result)
    }

    /// Write the full state through a sibling temp file and rename
    ///
    /// # Errors
    ///
    /// Same as [`SnapshotManager::save_state`].
    pub fn save_state_atomic(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        log_op_start!("save_state_atomic", path = %path.display());
        let start = Instant::now();

        let result = persist::encode_state(&self.to_state_body())
            .and_then(|bytes| persist::atomic_write(path, &bytes));
        self.finish_save("save_state_atomic", start, result)
    }

    fn write_state<W: Write>(&self, writer: W) -> Result<()> {
        let bytes = persist::encode_state(&self.to_state_body())?;
        write_bytes(writer, &bytes)
    }

    fn finish_save(&self, op: &'static str, start: Instant, result: Result<()>) -> Result<()> {
        match &result {
            Ok(()) => log_op_end!(
                op,
                duration_ms = start.elapsed().as_millis() as u64,
                store_len = self.store.len()
            ),
            Err(e) => log_op_error!(op, e, duration_ms = start.elapsed().as_millis() as u64),
        }
        result
    }
}

impl<L: DeserializeOwned + 'static> SnapshotManager<L> {
    /// Build a new manager from a state file
    ///
    /// Comparator names are resolved through `registry`.
    ///
    /// # Errors
    ///
    /// - `Io` with the transport error unmodified
    /// - `Serialization` or `CorruptState` for an unreadable payload
    /// - `UnknownComparator` if the persisted comparator is not resolvable
    pub fn load_state(path: impl AsRef<Path>, registry: &ComparatorRegistry<L>) -> Result<Self> {
        let path = path.as_ref();
        log_op_start!("load_state", path = %path.display());
        let start = Instant::now();

        let result = File::open(path)
            .map_err(SnapshotError::from)
            .and_then(|file| Self::read_state(BufReader::new(file), registry));
        Self::finish_load("load_state", start, result)
    }

    /// Build a new manager from a state payload read from `reader`
    ///
    /// # Errors
    ///
    /// Same as [`SnapshotManager::load_state`].
    pub fn load_state_from<R: Read>(reader: R, registry: &ComparatorRegistry<L>) -> Result<Self> {
        log_op_start!("load_state_from");
        let start = Instant::now();

        let result = Self::read_state(reader, registry);
        Self::finish_load("load_state_from", start, result)
    }

    /// Build a new manager from a decoded state body
    ///
    /// Every record gets its own tree.
    ///
    /// # Errors
    ///
    /// `CorruptState` if the body is inconsistent, `UnknownComparator` if
    /// its comparator is not resolvable.
    pub fn from_state_body(body: StateBody<L>, registry: &ComparatorRegistry<L>) -> Result<Self> {
        body.validate()?;
        let comparator = body
            .comparator
            .as_deref()
            .map(|name| registry.resolve(name))
            .transpose()?;

        let mut payloads: HashMap<String, RecordPayload<L>> = body
            .records
            .into_iter()
            .map(|payload| (payload.id.clone(), payload))
            .collect();
        let records = body
            .order
            .iter()
            .map(|id| {
                payloads
                    .remove(id)
                    .map(|p| {
                        SnapshotRecord::new(
                            p.id,
                            TreeHandle::new(p.tree),
                            p.metadata,
                            p.tags,
                            p.insertion_seq,
                        )
                    })
                    .ok_or_else(|| SnapshotError::corrupt(format!("record {} is missing", id)))
            })
            .collect::<Result<Vec<_>>>()?;

        let config = ManagerConfig {
            max_capacity: body.max_capacity,
            copy_on_save: body.copy_on_save,
            copy_on_retrieve: body.copy_on_retrieve,
        };
        Ok(Self {
            store: SnapshotStore::restore(body.max_capacity, comparator, records)?,
            config,
            next_id: body.next_id,
            next_seq: body.next_seq,
        })
    }

    fn read_state<R: Read>(mut reader: R, registry: &ComparatorRegistry<L>) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let body = persist::decode_state(&bytes)?;
        Self::from_state_body(body, registry)
    }

    fn finish_load(op: &'static str, start: Instant, result: Result<Self>) -> Result<Self> {
        match &result {
            Ok(manager) => log_op_end!(
                op,
                duration_ms = start.elapsed().as_millis() as u64,
                store_len = manager.len(),
                max_capacity = manager.store.max_capacity()
            ),
            Err(e) => log_op_error!(op, e, duration_ms = start.elapsed().as_millis() as u64),
        }
        result
    }
}

fn write_bytes<W: Write>(mut writer: W, bytes: &[u8]) -> Result<()> {
    writer.write_all(bytes)?;
    writer.flush()?;
    Ok(())
}

// Transforms each distinct tree once; returns how many were transformed
fn transform_unique<L, F>(handles: Vec<&TreeHandle<L>>, mut f: F) -> usize
where
    F: FnMut(&L) -> L,
{
    let mut done: Vec<&TreeHandle<L>> = Vec::with_capacity(handles.len());
    for handle in handles {
        if done.iter().any(|seen| TreeHandle::ptr_eq(seen, handle)) {
            continue;
        }
        map_leaves_in_place(&mut *handle.write(), &mut f);
        done.push(handle);
    }
    done.len()
}

fn finish(op: &'static str, id: &str, start: Instant, result: Result<()>) -> Result<()> {
    match &result {
        Ok(()) => log_op_end!(
            op,
            duration_ms = start.elapsed().as_millis() as u64,
            snapshot_id = %id
        ),
        Err(e) => log_op_error!(
            op,
            e,
            duration_ms = start.elapsed().as_millis() as u64,
            snapshot_id = %id
        ),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(capacity: usize) -> SnapshotManager<f64> {
        SnapshotManager::new(ManagerConfig::default().with_max_capacity(capacity)).unwrap()
    }

    #[test]
    fn test_generated_ids_skip_caller_ids() {
        let mut m = manager(5);
        m.save_tree(Tree::leaf(0.0), SaveOptions::new().with_id("snapshot-0"))
            .unwrap();
        let id = m.save_tree(Tree::leaf(1.0), SaveOptions::new()).unwrap();
        assert_eq!(id, "snapshot-1");
    }

    #[test]
    fn test_duplicate_id_does_not_consume_sequence() {
        let mut m = manager(5);
        m.save_tree(Tree::leaf(0.0), SaveOptions::new().with_id("a"))
            .unwrap();
        let err = m
            .save_tree(Tree::leaf(1.0), SaveOptions::new().with_id("a"))
            .unwrap_err();
        assert!(matches!(err, SnapshotError::DuplicateId { .. }));
        assert_eq!(m.to_state_body().next_seq, 1);
    }

    #[test]
    fn test_update_leaf_nodes_is_all_or_nothing() {
        let mut m = manager(5);
        let a = m.save_tree(Tree::leaf(1.0), SaveOptions::new()).unwrap();
        let err = m
            .update_leaf_nodes(&[a.as_str(), "missing"], |x| x * 10.0)
            .unwrap_err();
        assert!(matches!(err, SnapshotError::NotFound { .. }));
        assert_eq!(m.get_tree(&a).unwrap(), Tree::leaf(1.0));
    }

    #[test]
    fn test_update_leaf_nodes_transforms_shared_tree_once() {
        let mut m = manager(5);
        let shared = TreeHandle::new(Tree::leaf(2.0));
        let opts = || SaveOptions::new().with_copy(false);
        let a = m.save_snapshot(&shared, opts()).unwrap();
        let b = m.save_snapshot(&shared, opts()).unwrap();

        m.update_leaf_nodes(&[&a, &b, &a], |x| x * 2.0).unwrap();
        assert_eq!(shared.to_tree(), Tree::leaf(4.0));
    }

    #[test]
    fn test_combine_same_id_twice() {
        let mut m = manager(5);
        let a = m
            .save_tree(Tree::sequence([Tree::leaf(1.0), Tree::leaf(3.0)]), SaveOptions::new())
            .unwrap();
        let sum = |xs: &[&f64]| xs.iter().copied().sum::<f64>();
        let combined = m.combine_snapshots(&[&a, &a], &sum).unwrap();
        assert_eq!(combined, Tree::sequence([Tree::leaf(2.0), Tree::leaf(6.0)]));
    }
}
