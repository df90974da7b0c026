use std::cmp::Ordering;
use std::collections::HashMap;

use crate::errors::{Result, SnapshotError};
use crate::model::SnapshotRecord;
use crate::ranking::Comparator;
use crate::tree::TreeHandle;

/// Result of [`SnapshotStore::insert`]
///
/// Rejection is a policy outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was appended; at capacity, one record made room for it
    Stored { evicted: Option<String> },
    /// The record ranked below every stored record at full capacity and
    /// was discarded; the store is unchanged
    Rejected,
}

impl InsertOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, InsertOutcome::Stored { .. })
    }
}

/// Bounded, ordered collection of snapshot records
///
/// `order` holds ids in insertion order and `records` maps each id to its
/// record. Every mutating method keeps the two mutually consistent and
/// keeps `len() <= max_capacity()`.
///
/// Not thread-safe (no internal locking) - wrap in a mutex to share.
#[derive(Debug)]
pub struct SnapshotStore<L> {
    order: Vec<String>,
    records: HashMap<String, SnapshotRecord<L>>,
    max_capacity: usize,
    comparator: Option<Comparator<L>>,
}

impl<L> SnapshotStore<L> {
    /// Create an empty store
    ///
    /// # Errors
    ///
    /// Returns `InvalidCapacity` if `max_capacity` is zero.
    pub fn new(max_capacity: usize) -> Result<Self> {
        if max_capacity == 0 {
            return Err(SnapshotError::InvalidCapacity {
                requested: max_capacity,
            });
        }
        Ok(Self {
            order: Vec::new(),
            records: HashMap::new(),
            max_capacity,
            comparator: None,
        })
    }

    /// Rank records with `comparator` instead of FIFO
    pub fn with_comparator(mut self, comparator: Comparator<L>) -> Self {
        self.comparator = Some(comparator);
        self
    }

    /// Rebuild a store from already-validated persisted parts
    pub(crate) fn restore(
        max_capacity: usize,
        comparator: Option<Comparator<L>>,
        records: Vec<SnapshotRecord<L>>,
    ) -> Result<Self> {
        let mut store = Self::new(max_capacity)?;
        store.comparator = comparator;
        for record in records {
            store.order.push(record.id.clone());
            store.records.insert(record.id.clone(), record);
        }
        Ok(store)
    }

    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    pub fn comparator(&self) -> Option<&Comparator<L>> {
        self.comparator.as_ref()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Ids in insertion order
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Records in insertion order
    pub fn records(&self) -> impl Iterator<Item = &SnapshotRecord<L>> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Get a record by ID
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record has this id.
    pub fn record(&self, id: &str) -> Result<&SnapshotRecord<L>> {
        self.records
            .get(id)
            .ok_or_else(|| SnapshotError::not_found(id))
    }

    /// Get a mutable record by ID
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record has this id.
    pub(crate) fn record_mut(&mut self, id: &str) -> Result<&mut SnapshotRecord<L>> {
        self.records
            .get_mut(id)
            .ok_or_else(|| SnapshotError::not_found(id))
    }

    /// Insert a record, evicting or rejecting at capacity
    ///
    /// Below capacity the record is appended. At capacity:
    /// - without a comparator the oldest record (smallest `insertion_seq`)
    ///   is evicted;
    /// - with a comparator, if the new record ranks lowest among the
    ///   `max_capacity + 1` candidates it is rejected, otherwise the single
    ///   lowest-ranked stored record is evicted.
    ///
    /// The new record is expected to carry the largest `insertion_seq`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if a record with the same id is stored.
    pub fn insert(&mut self, record: SnapshotRecord<L>) -> Result<InsertOutcome> {
        if self.records.contains_key(&record.id) {
            return Err(SnapshotError::DuplicateId {
                snapshot_id: record.id,
            });
        }

        let mut evicted = None;
        if self.order.len() >= self.max_capacity {
            let victim = match &self.comparator {
                None => self.oldest_id(),
                Some(cmp) => match self.lowest_ranked(cmp) {
                    Some(lowest) if cmp.rank(&record, lowest) == Ordering::Less => {
                        tracing::debug!(
                            snapshot_id = %record.id,
                            lowest_id = %lowest.id,
                            "insert rejected: ranks below every stored snapshot"
                        );
                        return Ok(InsertOutcome::Rejected);
                    }
                    Some(lowest) => Some(lowest.id.clone()),
                    None => None,
                },
            };
            if let Some(victim) = victim {
                self.detach(&victim);
                tracing::debug!(
                    snapshot_id = %record.id,
                    evicted_id = %victim,
                    max_capacity = self.max_capacity,
                    "evicted snapshot to make room"
                );
                evicted = Some(victim);
            }
        }

        self.order.push(record.id.clone());
        self.records.insert(record.id.clone(), record);
        Ok(InsertOutcome::Stored { evicted })
    }

    /// Remove a record by ID
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record has this id.
    pub fn remove(&mut self, id: &str) -> Result<SnapshotRecord<L>> {
        if !self.records.contains_key(id) {
            return Err(SnapshotError::not_found(id));
        }
        self.detach(id)
            .ok_or_else(|| SnapshotError::not_found(id))
    }

    /// Ids best-first by comparator, or insertion order without one
    pub fn ranked_ids(&self) -> Vec<String> {
        match &self.comparator {
            None => self.order.clone(),
            Some(cmp) => {
                let mut ranked: Vec<&SnapshotRecord<L>> = self.records().collect();
                ranked.sort_by(|a, b| cmp.rank(b, a));
                ranked.into_iter().map(|r| r.id.clone()).collect()
            }
        }
    }

    fn oldest_id(&self) -> Option<String> {
        self.records()
            .min_by_key(|r| r.insertion_seq)
            .map(|r| r.id.clone())
    }

    fn lowest_ranked<'a>(&'a self, cmp: &Comparator<L>) -> Option<&'a SnapshotRecord<L>> {
        self.records().min_by(|a, b| cmp.rank(a, b))
    }

    // Removes from both the ordering list and the mapping
    fn detach(&mut self, id: &str) -> Option<SnapshotRecord<L>> {
        let record = self.records.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(record)
    }
}

impl<L: Clone> SnapshotStore<L> {
    /// Tree handle for `id`, isolated when `copy` is true
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record has this id.
    pub fn get(&self, id: &str, copy: bool) -> Result<TreeHandle<L>> {
        Ok(self.record(id)?.tree.share_or_copy(copy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Metadata;
    use crate::tree::Tree;
    use std::collections::BTreeSet;

    fn record(id: &str, accuracy: f64, seq: u64) -> SnapshotRecord<i32> {
        SnapshotRecord::new(
            id.to_string(),
            TreeHandle::new(Tree::leaf(seq as i32)),
            Metadata::new().with("accuracy", accuracy),
            BTreeSet::new(),
            seq,
        )
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result = SnapshotStore::<i32>::new(0);
        assert!(matches!(
            result,
            Err(SnapshotError::InvalidCapacity { requested: 0 })
        ));
    }

    #[test]
    fn test_fifo_evicts_oldest() {
        let mut store = SnapshotStore::new(2).unwrap();
        store.insert(record("a", 0.0, 0)).unwrap();
        store.insert(record("b", 0.0, 1)).unwrap();
        let outcome = store.insert(record("c", 0.0, 2)).unwrap();

        assert_eq!(
            outcome,
            InsertOutcome::Stored {
                evicted: Some("a".to_string())
            }
        );
        assert_eq!(store.ids(), ["b".to_string(), "c".to_string()]);
        assert!(!store.contains("a"));
    }

    #[test]
    fn test_ranked_rejects_lowest_newcomer() {
        let mut store = SnapshotStore::new(2)
            .unwrap()
            .with_comparator(Comparator::by_metadata_key("accuracy"));
        store.insert(record("a", 0.5, 0)).unwrap();
        store.insert(record("b", 0.7, 1)).unwrap();

        let outcome = store.insert(record("c", 0.4, 2)).unwrap();
        assert_eq!(outcome, InsertOutcome::Rejected);
        assert_eq!(store.ids(), ["a".to_string(), "b".to_string()]);
        assert!(!store.contains("c"));
    }

    #[test]
    fn test_ranked_tie_evicts_earlier_record() {
        let mut store = SnapshotStore::new(2)
            .unwrap()
            .with_comparator(Comparator::by_metadata_key("accuracy"));
        store.insert(record("a", 0.5, 0)).unwrap();
        store.insert(record("b", 0.5, 1)).unwrap();

        let outcome = store.insert(record("c", 0.5, 2)).unwrap();
        assert_eq!(
            outcome,
            InsertOutcome::Stored {
                evicted: Some("a".to_string())
            }
        );
        assert_eq!(store.ranked_ids(), vec!["c", "b"]);
    }

    #[test]
    fn test_duplicate_insert_leaves_store_unchanged() {
        let mut store = SnapshotStore::new(3).unwrap();
        store.insert(record("a", 0.0, 0)).unwrap();
        let result = store.insert(record("a", 1.0, 1));
        assert!(matches!(result, Err(SnapshotError::DuplicateId { .. })));
        assert_eq!(store.len(), 1);
        assert_eq!(store.record("a").unwrap().insertion_seq(), 0);
    }

    #[test]
    fn test_remove_keeps_order_and_map_consistent() {
        let mut store = SnapshotStore::new(3).unwrap();
        store.insert(record("a", 0.0, 0)).unwrap();
        store.insert(record("b", 0.0, 1)).unwrap();

        let removed = store.remove("a").unwrap();
        assert_eq!(removed.id(), "a");
        assert_eq!(store.ids(), ["b".to_string()]);
        assert!(matches!(store.remove("a"), Err(SnapshotError::NotFound { .. })));
    }

    #[test]
    fn test_get_honors_copy_flag() {
        let mut store = SnapshotStore::new(1).unwrap();
        store.insert(record("a", 0.0, 7)).unwrap();

        let shared = store.get("a", false).unwrap();
        let isolated = store.get("a", true).unwrap();
        let stored = store.record("a").unwrap().handle();
        assert!(TreeHandle::ptr_eq(&shared, stored));
        assert!(!TreeHandle::ptr_eq(&isolated, stored));
        assert_eq!(isolated.to_tree(), Tree::leaf(7));
    }
}
