//! Fitness comparators and the registry that resolves them by name
//!
//! A comparator decides which snapshots survive capacity pressure. Closures
//! cannot be persisted, so every comparator carries a stable name; the
//! persisted state stores that name and `load_state` resolves it through a
//! [`ComparatorRegistry`].

use crate::errors::{Result, SnapshotError};
use crate::model::SnapshotRecord;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Name prefix of the built-in metadata comparators
pub const METADATA_COMPARATOR_PREFIX: &str = "metadata:";

/// Three-way fitness comparison over two records
///
/// `Greater` means `a` is fitter than `b`. Implementations must be a strict
/// total order over fitness; equal fitness is resolved by insertion order
/// (see [`Comparator::rank`]). Implemented for every matching closure.
pub trait FitnessComparator<L>: Send + Sync {
    fn compare(&self, a: &SnapshotRecord<L>, b: &SnapshotRecord<L>) -> Ordering;
}

impl<L, F> FitnessComparator<L> for F
where
    F: Fn(&SnapshotRecord<L>, &SnapshotRecord<L>) -> Ordering + Send + Sync,
{
    fn compare(&self, a: &SnapshotRecord<L>, b: &SnapshotRecord<L>) -> Ordering {
        self(a, b)
    }
}

/// A named fitness comparator
pub struct Comparator<L> {
    name: String,
    cmp: Arc<dyn FitnessComparator<L>>,
}

impl<L: 'static> Comparator<L> {
    /// Wrap a caller-defined comparison under a stable name
    pub fn new<F>(name: impl Into<String>, cmp: F) -> Self
    where
        F: FitnessComparator<L> + 'static,
    {
        Self {
            name: name.into(),
            cmp: Arc::new(cmp),
        }
    }

    /// Ascending fitness by a numeric metadata value
    ///
    /// Missing or non-numeric values count as `0`. Named `metadata:<key>`,
    /// which every registry resolves without prior registration.
    pub fn by_metadata_key(key: impl Into<String>) -> Self {
        let key = key.into();
        let name = format!("{}{}", METADATA_COMPARATOR_PREFIX, key);
        Self::new(name, move |a: &SnapshotRecord<L>, b: &SnapshotRecord<L>| {
            let fa = a.metadata().get_f64(&key).unwrap_or(0.0);
            let fb = b.metadata().get_f64(&key).unwrap_or(0.0);
            fa.total_cmp(&fb)
        })
    }
}

impl<L> Comparator<L> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw fitness comparison
    pub fn compare(&self, a: &SnapshotRecord<L>, b: &SnapshotRecord<L>) -> Ordering {
        self.cmp.compare(a, b)
    }

    /// Retention order: fitness first, then insertion order
    ///
    /// Never returns `Equal` for distinct records. Among equally fit records
    /// the earlier-inserted one ranks lower and is evicted first.
    pub fn rank(&self, a: &SnapshotRecord<L>, b: &SnapshotRecord<L>) -> Ordering {
        self.compare(a, b)
            .then_with(|| a.insertion_seq().cmp(&b.insertion_seq()))
    }
}

impl<L> Clone for Comparator<L> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            cmp: Arc::clone(&self.cmp),
        }
    }
}

impl<L> fmt::Debug for Comparator<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comparator").field("name", &self.name).finish()
    }
}

/// Resolves persisted comparator names back to comparators
pub struct ComparatorRegistry<L> {
    entries: HashMap<String, Comparator<L>>,
}

impl<L: 'static> ComparatorRegistry<L> {
    /// Registry that only knows the built-in `metadata:<key>` family
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Builder-style [`ComparatorRegistry::register`]
    pub fn with(mut self, comparator: Comparator<L>) -> Self {
        self.register(comparator);
        self
    }

    /// Register a comparator under its own name, replacing any previous one
    pub fn register(&mut self, comparator: Comparator<L>) {
        self.entries.insert(comparator.name.clone(), comparator);
    }

    /// Look up a comparator by name
    ///
    /// Registered names win over the built-in family.
    ///
    /// # Errors
    ///
    /// Returns `UnknownComparator` if the name is neither registered nor a
    /// `metadata:<key>` name with a non-empty key.
    pub fn resolve(&self, name: &str) -> Result<Comparator<L>> {
        if let Some(found) = self.entries.get(name) {
            return Ok(found.clone());
        }
        match name.strip_prefix(METADATA_COMPARATOR_PREFIX) {
            Some(key) if !key.is_empty() => Ok(Comparator::by_metadata_key(key)),
            _ => Err(SnapshotError::UnknownComparator {
                name: name.to_string(),
            }),
        }
    }
}

impl<L: 'static> Default for ComparatorRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}
