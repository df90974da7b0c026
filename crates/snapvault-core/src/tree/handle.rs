//! Shared tree handles.

use super::Tree;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Reference-counted, lockable value tree
///
/// Cloning a handle shares the tree: writes through one clone are visible
/// through every other. [`TreeHandle::deep_copy`] yields an isolated handle.
/// This is how the store honors a disabled copy policy: the record and the
/// caller hold clones of one handle.
///
/// The lock is not reentrant. While a guard from [`TreeHandle::write`] is
/// alive, any manager call that reads or writes the same tree blocks, and on
/// the guard's own thread it deadlocks: content and leaf-value queries,
/// `combine_snapshots`, `update_leaf_nodes` and `get_tree`. A read guard
/// likewise blocks `update_leaf_nodes`. Drop the guard first.
#[derive(Debug)]
pub struct TreeHandle<L> {
    inner: Arc<RwLock<Tree<L>>>,
}

impl<L> TreeHandle<L> {
    pub fn new(tree: Tree<L>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    /// Shared read access
    ///
    /// A panic in another holder never poisons the tree for readers.
    pub fn read(&self) -> RwLockReadGuard<'_, Tree<L>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive write access
    pub fn write(&self) -> RwLockWriteGuard<'_, Tree<L>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether two handles share one tree
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl<L: Clone> TreeHandle<L> {
    /// Isolated handle holding a copy of the current tree
    pub fn deep_copy(&self) -> Self {
        Self::new(self.to_tree())
    }

    /// Owned copy of the current tree
    pub fn to_tree(&self) -> Tree<L> {
        self.read().clone()
    }

    /// Share when `copy` is false, isolate when it is true
    pub(crate) fn share_or_copy(&self, copy: bool) -> Self {
        if copy {
            self.deep_copy()
        } else {
            self.clone()
        }
    }
}

impl<L> Clone for TreeHandle<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L> From<Tree<L>> for TreeHandle<L> {
    fn from(tree: Tree<L>) -> Self {
        Self::new(tree)
    }
}
