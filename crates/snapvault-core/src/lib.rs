//! SnapVault Core - bounded in-memory snapshot store for nested value trees
//!
//! This crate provides:
//! - Generic value trees with flatten/unflatten, leaf-wise map and zip-combine
//! - A bounded snapshot store with FIFO or comparator-ranked eviction
//! - Composable metadata/tag/content queries
//! - Whole-state persistence with a digest-checked JSON payload
//! - The `SnapshotManager` façade composing all of the above
//!
//! # Example
//!
//! ```
//! use snapvault_core::{ManagerConfig, SaveOptions, SnapshotManager, Tree};
//!
//! let mut manager: SnapshotManager<f64> =
//!     SnapshotManager::new(ManagerConfig::default().with_max_capacity(2)).unwrap();
//! let id = manager
//!     .save_tree(Tree::sequence([Tree::leaf(1.0), Tree::leaf(2.0)]), SaveOptions::new())
//!     .unwrap();
//! assert_eq!(manager.get_tree(&id).unwrap().leaf_count(), 2);
//! ```

pub mod config;
pub mod errors;
pub mod logging_facility;
pub mod manager;
pub mod model;
pub mod ops;
pub mod persist;
pub mod queries;
pub mod ranking;
pub mod tree;

// Re-export commonly used types
pub use config::ManagerConfig;
pub use errors::{ExError, ExErrorKind, Result, SnapshotError};
pub use manager::{SaveOptions, SaveReceipt, SnapshotManager};
pub use model::{Metadata, SnapshotRecord};
pub use ops::{InsertOutcome, SnapshotStore};
pub use persist::{RecordPayload, StateBody};
pub use queries::{LeafPredicate, Query, QueryEngine, TreePredicate};
pub use ranking::{Comparator, ComparatorRegistry, FitnessComparator};
pub use tree::{LeafCombiner, Tree, TreeDef, TreeHandle};
