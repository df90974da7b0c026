//! Composable read-only queries over the snapshot store
//!
//! Key principles:
//! - Queries never mutate records
//! - Evaluation re-scans the store's current contents, nothing is cached
//! - Results are id sets with deterministic (sorted) iteration order

pub mod engine;
pub mod query;

pub use engine::QueryEngine;
pub use query::{LeafPredicate, Query, TreePredicate};
