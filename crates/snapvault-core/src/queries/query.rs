//! Query predicates

use crate::tree::Tree;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Predicate over a whole value tree (mapping/sequence/leaf structure intact)
pub trait TreePredicate<L>: Send + Sync {
    fn test(&self, tree: &Tree<L>) -> bool;
}

impl<L, F> TreePredicate<L> for F
where
    F: Fn(&Tree<L>) -> bool + Send + Sync,
{
    fn test(&self, tree: &Tree<L>) -> bool {
        self(tree)
    }
}

/// Predicate over a single leaf
pub trait LeafPredicate<L>: Send + Sync {
    fn test(&self, leaf: &L) -> bool;
}

impl<L, F> LeafPredicate<L> for F
where
    F: Fn(&L) -> bool + Send + Sync,
{
    fn test(&self, leaf: &L) -> bool {
        self(leaf)
    }
}

/// A composable query over snapshot records
///
/// `And([])` matches every record and `Or([])` matches none. `Not` is the
/// complement relative to the ids present at evaluation time.
pub enum Query<L> {
    /// `metadata[key] == value`; a missing key never matches
    ByMetadata { key: String, value: Value },
    /// The record carries this tag
    ByTag(String),
    /// The predicate accepts the raw tree
    ByContent(Arc<dyn TreePredicate<L>>),
    /// At least one leaf satisfies the predicate
    ByLeafValue(Arc<dyn LeafPredicate<L>>),
    And(Vec<Query<L>>),
    Or(Vec<Query<L>>),
    Not(Box<Query<L>>),
}

impl<L> Query<L> {
    pub fn by_metadata(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::ByMetadata {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn by_tag(tag: impl Into<String>) -> Self {
        Query::ByTag(tag.into())
    }

    pub fn by_content<P>(predicate: P) -> Self
    where
        P: TreePredicate<L> + 'static,
    {
        Query::ByContent(Arc::new(predicate))
    }

    pub fn by_leaf_value<P>(predicate: P) -> Self
    where
        P: LeafPredicate<L> + 'static,
    {
        Query::ByLeafValue(Arc::new(predicate))
    }

    pub fn and(children: impl IntoIterator<Item = Query<L>>) -> Self {
        Query::And(children.into_iter().collect())
    }

    pub fn or(children: impl IntoIterator<Item = Query<L>>) -> Self {
        Query::Or(children.into_iter().collect())
    }

    pub fn negate(inner: Query<L>) -> Self {
        Query::Not(Box::new(inner))
    }
}

impl<L> Clone for Query<L> {
    fn clone(&self) -> Self {
        match self {
            Query::ByMetadata { key, value } => Query::ByMetadata {
                key: key.clone(),
                value: value.clone(),
            },
            Query::ByTag(tag) => Query::ByTag(tag.clone()),
            Query::ByContent(p) => Query::ByContent(Arc::clone(p)),
            Query::ByLeafValue(p) => Query::ByLeafValue(Arc::clone(p)),
            Query::And(children) => Query::And(children.clone()),
            Query::Or(children) => Query::Or(children.clone()),
            Query::Not(inner) => Query::Not(inner.clone()),
        }
    }
}

impl<L> fmt::Debug for Query<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::ByMetadata { key, value } => f
                .debug_struct("ByMetadata")
                .field("key", key)
                .field("value", value)
                .finish(),
            Query::ByTag(tag) => f.debug_tuple("ByTag").field(tag).finish(),
            Query::ByContent(_) => f.write_str("ByContent(<predicate>)"),
            Query::ByLeafValue(_) => f.write_str("ByLeafValue(<predicate>)"),
            Query::And(children) => f.debug_tuple("And").field(children).finish(),
            Query::Or(children) => f.debug_tuple("Or").field(children).finish(),
            Query::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
        }
    }
}

impl<L> std::ops::Not for Query<L> {
    type Output = Query<L>;

    fn not(self) -> Self::Output {
        Query::negate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_build_expected_variants() {
        let q: Query<f64> = Query::and([Query::by_tag("best"), !Query::by_metadata("epoch", 3)]);
        match q {
            Query::And(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(&children[0], Query::ByTag(t) if t == "best"));
                assert!(matches!(&children[1], Query::Not(_)));
            }
            other => panic!("Expected And, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_hides_closures() {
        let q: Query<f64> = Query::by_leaf_value(|x: &f64| *x > 1.0);
        assert_eq!(format!("{:?}", q), "ByLeafValue(<predicate>)");
    }
}
