//! Query evaluation

use super::query::Query;
use crate::model::SnapshotRecord;
use crate::ops::SnapshotStore;
use serde_json::{Number, Value};
use std::collections::BTreeSet;

/// Evaluates [`Query`] trees against a store's current contents
///
/// Each record is tested independently, so `And`/`Or`/`Not` reduce to
/// intersection, union and complement over the store's id set.
pub struct QueryEngine<'a, L> {
    store: &'a SnapshotStore<L>,
}

impl<'a, L> QueryEngine<'a, L> {
    pub fn new(store: &'a SnapshotStore<L>) -> Self {
        Self { store }
    }

    /// Ids of every record matching `query`
    pub fn evaluate(&self, query: &Query<L>) -> BTreeSet<String> {
        let matched: BTreeSet<String> = self
            .store
            .records()
            .filter(|record| matches(query, record))
            .map(|record| record.id().to_string())
            .collect();
        tracing::debug!(
            scanned = self.store.len(),
            matched = matched.len(),
            "query evaluated"
        );
        matched
    }

    /// Ids of matching records in storage order
    pub fn evaluate_ordered(&self, query: &Query<L>) -> Vec<String> {
        self.store
            .records()
            .filter(|record| matches(query, record))
            .map(|record| record.id().to_string())
            .collect()
    }
}

/// Whether one record satisfies `query`
pub fn matches<L>(query: &Query<L>, record: &SnapshotRecord<L>) -> bool {
    match query {
        Query::ByMetadata { key, value } => record
            .metadata()
            .get(key)
            .is_some_and(|stored| values_equal(stored, value)),
        Query::ByTag(tag) => record.has_tag(tag),
        Query::ByContent(predicate) => predicate.test(&record.tree()),
        Query::ByLeafValue(predicate) => record
            .tree()
            .leaves()
            .into_iter()
            .any(|leaf| predicate.test(leaf)),
        Query::And(children) => children.iter().all(|child| matches(child, record)),
        Query::Or(children) => children.iter().any(|child| matches(child, record)),
        Query::Not(inner) => !matches(inner, record),
    }
}

/// Structural equality where numbers compare by value, so `42 == 42.0`
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    if !a.is_f64() && !b.is_f64() {
        return false;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Metadata;
    use crate::tree::{Tree, TreeHandle};

    fn store() -> SnapshotStore<f64> {
        let mut store = SnapshotStore::new(10).unwrap();
        let rows = [
            ("a", vec![1.0, 2.0], 0.5, &["best"][..]),
            ("b", vec![4.0, 5.0], 0.7, &[][..]),
            ("c", vec![7.0, -8.0], 0.7, &["best", "late"][..]),
        ];
        for (seq, (id, leaves, acc, tags)) in rows.into_iter().enumerate() {
            let tree = Tree::sequence(leaves.into_iter().map(Tree::leaf));
            store
                .insert(SnapshotRecord::new(
                    id.to_string(),
                    TreeHandle::new(tree),
                    Metadata::new().with("accuracy", acc),
                    tags.iter().map(|t| t.to_string()).collect(),
                    seq as u64,
                ))
                .unwrap();
        }
        store
    }

    fn ids(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_by_metadata_and_tag() {
        let store = store();
        let engine = QueryEngine::new(&store);
        assert_eq!(engine.evaluate(&Query::by_metadata("accuracy", 0.7)), ids(&["b", "c"]));
        assert_eq!(engine.evaluate(&Query::by_metadata("missing", 0.7)), ids(&[]));
        assert_eq!(engine.evaluate(&Query::by_tag("best")), ids(&["a", "c"]));
    }

    #[test]
    fn test_metadata_numbers_compare_by_value() {
        assert!(values_equal(&Value::from(42), &Value::from(42.0)));
        assert!(values_equal(&Value::from(u64::MAX), &Value::from(u64::MAX)));
        assert!(!values_equal(&Value::from(-1), &Value::from(u64::MAX)));
        assert!(!values_equal(&Value::from(42), &Value::from(42.5)));
        assert!(!values_equal(&Value::from(1), &Value::from(true)));
        assert!(values_equal(
            &serde_json::json!({"lr": [1, 2.5], "name": "adam"}),
            &serde_json::json!({"name": "adam", "lr": [1.0, 2.5]})
        ));
    }

    #[test]
    fn test_leaf_and_content_predicates() {
        let store = store();
        let engine = QueryEngine::new(&store);
        let negative = Query::by_leaf_value(|x: &f64| *x < 0.0);
        assert_eq!(engine.evaluate(&negative), ids(&["c"]));

        let starts_big = Query::by_content(|t: &Tree<f64>| {
            t.index(0).and_then(Tree::as_leaf).is_some_and(|x| *x > 3.0)
        });
        assert_eq!(engine.evaluate(&starts_big), ids(&["b", "c"]));
    }

    #[test]
    fn test_empty_combinators() {
        let store = store();
        let engine = QueryEngine::new(&store);
        assert_eq!(engine.evaluate(&Query::And(vec![])), ids(&["a", "b", "c"]));
        assert_eq!(engine.evaluate(&Query::Or(vec![])), ids(&[]));
        assert_eq!(engine.evaluate(&!Query::Or(vec![])), ids(&["a", "b", "c"]));
    }

    #[test]
    fn test_composition() {
        let store = store();
        let engine = QueryEngine::new(&store);
        let q = Query::and([Query::by_tag("best"), !Query::by_tag("late")]);
        assert_eq!(engine.evaluate(&q), ids(&["a"]));
        let q = Query::or([Query::by_tag("late"), Query::by_metadata("accuracy", 0.5)]);
        assert_eq!(engine.evaluate_ordered(&q), vec!["a", "c"]);
    }
}
