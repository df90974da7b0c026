//! Comparator-ranked eviction scenarios

mod common;

use common::{accuracy_manager, param_tree, scored};
use snapvault_core::{
    Comparator, InsertOutcome, ManagerConfig, SaveOptions, SnapshotError, SnapshotManager,
    SnapshotRecord, Tree,
};
use std::cmp::Ordering;

fn filled_to_capacity() -> SnapshotManager<f64> {
    let mut manager = accuracy_manager(3);
    manager.save_tree(param_tree(&[1.0]), scored("snap1", 0.5)).unwrap();
    manager.save_tree(param_tree(&[2.0]), scored("snap2", 0.7)).unwrap();
    manager.save_tree(param_tree(&[3.0]), scored("snap3", 0.6)).unwrap();
    manager
}

#[test]
fn test_scenario_a_lowest_ranked_is_evicted() {
    // GIVEN capacity 3 holding accuracies 0.5, 0.7, 0.6
    let mut manager = filled_to_capacity();

    // WHEN a better snapshot arrives
    let receipt = manager
        .save_snapshot_detailed(&param_tree(&[4.0]).into(), scored("snap4", 0.8))
        .unwrap();

    // THEN the 0.5 snapshot made room
    assert_eq!(
        receipt.outcome,
        InsertOutcome::Stored {
            evicted: Some("snap1".to_string())
        }
    );
    assert_eq!(manager.get_ranked_snapshots(), vec!["snap4", "snap2", "snap3"]);
    assert!(matches!(
        manager.get_snapshot("snap1", None),
        Err(SnapshotError::NotFound { .. })
    ));
}

#[test]
fn test_scenario_b_worse_snapshot_is_rejected_silently() {
    let mut manager = filled_to_capacity();
    manager.save_tree(param_tree(&[4.0]), scored("snap4", 0.8)).unwrap();
    let before = manager.get_ranked_snapshots();

    // WHEN saving a snapshot worse than every stored one
    let id = manager.save_tree(param_tree(&[5.0]), scored("snap5", 0.4)).unwrap();

    // THEN the id comes back, nothing changes and the id is not retrievable
    assert_eq!(id, "snap5");
    assert_eq!(manager.get_ranked_snapshots(), before);
    assert_eq!(manager.len(), 3);
    assert!(matches!(
        manager.get_snapshot("snap5", None),
        Err(SnapshotError::NotFound { .. })
    ));
}

#[test]
fn test_detailed_save_reports_rejection() {
    let mut manager = filled_to_capacity();

    let receipt = manager
        .save_snapshot_detailed(&param_tree(&[0.0]).into(), scored("weak", 0.1))
        .unwrap();

    assert_eq!(receipt.id, "weak");
    assert_eq!(receipt.outcome, InsertOutcome::Rejected);
    assert!(!receipt.is_stored());
}

#[test]
fn test_equal_fitness_newcomer_evicts_oldest_tie() {
    // GIVEN a full store where the two lowest tie at 0.5
    let mut manager = accuracy_manager(2);
    manager.save_tree(param_tree(&[1.0]), scored("old", 0.5)).unwrap();
    manager.save_tree(param_tree(&[2.0]), scored("mid", 0.5)).unwrap();

    // WHEN a third 0.5 arrives
    let receipt = manager
        .save_snapshot_detailed(&param_tree(&[3.0]).into(), scored("new", 0.5))
        .unwrap();

    // THEN the earliest-inserted tie is evicted, never the newcomer
    assert_eq!(
        receipt.outcome,
        InsertOutcome::Stored {
            evicted: Some("old".to_string())
        }
    );
    assert_eq!(manager.get_ranked_snapshots(), vec!["new", "mid"]);
}

#[test]
fn test_missing_metadata_ranks_as_zero() {
    let mut manager = accuracy_manager(2);
    manager.save_tree(param_tree(&[1.0]), scored("scored", 0.3)).unwrap();
    manager
        .save_tree(param_tree(&[2.0]), SaveOptions::new().with_id("unscored"))
        .unwrap();

    assert_eq!(manager.get_ranked_snapshots(), vec!["scored", "unscored"]);

    let receipt = manager
        .save_snapshot_detailed(&param_tree(&[3.0]).into(), scored("neg", -1.0))
        .unwrap();
    assert_eq!(receipt.outcome, InsertOutcome::Rejected);
}

#[test]
fn test_ranked_list_is_descending_after_updates() {
    let mut manager = accuracy_manager(5);
    for (i, acc) in [0.3, 0.9, 0.1, 0.5].iter().enumerate() {
        manager
            .save_tree(param_tree(&[i as f64]), scored(&format!("s{}", i), *acc))
            .unwrap();
    }
    assert_eq!(manager.get_ranked_snapshots(), vec!["s1", "s3", "s0", "s2"]);

    // Metadata updates re-rank on the next read
    manager
        .update_metadata("s2", snapvault_core::Metadata::new().with("accuracy", 0.95))
        .unwrap();
    assert_eq!(manager.get_ranked_snapshots(), vec!["s2", "s1", "s3", "s0"]);
}

#[test]
fn test_custom_comparator() {
    // Smaller leaf count is fitter
    let compact = Comparator::new(
        "compact",
        |a: &SnapshotRecord<f64>, b: &SnapshotRecord<f64>| {
            b.tree().leaf_count().cmp(&a.tree().leaf_count())
        },
    );
    let mut manager: SnapshotManager<f64> =
        SnapshotManager::new(ManagerConfig::default().with_max_capacity(2))
            .unwrap()
            .with_comparator(compact);

    manager.save_tree(param_tree(&[1.0, 2.0, 3.0]), SaveOptions::new().with_id("big")).unwrap();
    manager.save_tree(param_tree(&[1.0]), SaveOptions::new().with_id("small")).unwrap();
    manager.save_tree(Tree::leaf(1.0), SaveOptions::new().with_id("tiny")).unwrap();

    assert_eq!(manager.get_ranked_snapshots(), vec!["tiny", "small"]);
    assert_eq!(
        manager.store().comparator().map(|c| c.name()),
        Some("compact")
    );
    let cmp = manager.store().comparator().unwrap();
    let tiny = manager.store().record("tiny").unwrap();
    let small = manager.store().record("small").unwrap();
    assert_eq!(cmp.compare(tiny, small), Ordering::Equal);
    assert_eq!(cmp.rank(tiny, small), Ordering::Greater);
}
