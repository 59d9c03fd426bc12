//! Optimistic Concurrency Tests
//!
//! Version-conflict detection across units of work sharing one store, and
//! the full-scan contract used for rebuild/reindex.

use std::sync::Arc;

use serde_json::json;

use quilt::model::{convention, Capability, ConventionMixin, ModelBuilder};
use quilt::{
    CompositeModel, EntityReference, EntityStore, EntityStoreError, MemoryEntityStore,
    UnitOfWorkError, UnitOfWorkFactory, UnitOfWorkStatus,
};

fn person_model() -> Arc<CompositeModel> {
    Arc::new(
        ModelBuilder::new("Person")
            .capability(Capability::new("Named").method("getName").method("setName"))
            .mixin(convention::applies, ConventionMixin)
            .build()
            .unwrap(),
    )
}

/// Commits "E" through enough transactions to reach the given version.
fn seed_entity_at_version(
    factory: &UnitOfWorkFactory,
    model: &Arc<CompositeModel>,
    identity: &str,
    version: u64,
) {
    let uow = factory.new_unit_of_work();
    uow.create_with_identity(model, EntityReference::new(identity))
        .unwrap();
    uow.complete().unwrap();

    for round in 1..version {
        let uow = factory.new_unit_of_work();
        let handle = uow.get(model, &EntityReference::new(identity)).unwrap();
        handle
            .invoke("setName", &[json!(format!("round-{}", round))])
            .unwrap();
        uow.complete().unwrap();
    }
}

// =============================================================================
// Stale Write Detection
// =============================================================================

/// A loads "E" at version 3; B loads, mutates, and commits "E" to
/// version 4; A's stale commit fails with a concurrent-modification error
/// and the store keeps B's version 4.
#[test]
fn test_stale_unit_of_work_commit_is_rejected() {
    let store = Arc::new(MemoryEntityStore::new());
    let factory = UnitOfWorkFactory::new(store.clone());
    let model = person_model();
    seed_entity_at_version(&factory, &model, "E", 3);

    let a = factory.new_unit_of_work();
    let a_handle = a.get(&model, &EntityReference::new("E")).unwrap();
    assert_eq!(a_handle.version(), 3);

    let b = factory.new_unit_of_work();
    let b_handle = b.get(&model, &EntityReference::new("E")).unwrap();
    b_handle.invoke("setName", &[json!("from-b")]).unwrap();
    b.complete().unwrap();

    a_handle.invoke("setName", &[json!("from-a")]).unwrap();
    let watcher = a.clone();
    let err = a.complete().unwrap_err();
    assert!(matches!(
        err,
        UnitOfWorkError::Store(EntityStoreError::ConcurrentModification {
            expected: 3,
            actual: 4,
            ..
        })
    ));
    assert_eq!(watcher.status(), UnitOfWorkStatus::Discarded);

    let durable = store.entity_state(&EntityReference::new("E")).unwrap();
    assert_eq!(durable.version(), 4);
    assert_eq!(durable.state().get("name"), Some(&json!("from-b")));
}

/// After a conflict, a retry in a fresh unit of work succeeds against the
/// new version.
#[test]
fn test_retry_in_fresh_unit_of_work_succeeds() {
    let store = Arc::new(MemoryEntityStore::new());
    let factory = UnitOfWorkFactory::new(store.clone());
    let model = person_model();
    seed_entity_at_version(&factory, &model, "E", 2);

    let stale = factory.new_unit_of_work();
    let stale_handle = stale.get(&model, &EntityReference::new("E")).unwrap();

    let winner = factory.new_unit_of_work();
    let winner_handle = winner.get(&model, &EntityReference::new("E")).unwrap();
    winner_handle.invoke("setName", &[json!("winner")]).unwrap();
    winner.complete().unwrap();

    stale_handle.invoke("setName", &[json!("loser")]).unwrap();
    assert!(stale.complete().is_err());

    let retry = factory.new_unit_of_work();
    let retry_handle = retry.get(&model, &EntityReference::new("E")).unwrap();
    retry_handle.invoke("setName", &[json!("retried")]).unwrap();
    retry.complete().unwrap();

    let durable = store.entity_state(&EntityReference::new("E")).unwrap();
    assert_eq!(durable.state().get("name"), Some(&json!("retried")));
    assert_eq!(durable.version(), 4);
}

/// Removing an entity that a concurrent writer already removed fails
/// without partial effects.
#[test]
fn test_double_removal_is_detected() {
    let store = Arc::new(MemoryEntityStore::new());
    let factory = UnitOfWorkFactory::new(store.clone());
    let model = person_model();
    seed_entity_at_version(&factory, &model, "E", 1);

    let a = factory.new_unit_of_work();
    let a_handle = a.get(&model, &EntityReference::new("E")).unwrap();

    let b = factory.new_unit_of_work();
    let b_handle = b.get(&model, &EntityReference::new("E")).unwrap();
    b.remove(&b_handle).unwrap();
    b.complete().unwrap();

    a.remove(&a_handle).unwrap();
    let err = a.complete().unwrap_err();
    assert!(matches!(
        err,
        UnitOfWorkError::Store(EntityStoreError::NotFound(_))
    ));
}

// =============================================================================
// Full Scan
// =============================================================================

/// iter() yields every durable entity exactly once with its current
/// version, and reflects removals.
#[test]
fn test_full_scan_matches_durable_state() {
    let store = Arc::new(MemoryEntityStore::new());
    let factory = UnitOfWorkFactory::new(store.clone());
    let model = person_model();

    seed_entity_at_version(&factory, &model, "a", 2);
    seed_entity_at_version(&factory, &model, "b", 1);
    seed_entity_at_version(&factory, &model, "c", 1);

    let uow = factory.new_unit_of_work();
    let c = uow.get(&model, &EntityReference::new("c")).unwrap();
    uow.remove(&c).unwrap();
    uow.complete().unwrap();

    let mut scanned: Vec<(String, u64)> = store
        .iter()
        .map(|state| {
            let state = state.unwrap();
            (state.identity().to_string(), state.version())
        })
        .collect();
    scanned.sort();

    assert_eq!(scanned, vec![("a".to_string(), 2), ("b".to_string(), 1)]);
}
