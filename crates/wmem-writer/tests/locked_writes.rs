//! Overwrites under overwrite locks and the one-time consistency check

mod common;

use assert_matches::assert_matches;
use common::{addr, observation, Harness, PARTITION};
use std::sync::Arc;
use wmem_core::{ConsistencyAuthority, WmError, WriterConfig};
use wmem_testkit::{MemoryWorkingMemory, ScriptedAuthority};
use wmem_writer::{PermissiveAuthority, VersionConsistency, VersionTracker, WriteCoordinator};

#[tokio::test]
async fn lock_without_pending_flag_never_checks() {
    let h = Harness::new();
    h.writer.add("x", observation("cup", 1)).await.unwrap();
    h.authority.grant_overwrite_lock(&addr("x"));
    // flag already cleared by an earlier check
    h.authority.mark_consistency_checked(&addr("x")).await.unwrap();

    for confidence in 2..5 {
        h.writer.overwrite("x", observation("cup", confidence)).await.unwrap();
    }

    let calls = h.authority.calls();
    assert_eq!(calls.check_consistency, 0);
    assert_eq!(calls.is_overwritable, 0);
    assert_eq!(h.version("x"), Some(3));
}

#[tokio::test]
async fn pending_flag_checks_exactly_once_per_lock() {
    let h = Harness::new();
    h.writer.add("x", observation("cup", 1)).await.unwrap();
    h.authority.grant_overwrite_lock(&addr("x"));
    assert!(h.authority.is_pending(&addr("x")));

    h.writer.overwrite("x", observation("cup", 2)).await.unwrap();
    h.writer.overwrite("x", observation("cup", 3)).await.unwrap();
    h.writer.overwrite("x", observation("cup", 4)).await.unwrap();

    assert_eq!(h.authority.calls().check_consistency, 1);
    assert_eq!(h.authority.calls().mark_consistency_checked, 1);
    assert!(!h.authority.is_pending(&addr("x")));

    // release and re-acquire: one more check
    h.authority.release_overwrite_lock(&addr("x"));
    h.authority.grant_overwrite_lock(&addr("x"));
    h.writer.overwrite("x", observation("cup", 5)).await.unwrap();
    h.writer.overwrite("x", observation("cup", 6)).await.unwrap();

    assert_eq!(h.authority.calls().check_consistency, 2);
    assert_eq!(h.version("x"), Some(5));
}

#[tokio::test]
async fn failed_locked_check_keeps_the_flag() {
    let h = Harness::new();
    h.writer.add("x", observation("cup", 1)).await.unwrap();
    h.authority.grant_overwrite_lock(&addr("x"));
    h.authority.mark_stale(&addr("x"));

    assert_matches!(
        h.writer.overwrite("x", observation("cup", 2)).await,
        Err(WmError::Consistency { .. })
    );
    assert!(h.authority.is_pending(&addr("x")));
    assert_eq!(h.store.calls().overwrite, 0);
    assert_eq!(h.version("x"), Some(0));

    h.authority.mark_fresh(&addr("x"));
    h.writer.overwrite("x", observation("cup", 2)).await.unwrap();
    assert!(!h.authority.is_pending(&addr("x")));
    assert_eq!(h.authority.calls().check_consistency, 2);
}

#[tokio::test]
async fn lock_bypasses_overwrite_policy() {
    let h = Harness::new();
    h.writer.add("x", observation("cup", 1)).await.unwrap();
    h.authority.forbid_overwrite(&addr("x"));
    h.authority.grant_overwrite_lock(&addr("x"));

    h.writer.overwrite("x", observation("cup", 2)).await.unwrap();
    assert_eq!(h.authority.calls().is_overwritable, 0);
}

fn strict_writer(
    store: &MemoryWorkingMemory,
    locks: &ScriptedAuthority,
) -> (WriteCoordinator, Arc<VersionConsistency>) {
    wmem_testkit::init_tracing();
    let tracker = Arc::new(VersionTracker::new());
    let consistency = Arc::new(VersionConsistency::new(
        tracker.clone(),
        Arc::new(store.clone()),
    ));
    let writer = WriteCoordinator::new(
        WriterConfig::new("planner", 2, PARTITION),
        Arc::new(store.clone()),
        Arc::new(locks.clone()),
        consistency.clone(),
    )
    .unwrap()
    .with_version_tracker(tracker);
    (writer, consistency)
}

#[tokio::test]
async fn version_consistency_detects_foreign_overwrites() {
    let store = MemoryWorkingMemory::remote();
    let (writer, _) = strict_writer(&store, &ScriptedAuthority::new());

    writer.add("x", observation("cup", 1)).await.unwrap();
    writer.overwrite("x", observation("cup", 2)).await.unwrap();
    assert_eq!(writer.versions().current_version("x", PARTITION).unwrap(), 1);

    store.overwrite_foreign(&addr("x"), "vision").unwrap();

    assert_matches!(
        writer.overwrite("x", observation("cup", 3)).await,
        Err(WmError::Consistency { .. })
    );
    assert_eq!(store.entry(&addr("x")).unwrap().writer_id, "vision");
    assert_eq!(writer.versions().current_version("x", PARTITION).unwrap(), 1);
}

#[tokio::test]
async fn version_consistency_refuses_entries_never_seen() {
    let store = MemoryWorkingMemory::remote();
    let (writer, _) = strict_writer(&store, &ScriptedAuthority::new());
    store.insert_foreign(&addr("x"), "vision", wmem_core::EntryPayload::Encoded(vec![1]));

    assert_matches!(
        writer.overwrite("x", observation("cup", 3)).await,
        Err(WmError::Consistency { .. })
    );
}

#[tokio::test]
async fn version_consistency_survives_delete_and_re_add() {
    let store = MemoryWorkingMemory::remote();
    let (writer, _) = strict_writer(&store, &ScriptedAuthority::new());

    writer.add("x", observation("cup", 1)).await.unwrap();
    writer.delete("x").await.unwrap();
    writer.add("x", observation("cup", 2)).await.unwrap();

    // local and store histories both say 1
    writer.overwrite("x", observation("cup", 3)).await.unwrap();
    assert_eq!(writer.versions().current_version("x", PARTITION).unwrap(), 2);
}

#[tokio::test]
async fn version_consistency_failed_check_under_lock_stays_pending() {
    let store = MemoryWorkingMemory::remote();
    let locks = ScriptedAuthority::new();
    let (writer, consistency) = strict_writer(&store, &locks);

    writer.add("x", observation("cup", 1)).await.unwrap();
    locks.grant_overwrite_lock(&addr("x"));
    consistency.mark_pending(&addr("x"));
    store.overwrite_foreign(&addr("x"), "vision").unwrap();

    assert_matches!(
        writer.overwrite("x", observation("cup", 2)).await,
        Err(WmError::Consistency { .. })
    );
    assert!(consistency.is_pending(&addr("x")));
    assert_eq!(store.entry(&addr("x")).unwrap().writer_id, "vision");
}

#[tokio::test]
async fn version_consistency_trusts_lock_holder_after_one_check() {
    let store = MemoryWorkingMemory::remote();
    let locks = ScriptedAuthority::new();
    let (writer, consistency) = strict_writer(&store, &locks);

    writer.add("x", observation("cup", 1)).await.unwrap();
    locks.grant_overwrite_lock(&addr("x"));
    consistency.mark_pending(&addr("x"));

    writer.overwrite("x", observation("cup", 2)).await.unwrap();
    assert!(!consistency.is_pending(&addr("x")));

    // no check while the lock is held, so a foreign bump goes unnoticed
    store.overwrite_foreign(&addr("x"), "vision").unwrap();
    writer.overwrite("x", observation("cup", 3)).await.unwrap();
    assert_eq!(store.entry(&addr("x")).unwrap().writer_id, "planner");
    assert_eq!(writer.versions().current_version("x", PARTITION).unwrap(), 2);
}

#[tokio::test]
async fn permissive_authority_allows_everything() {
    let store = MemoryWorkingMemory::remote();
    let writer = WriteCoordinator::new(
        WriterConfig::new("solo", 1, PARTITION),
        Arc::new(store.clone()),
        Arc::new(PermissiveAuthority),
        Arc::new(PermissiveAuthority),
    )
    .unwrap();

    writer.add("x", observation("cup", 1)).await.unwrap();
    store.overwrite_foreign(&addr("x"), "vision").unwrap();
    writer.overwrite("x", observation("cup", 2)).await.unwrap();
    writer.delete("x").await.unwrap();
    assert!(store.is_empty());
}
