//! Snapshot persistence across process restarts

use std::sync::Arc;

use coordination::model::{
    Escalation, EscalationStatus, Outcome, Patrol, PatrolStatus, Stuck, StuckStatus, Task,
};
use coordination::patrol::stuck::Assessment;
use coordination::{
    Coordinator, EntityStore, EscalationRouter, FileStore, MemoryStore, NewTask, OrcError,
    RollupOutcome,
};

fn open(path: &std::path::Path) -> Coordinator<MemoryStore> {
    Coordinator::new(
        Arc::new(MemoryStore::open(path).unwrap()),
        EscalationRouter::new("operator"),
    )
}

/// Test: Rows, pins, sequences and unique keys survive a save and reopen
#[test]
fn test_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("orc.json");

    {
        let orc = open(&path);
        let task = orc.create_task(NewTask::new("port the lexer")).unwrap();
        orc.pin::<Task>(&task.id).unwrap();

        let patrol = orc.start_patrol("seat-1", "orc:1.0").unwrap();
        let check = orc.record_check(&patrol.id, Outcome::Error, "Error: boom").unwrap();
        orc.apply_rollup(&patrol.id, &check.id, Assessment::Failure, 3)
            .unwrap();
        orc.store().save(&path).unwrap();
    }

    let orc = open(&path);
    let task: Task = orc.load("TASK-001").unwrap();
    assert!(task.pinned);
    assert!(orc.complete_task("TASK-001").is_err());

    // Sequences continue rather than restart.
    let next = orc.create_task(NewTask::new("port the parser")).unwrap();
    assert_eq!(next.id, "TASK-002");

    // The active patrol still holds its seat.
    assert!(orc.start_patrol("seat-1", "orc:1.0").is_err());

    // The open stuck keeps counting where it left off.
    let check = orc.record_check("PAT-001", Outcome::Error, "Error: boom").unwrap();
    match orc
        .apply_rollup("PAT-001", &check.id, Assessment::Failure, 3)
        .unwrap()
    {
        RollupOutcome::Incremented(stuck) => assert_eq!(stuck.count, 2),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        orc.store()
            .count::<Stuck>(|s| s.status == StuckStatus::Open)
            .unwrap(),
        1
    );
}

/// Test: Opening a missing file starts empty
#[test]
fn test_missing_snapshot_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let orc = open(&dir.path().join("absent.json"));
    assert_eq!(orc.store().count::<Patrol>(|_| true).unwrap(), 0);

    let patrol = orc.start_patrol("seat-1", "orc:1.0").unwrap();
    assert_eq!(patrol.id, "PAT-001");
    assert_eq!(patrol.status, PatrolStatus::Active);
}

/// Test: A corrupt snapshot is an error, not an empty store
#[test]
fn test_corrupt_snapshot_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orc.json");
    std::fs::write(&path, b"{ not json").unwrap();

    let err = MemoryStore::open(&path).unwrap_err();
    assert!(err.to_string().starts_with("Deserialization error"));
}

/// Test: An operator's resolve through the shared file is kept by a running patrol process
#[test]
fn test_shared_file_keeps_concurrent_resolve() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orc.json");
    let patrols = Coordinator::new(
        Arc::new(FileStore::open(&path).unwrap()),
        EscalationRouter::new("operator"),
    );
    let patrol = patrols.start_patrol("seat-1", "orc:1.0").unwrap();
    let check = patrols.record_check(&patrol.id, Outcome::Error, "Error: boom").unwrap();
    let RollupOutcome::Escalated { escalation, .. } = patrols
        .apply_rollup(&patrol.id, &check.id, Assessment::Failure, 1)
        .unwrap()
    else {
        panic!("threshold 1 should escalate on open");
    };

    let operator = FileStore::open(&path).unwrap();
    operator
        .transaction(|store| {
            Coordinator::new(store, EscalationRouter::new("operator")).resolve_escalation(
                &escalation.id,
                "restarted the seat",
                "operator",
            )
        })
        .unwrap();

    let next = patrols.start_patrol("seat-2", "orc:2.0").unwrap();
    patrols.record_check(&next.id, Outcome::Working, "✶ Linking…").unwrap();

    let stored: Escalation = MemoryStore::open(&path)
        .unwrap()
        .get(&escalation.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, EscalationStatus::Resolved);
    assert_eq!(stored.resolution.as_deref(), Some("restarted the seat"));
}

/// Test: A denied transaction leaves the shared file as it was
#[test]
fn test_denied_transaction_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orc.json");
    let store = FileStore::open(&path).unwrap();

    let err = store
        .transaction(|mem| {
            let orc = Coordinator::new(mem, EscalationRouter::new("operator"));
            orc.start_patrol("seat-1", "orc:1.0")?;
            orc.start_patrol("seat-1", "orc:1.1")
        })
        .unwrap_err();
    assert!(matches!(err, OrcError::Denied { .. }));
    assert_eq!(store.count::<Patrol>(|_| true).unwrap(), 0);
}
