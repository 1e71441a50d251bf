//! End-to-end guard scenarios
//!
//! Drives the coordinator against a fresh in-memory store and checks the
//! exact reasons operators see.

use std::sync::Arc;

use coordination::guard::receipt::{can_create, CreateReceiptContext};
use coordination::model::{
    Escalation, EscalationOrigin, Outcome, Patrol, PatrolStatus, RoutingRule, Shipment, Stuck,
    StuckStatus, Task,
};
use coordination::patrol::classify;
use coordination::patrol::stuck::Assessment;
use coordination::{
    Coordinator, EntityKind, EntityStore, EscalationRouter, MemoryStore, NewTask, RollupOutcome,
};

fn coordinator() -> Coordinator<MemoryStore> {
    Coordinator::new(
        Arc::new(MemoryStore::new()),
        EscalationRouter::new("operator").with_supervisor("seat-1", "lead"),
    )
}

/// Test: A task under a missing shipment is refused by name
#[test]
fn test_task_under_missing_shipment_is_denied() {
    let orc = coordinator();
    let err = orc
        .create_task(NewTask::new("Wire the lexer").in_shipment("SHIP-999"))
        .unwrap_err();

    assert_eq!(err.denial_reason(), Some("shipment SHIP-999 not found"));
    assert_eq!(orc.store().count::<Task>(|_| true).unwrap(), 0);
}

/// Test: A pinned task cannot be completed and the reason names the unpin command
#[test]
fn test_pinned_task_cannot_complete() {
    let orc = coordinator();
    for n in 1..=7 {
        orc.create_task(NewTask::new(format!("task {n}"))).unwrap();
    }
    orc.pin::<Task>("TASK-007").unwrap();

    let reason = orc.complete_task("TASK-007").unwrap_err().to_string();
    assert_eq!(
        reason,
        "cannot complete pinned task TASK-007. Unpin first with: orc task unpin TASK-007"
    );

    orc.unpin::<Task>("TASK-007").unwrap();
    orc.complete_task("TASK-007").unwrap();
}

/// Test: An error signature beats a working spinner
#[test]
fn test_error_outranks_spinner() {
    assert_eq!(classify("✶ Thundering… Error: boom", None, None), Outcome::Error);
}

/// Test: A proceed prompt beats a working spinner
#[test]
fn test_menu_outranks_spinner() {
    assert_eq!(
        classify("Would you like to proceed? ✶ processing", None, None),
        Outcome::Menu
    );
}

/// Test: Five failing checks at threshold five escalate the patrol exactly once
#[test]
fn test_five_errors_escalate_patrol() {
    let orc = coordinator();
    let patrol = orc.start_patrol("seat-1", "orc:1.0").unwrap();

    let mut last = RollupOutcome::Unchanged;
    for _ in 0..5 {
        let check = orc
            .record_check(&patrol.id, Outcome::Error, "error[E0425]: cannot find value")
            .unwrap();
        last = orc
            .apply_rollup(&patrol.id, &check.id, Assessment::Failure, 5)
            .unwrap();
    }

    let RollupOutcome::Escalated { stuck, escalation } = last else {
        panic!("expected escalation, got {last:?}");
    };
    assert_eq!(stuck.count, 5);
    assert_eq!(stuck.status, StuckStatus::Escalated);
    assert_eq!(escalation.origin, EscalationOrigin::Stuck);
    assert_eq!(escalation.routing_rule, RoutingRule::SeatSupervisor);
    assert_eq!(escalation.target_actor, "lead");
    assert_eq!(escalation.patrol_id.as_deref(), Some(patrol.id.as_str()));
    assert_eq!(escalation.stuck_id.as_deref(), Some(stuck.id.as_str()));

    let stored: Patrol = orc.load(&patrol.id).unwrap();
    assert_eq!(stored.status, PatrolStatus::Escalated);
    let escalations = orc
        .store()
        .list::<Escalation>(|e| e.patrol_id.as_deref() == Some(patrol.id.as_str()))
        .unwrap();
    assert_eq!(escalations.len(), 1);

    // A late sixth check is recorded but touches nothing.
    let check = orc.record_check(&patrol.id, Outcome::Error, "Error: again").unwrap();
    assert_eq!(
        orc.apply_rollup(&patrol.id, &check.id, Assessment::Failure, 5)
            .unwrap(),
        RollupOutcome::Inactive(PatrolStatus::Escalated)
    );
    assert_eq!(orc.store().count::<Escalation>(|_| true).unwrap(), 1);
}

/// Test: A second receipt for a shipment is refused
#[test]
fn test_second_receipt_is_denied() {
    let orc = coordinator();
    let commission = orc.create_commission("Parser").unwrap();
    let shipment = orc.create_shipment(&commission.id, "Tokenizer").unwrap();
    orc.create_receipt(&shipment.id, "tokenizer merged", None)
        .unwrap();

    let err = orc
        .create_receipt(&shipment.id, "tokenizer merged again", None)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("shipment {} already has a REC", shipment.id)
    );
}

/// Test: Existence is reported before content problems
#[test]
fn test_receipt_not_found_beats_empty_outcome() {
    let ctx = CreateReceiptContext {
        parent_kind: EntityKind::Shipment,
        parent_id: "SHIP-404".into(),
        parent_exists: false,
        existing_receipt: None,
        delivered_outcome: "   ".into(),
    };
    assert_eq!(can_create(&ctx).reason, "shipment SHIP-404 not found");
}

/// Test: Terminal escalations stay terminal
#[test]
fn test_resolved_escalation_cannot_resolve_again() {
    let orc = coordinator();
    let patrol = orc.start_patrol("seat-2", "orc:2.0").unwrap();
    let check = orc.record_check(&patrol.id, Outcome::Error, "panic: oops").unwrap();
    let RollupOutcome::Escalated { escalation, .. } = orc
        .apply_rollup(&patrol.id, &check.id, Assessment::Failure, 1)
        .unwrap()
    else {
        panic!("threshold 1 should escalate on open");
    };
    assert_eq!(escalation.target_actor, "operator");

    orc.resolve_escalation(&escalation.id, "restarted the seat", "operator")
        .unwrap();
    let err = orc
        .resolve_escalation(&escalation.id, "restarted twice", "operator")
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "can only resolve pending escalations (current status: resolved)"
    );
    assert!(orc.dismiss_escalation(&escalation.id, "operator").is_err());
}

/// Test: A pinned closed shipment reports the pin, not its status
#[test]
fn test_pinned_closed_shipment_reports_pin() {
    let orc = coordinator();
    let commission = orc.create_commission("Parser").unwrap();
    let shipment = orc.create_shipment(&commission.id, "Tokenizer").unwrap();
    let task = orc
        .create_task(NewTask::new("lex idents").in_shipment(&shipment.id))
        .unwrap();
    orc.mark_shipment_ready(&shipment.id).unwrap();
    orc.start_shipment(&shipment.id).unwrap();
    orc.complete_task(&task.id).unwrap();
    orc.complete_shipment(&shipment.id, false).unwrap();

    orc.pin::<Shipment>(&shipment.id).unwrap();
    let err = orc.complete_shipment(&shipment.id, false).unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "cannot complete pinned shipment {id}. Unpin first with: orc shipment unpin {id}",
            id = shipment.id
        )
    );
}

/// Test: Only one open stuck exists while failures continue
#[test]
fn test_stuck_count_tracks_failures_then_freezes() {
    let orc = coordinator();
    let patrol = orc.start_patrol("seat-3", "orc:3.0").unwrap();

    for n in 1..=4u32 {
        let check = orc.record_check(&patrol.id, Outcome::Error, "FAILED").unwrap();
        orc.apply_rollup(&patrol.id, &check.id, Assessment::Failure, 10)
            .unwrap();
        let open = orc.store().list::<Stuck>(|s| s.status == StuckStatus::Open).unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].count, n);
    }

    let check = orc.record_check(&patrol.id, Outcome::Idle, "$").unwrap();
    let RollupOutcome::Resolved(stuck) = orc
        .apply_rollup(&patrol.id, &check.id, Assessment::Recovery, 10)
        .unwrap()
    else {
        panic!("recovery should resolve");
    };
    assert_eq!(stuck.count, 4);
    assert!(stuck.closed_at.is_some());

    // Further recoveries leave the closed stuck alone.
    let check = orc.record_check(&patrol.id, Outcome::Working, "✶ Linking…").unwrap();
    assert_eq!(
        orc.apply_rollup(&patrol.id, &check.id, Assessment::Recovery, 10)
            .unwrap(),
        RollupOutcome::Unchanged
    );
    let stored: Stuck = orc.load(&stuck.id).unwrap();
    assert_eq!(stored.count, 4);
}
