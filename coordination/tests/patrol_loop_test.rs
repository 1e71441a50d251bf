//! Integration tests for the patrol loop
//!
//! Runs real supervisors over a scripted pane with paused tokio time, checking
//! the store and the event stream together.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use coordination::model::{Check, Escalation, Outcome, Patrol, PatrolStatus, Stuck, StuckStatus};
use coordination::patrol::CaptureError;
use coordination::{
    Coordinator, EntityStore, EscalationRouter, EventBus, MemoryStore, OrcConfig, PaneCapture,
    PatrolEvent, PatrolSupervisor, StopReason,
};

/// Pane that plays a script of frames, then repeats the last frame.
struct ScriptedPane {
    frames: Mutex<VecDeque<&'static str>>,
    current: Mutex<&'static str>,
}

impl ScriptedPane {
    fn new(frames: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            frames: Mutex::new(frames.iter().copied().collect()),
            current: Mutex::new(""),
        })
    }
}

#[async_trait]
impl PaneCapture for ScriptedPane {
    async fn capture_pane(&self, _target: &str) -> Result<String, CaptureError> {
        let mut current = self.current.lock().unwrap();
        if let Some(frame) = self.frames.lock().unwrap().pop_front() {
            *current = frame;
        }
        Ok(current.to_string())
    }

    async fn send_keys(&self, _target: &str, _keys: &str) -> Result<(), CaptureError> {
        Ok(())
    }
}

/// Pane that never answers, to exercise the capture timeout.
struct HungPane;

#[async_trait]
impl PaneCapture for HungPane {
    async fn capture_pane(&self, _target: &str) -> Result<String, CaptureError> {
        std::future::pending().await
    }

    async fn send_keys(&self, _target: &str, _keys: &str) -> Result<(), CaptureError> {
        Ok(())
    }
}

fn config() -> OrcConfig {
    OrcConfig::from_toml(
        r#"
[patrol]
tick_interval_secs = 30
stuck_threshold = 3
grace_checks = 1
capture_timeout_ms = 2000

[routing]
default_actor = "operator"

[routing.supervisors]
"seat-1" = "lead"
"#,
    )
    .unwrap()
}

fn build(pane: Arc<dyn PaneCapture>) -> (Arc<Coordinator<MemoryStore>>, PatrolSupervisor<MemoryStore>) {
    let config = config();
    let coordinator = Arc::new(
        Coordinator::new(
            Arc::new(MemoryStore::new()),
            EscalationRouter::from_config(&config.routing),
        )
        .with_events(EventBus::new().shared()),
    );
    let supervisor = PatrolSupervisor::from_config(coordinator.clone(), pane, &config);
    (coordinator, supervisor)
}

fn drain(rx: &mut tokio::sync::broadcast::Receiver<PatrolEvent>) -> Vec<PatrolEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Test: A seat that keeps failing escalates to its supervisor and the loop exits
#[tokio::test(start_paused = true)]
async fn test_failing_seat_escalates_to_supervisor() {
    let pane = ScriptedPane::new(&["thread 'main' panicked at src/main.rs:4:5"]);
    let (orc, mut supervisor) = build(pane);
    let mut rx = orc.events().unwrap().subscribe();

    let patrol = supervisor.start("seat-1", "orc:1.0").unwrap();
    tokio::time::sleep(Duration::from_secs(90)).await;

    assert_eq!(
        supervisor.reap().await,
        vec![("seat-1".to_string(), StopReason::Escalated)]
    );

    let stored: Patrol = orc.load(&patrol.id).unwrap();
    assert_eq!(stored.status, PatrolStatus::Escalated);
    let escalations = orc.pending_escalations(Some("lead")).unwrap();
    assert_eq!(escalations.len(), 1);
    assert_eq!(escalations[0].stuck_id.as_deref(), Some("STUCK-001"));

    let kinds: Vec<&str> = drain(&mut rx).iter().map(|e| e.event_type()).collect();
    assert_eq!(
        kinds,
        vec![
            "patrol_started",
            "check_recorded",
            "stuck_opened",
            "check_recorded",
            "stuck_incremented",
            "check_recorded",
            "stuck_incremented",
            "stuck_escalated",
            "patrol_stopped",
        ]
    );
}

/// Test: A recovering seat resolves its stuck and keeps patrolling
#[tokio::test(start_paused = true)]
async fn test_recovery_resolves_stuck() {
    let pane = ScriptedPane::new(&[
        "Error: could not compile `orc`",
        "Error: could not compile `orc`\n\n✶ Retrying… (esc to interrupt)",
        "✶ Retrying… (esc to interrupt)",
        "❯",
    ]);
    let (orc, mut supervisor) = build(pane);

    let patrol = supervisor.start("seat-2", "orc:2.0").unwrap();
    tokio::time::sleep(Duration::from_secs(125)).await;
    assert_eq!(supervisor.running(), vec!["seat-2"]);

    let stucks = orc.store().list::<Stuck>(|s| s.patrol_id == patrol.id).unwrap();
    assert_eq!(stucks.len(), 1);
    assert_eq!(stucks[0].status, StuckStatus::Resolved);
    assert_eq!(stucks[0].count, 2);

    let outcomes: Vec<Outcome> = orc
        .store()
        .list::<Check>(|c| c.patrol_id == patrol.id)
        .unwrap()
        .into_iter()
        .map(|c| c.outcome)
        .collect();
    assert_eq!(
        outcomes,
        vec![
            Outcome::Error,
            Outcome::Error,
            Outcome::Working,
            Outcome::Idle,
            Outcome::Idle,
        ]
    );

    supervisor.stop_all().await;
    let stored: Patrol = orc.load(&patrol.id).unwrap();
    assert_eq!(stored.status, PatrolStatus::Completed);
    assert_eq!(orc.store().count::<Escalation>(|_| true).unwrap(), 0);
}

/// Test: A hung capture skips ticks instead of stalling the loop
#[tokio::test(start_paused = true)]
async fn test_hung_capture_skips_ticks() {
    let (orc, mut supervisor) = build(Arc::new(HungPane));
    let mut rx = orc.events().unwrap().subscribe();

    supervisor.start("seat-3", "orc:3.0").unwrap();
    tokio::time::sleep(Duration::from_secs(65)).await;
    supervisor.stop("seat-3").await.unwrap();

    assert_eq!(orc.store().count::<Check>(|_| true).unwrap(), 0);
    let skipped = drain(&mut rx)
        .into_iter()
        .filter(|e| e.event_type() == "tick_skipped")
        .count();
    assert_eq!(skipped, 3);
}

/// Test: Stopping one seat leaves the others running
#[tokio::test(start_paused = true)]
async fn test_stop_is_per_seat() {
    let pane = ScriptedPane::new(&["> "]);
    let (orc, mut supervisor) = build(pane);

    let a = supervisor.start("seat-a", "orc:1.0").unwrap();
    let b = supervisor.start("seat-b", "orc:1.1").unwrap();
    tokio::time::sleep(Duration::from_secs(40)).await;

    assert_eq!(supervisor.stop("seat-a").await.unwrap(), StopReason::Requested);
    assert_eq!(supervisor.running(), vec!["seat-b"]);

    let a: Patrol = orc.load(&a.id).unwrap();
    let b: Patrol = orc.load(&b.id).unwrap();
    assert_eq!(a.status, PatrolStatus::Completed);
    assert_eq!(b.status, PatrolStatus::Active);
    supervisor.stop_all().await;
}
