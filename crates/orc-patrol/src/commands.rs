//! Subcommand implementations
//!
//! The snapshot file is the store every process shares. `watch` reads and
//! writes it through a [`FileStore`], one locked call at a time. The one-shot
//! commands run their whole operation inside a single locked transaction, so
//! a resolve or stop issued while `watch` runs is never overwritten.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use coordination::model::{Patrol, PatrolStatus, Stuck};
use coordination::{
    Coordinator, EntityStore, EscalationRouter, EventBus, EventFilter, FileStore, MemoryStore,
    OrcConfig, OrcResult, PatrolEvent, PatrolSupervisor, TmuxPane,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

fn open_store(state: &Path) -> Result<FileStore> {
    FileStore::open(state).with_context(|| format!("failed to open state {}", state.display()))
}

fn coordinator<S: EntityStore>(config: &OrcConfig, store: Arc<S>) -> Coordinator<S> {
    Coordinator::new(store, EscalationRouter::from_config(&config.routing))
}

/// Run one guarded operation against the latest snapshot and save it.
fn one_shot<T>(
    config: &OrcConfig,
    state: &Path,
    op: impl FnOnce(&Coordinator<MemoryStore>) -> OrcResult<T>,
) -> Result<T> {
    let store = open_store(state)?;
    let value = store.transaction(|mem| op(&coordinator(config, mem)))?;
    Ok(value)
}

pub async fn watch(config: &OrcConfig, state: &Path, only: &[String]) -> Result<()> {
    let seats: Vec<_> = config
        .seats
        .iter()
        .filter(|s| only.is_empty() || only.contains(&s.id))
        .collect();
    if seats.is_empty() {
        bail!("no seats to patrol; add [[seats]] entries to the config");
    }

    let store = Arc::new(open_store(state)?);
    let bus = EventBus::new().shared();
    let orc = Arc::new(coordinator(config, store).with_events(bus.clone()));
    let pane = Arc::new(
        TmuxPane::new(config.patrol.capture_timeout()).with_history(config.patrol.capture_lines),
    );
    let mut supervisor = PatrolSupervisor::from_config(orc, pane, config);

    let mut events = bus.subscribe();
    let escalated = EventFilter::new().types(vec!["stuck_escalated"]);
    for seat in seats {
        match supervisor.start(&seat.id, &seat.target) {
            Ok(patrol) => info!(seat_id = %seat.id, patrol_id = %patrol.id, target = %seat.target, "Watching seat"),
            Err(e) => warn!(seat_id = %seat.id, error = %e, "Seat not started"),
        }
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut reaper = tokio::time::interval(config.patrol.tick_interval());

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupt received, stopping patrols");
                break;
            }
            received = events.recv() => match received {
                Ok(event) if escalated.matches(&event) => {
                    warn!(event = %serde_json::to_string(&event)?, "Seat escalated");
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event log lagged"),
                Err(RecvError::Closed) => break,
            },
            _ = reaper.tick() => {
                for (seat_id, reason) in supervisor.reap().await {
                    info!(seat_id = %seat_id, ?reason, "Patrol loop finished");
                }
                if supervisor.is_empty() {
                    info!("No patrols left running");
                    break;
                }
            }
        }
    }

    for (seat_id, reason) in supervisor.stop_all().await {
        info!(seat_id = %seat_id, ?reason, "Patrol loop stopped");
    }
    Ok(())
}

pub fn stop(config: &OrcConfig, state: &Path, patrol_id: &str) -> Result<()> {
    let patrol = one_shot(config, state, |orc| orc.stop_patrol(patrol_id))?;
    println!("{} stopped (seat {})", patrol.id, patrol.seat_id);
    Ok(())
}

pub fn status(config: &OrcConfig, state: &Path, json: bool) -> Result<()> {
    let orc = coordinator(config, Arc::new(open_store(state)?));
    let patrols = orc
        .store()
        .list::<Patrol>(|p| p.status == PatrolStatus::Active)?;

    let mut rows = Vec::with_capacity(patrols.len());
    for patrol in patrols {
        let stuck: Option<Stuck> = orc.open_stuck_for(&patrol.id)?;
        let last = orc.latest_check(&patrol.id)?;
        rows.push((patrol, stuck, last));
    }

    if json {
        let value: Vec<_> = rows
            .iter()
            .map(|(patrol, stuck, last)| {
                serde_json::json!({
                    "patrol": patrol,
                    "open_stuck": stuck,
                    "last_outcome": last.as_ref().map(|c| c.outcome),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("no active patrols");
    }
    for (patrol, stuck, last) in rows {
        let outcome = last.map_or("-".to_string(), |c| c.outcome.to_string());
        let stuck = stuck.map_or("-".to_string(), |s| format!("{} x{}", s.id, s.count));
        println!(
            "{}\t{}\t{}\t{}\t{}",
            patrol.id, patrol.seat_id, patrol.target, outcome, stuck
        );
    }
    Ok(())
}

pub fn escalations(
    config: &OrcConfig,
    state: &Path,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let orc = coordinator(config, Arc::new(open_store(state)?));
    let pending = orc.pending_escalations(actor)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&pending)?);
    } else if pending.is_empty() {
        println!("no pending escalations");
    } else {
        for e in pending {
            println!("{}\t{}\t{}\t{}", e.id, e.target_actor, e.routing_rule, e.reason);
        }
    }
    Ok(())
}

pub fn resolve(
    config: &OrcConfig,
    state: &Path,
    escalation_id: &str,
    resolution: &str,
    actor: Option<&str>,
) -> Result<()> {
    let actor = actor.unwrap_or(&config.routing.default_actor);
    let escalation = one_shot(config, state, |orc| {
        orc.resolve_escalation(escalation_id, resolution, actor)
    })?;
    println!("{} resolved by {}", escalation.id, actor);
    Ok(())
}

pub fn dismiss(
    config: &OrcConfig,
    state: &Path,
    escalation_id: &str,
    actor: Option<&str>,
) -> Result<()> {
    let actor = actor.unwrap_or(&config.routing.default_actor);
    let escalation = one_shot(config, state, |orc| orc.dismiss_escalation(escalation_id, actor))?;
    println!("{} dismissed by {}", escalation.id, actor);
    Ok(())
}
