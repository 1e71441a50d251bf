//! Stuck assessment and roll-up decisions
//!
//! Each check is assessed as a failure, a recovery, or neutral. Consecutive
//! failures accumulate on one open stuck; a recovery closes it. Both steps are
//! pure so the runner only has to apply the resulting [`RollupAction`].

use crate::model::Outcome;

/// What one check means for the stuck roll-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    Failure,
    Recovery,
    Neutral,
}

/// A check seen in the context of the ones before it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub outcome: Outcome,
    /// Text differs from the previous check (always true for the first)
    pub changed: bool,
    /// Consecutive checks with this outcome, including this one
    pub outcome_run: u32,
    /// Consecutive checks with this outcome and identical text, including this one
    pub unchanged_run: u32,
}

/// Tracks the previous check of one patrol to build observations.
#[derive(Debug, Clone, Default)]
pub struct CheckHistory {
    last: Option<(Outcome, String)>,
    outcome_run: u32,
    unchanged_run: u32,
}

impl CheckHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the latest persisted check so a restarted loop keeps comparing.
    pub fn resume(outcome: Outcome, text: impl Into<String>) -> Self {
        Self {
            last: Some((outcome, text.into())),
            outcome_run: 1,
            unchanged_run: 1,
        }
    }

    pub fn previous_text(&self) -> Option<&str> {
        self.last.as_ref().map(|(_, text)| text.as_str())
    }

    pub fn previous_outcome(&self) -> Option<Outcome> {
        self.last.as_ref().map(|(outcome, _)| *outcome)
    }

    /// Record a check and describe it relative to its predecessors.
    pub fn observe(&mut self, outcome: Outcome, text: &str) -> Observation {
        let (same_outcome, same_text) = match &self.last {
            Some((prev_outcome, prev_text)) => (*prev_outcome == outcome, prev_text == text),
            None => (false, false),
        };
        self.outcome_run = if same_outcome { self.outcome_run + 1 } else { 1 };
        self.unchanged_run = if same_outcome && same_text {
            self.unchanged_run + 1
        } else {
            1
        };
        self.last = Some((outcome, text.to_string()));
        Observation {
            outcome,
            changed: !same_text,
            outcome_run: self.outcome_run,
            unchanged_run: self.unchanged_run,
        }
    }
}

/// Assess a check. `grace_checks` is how many repeats of a menu or an
/// unsubmitted command are tolerated before they count as failures.
pub fn assess(obs: &Observation, grace_checks: u32) -> Assessment {
    match obs.outcome {
        Outcome::Error => Assessment::Failure,
        Outcome::Menu if obs.outcome_run > grace_checks => Assessment::Failure,
        Outcome::Menu => Assessment::Neutral,
        Outcome::Typed if obs.changed => Assessment::Recovery,
        Outcome::Typed if obs.unchanged_run > grace_checks => Assessment::Failure,
        Outcome::Typed => Assessment::Neutral,
        Outcome::Idle | Outcome::Working if obs.changed => Assessment::Recovery,
        Outcome::Idle | Outcome::Working => Assessment::Neutral,
    }
}

/// Whether a typed command just crossed the grace window, i.e. the one
/// moment a nudge should be sent.
pub fn should_nudge(obs: &Observation, grace_checks: u32) -> bool {
    obs.outcome == Outcome::Typed && !obs.changed && obs.unchanged_run == grace_checks + 1
}

/// Change to apply to the patrol's stucks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollupAction {
    Nothing,
    /// Open a new stuck with count 1
    Open { escalate: bool },
    /// Bump the open stuck to `count`
    Increment { count: u32, escalate: bool },
    /// Close the open stuck, count frozen
    Resolve,
}

/// Decide the roll-up step. `open_count` is the open stuck's count, if any.
pub fn rollup(assessment: Assessment, open_count: Option<u32>, threshold: u32) -> RollupAction {
    match (assessment, open_count) {
        (Assessment::Failure, None) => RollupAction::Open {
            escalate: 1 >= threshold,
        },
        (Assessment::Failure, Some(count)) => {
            let count = count + 1;
            RollupAction::Increment {
                count,
                escalate: count >= threshold,
            }
        }
        (Assessment::Recovery, Some(_)) => RollupAction::Resolve,
        _ => RollupAction::Nothing,
    }
}
