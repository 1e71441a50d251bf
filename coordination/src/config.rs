//! Runtime configuration
//!
//! Loaded from TOML, then overridden from the environment:
//!
//! | Variable | Field |
//! |---|---|
//! | `ORC_PATROL_INTERVAL_SECS` | `patrol.tick_interval_secs` |
//! | `ORC_STUCK_THRESHOLD` | `patrol.stuck_threshold` |
//! | `ORC_CAPTURE_TIMEOUT_MS` | `patrol.capture_timeout_ms` |
//! | `ORC_DEFAULT_ACTOR` | `routing.default_actor` |

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{OrcError, OrcResult};
use crate::patrol::capture::validate_target;
use crate::retry::RetryPolicy;

/// Patrol loop tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    /// Seconds between checks.
    pub tick_interval_secs: u64,
    /// Stuck count at which the patrol escalates.
    pub stuck_threshold: u32,
    /// Consecutive identical menu/typed checks tolerated before they count as failures.
    pub grace_checks: u32,
    /// Upper bound on one `capture-pane` call.
    pub capture_timeout_ms: u64,
    /// Scrollback lines to capture (0 = visible pane only).
    pub capture_lines: u32,
    /// Send Enter once to a seat whose typed command sits past the grace window.
    pub nudge_typed: bool,
}

impl PatrolConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 30,
            stuck_threshold: 5,
            grace_checks: 2,
            capture_timeout_ms: 5_000,
            capture_lines: 0,
            nudge_typed: false,
        }
    }
}

/// Who receives escalations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Actor used for `operator` routing and as the supervisor fallback.
    pub default_actor: String,
    /// Seat ID → supervising actor.
    pub supervisors: BTreeMap<String, String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_actor: "operator".to_string(),
            supervisors: BTreeMap::new(),
        }
    }
}

/// A seat to patrol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatConfig {
    pub id: String,
    /// Pane target, `session:window.pane`.
    pub target: String,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrcConfig {
    pub patrol: PatrolConfig,
    pub retry: RetryPolicy,
    pub routing: RoutingConfig,
    pub seats: Vec<SeatConfig>,
}

impl OrcConfig {
    /// Parse TOML text; missing sections take their defaults.
    pub fn from_toml(text: &str) -> OrcResult<Self> {
        toml::from_str(text).map_err(|e| OrcError::config(format!("invalid TOML: {e}")))
    }

    /// Load from a file, apply environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> OrcResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| OrcError::config(format!("cannot read {}: {e}", path.display())))?;
        let mut config = Self::from_toml(&text)?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file.
    pub fn from_env() -> OrcResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> OrcResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> OrcResult<()> {
        if let Some(v) = lookup("ORC_PATROL_INTERVAL_SECS") {
            self.patrol.tick_interval_secs = parse_var("ORC_PATROL_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = lookup("ORC_STUCK_THRESHOLD") {
            self.patrol.stuck_threshold = parse_var("ORC_STUCK_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("ORC_CAPTURE_TIMEOUT_MS") {
            self.patrol.capture_timeout_ms = parse_var("ORC_CAPTURE_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("ORC_DEFAULT_ACTOR") {
            self.routing.default_actor = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> OrcResult<()> {
        if self.patrol.tick_interval_secs == 0 {
            return Err(OrcError::config("patrol.tick_interval_secs must be positive"));
        }
        if self.patrol.stuck_threshold == 0 {
            return Err(OrcError::config("patrol.stuck_threshold must be positive"));
        }
        if self.patrol.capture_timeout_ms == 0 {
            return Err(OrcError::config("patrol.capture_timeout_ms must be positive"));
        }
        if self.routing.default_actor.trim().is_empty() {
            return Err(OrcError::config("routing.default_actor cannot be empty"));
        }
        self.retry.validate()?;

        let mut seen = std::collections::HashSet::new();
        for seat in &self.seats {
            if !seen.insert(seat.id.as_str()) {
                return Err(OrcError::config(format!("seat {} is listed twice", seat.id)));
            }
            validate_target(&seat.target)
                .map_err(|e| OrcError::config(format!("seat {}: {e}", seat.id)))?;
        }
        Ok(())
    }

    pub fn seat(&self, id: &str) -> Option<&SeatConfig> {
        self.seats.iter().find(|s| s.id == id)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> OrcResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| OrcError::config(format!("{key} has invalid value '{value}'")))
}
