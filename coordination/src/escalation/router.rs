//! Target-actor selection for new escalations

use std::collections::BTreeMap;

use crate::config::RoutingConfig;
use crate::error::{OrcError, OrcResult};
use crate::model::RoutingRule;

#[derive(Debug, Clone, PartialEq)]
pub struct EscalationRouter {
    default_actor: String,
    supervisors: BTreeMap<String, String>,
}

impl EscalationRouter {
    pub fn new(default_actor: impl Into<String>) -> Self {
        Self {
            default_actor: default_actor.into(),
            supervisors: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self {
            default_actor: config.default_actor.clone(),
            supervisors: config.supervisors.clone(),
        }
    }

    /// Register the supervisor for a seat.
    pub fn with_supervisor(mut self, seat_id: impl Into<String>, actor: impl Into<String>) -> Self {
        self.supervisors.insert(seat_id.into(), actor.into());
        self
    }

    pub fn default_actor(&self) -> &str {
        &self.default_actor
    }

    /// Pick the target actor for an escalation.
    pub fn route(
        &self,
        rule: RoutingRule,
        seat_id: Option<&str>,
        explicit_target: Option<&str>,
    ) -> OrcResult<String> {
        match rule {
            RoutingRule::SeatSupervisor => Ok(seat_id
                .and_then(|seat| self.supervisors.get(seat))
                .unwrap_or(&self.default_actor)
                .clone()),
            RoutingRule::Operator => Ok(self.default_actor.clone()),
            RoutingRule::Explicit => match explicit_target.map(str::trim) {
                Some(target) if !target.is_empty() => Ok(target.to_string()),
                _ => Err(OrcError::denied(
                    "explicit escalation requires a target actor",
                )),
            },
        }
    }
}

impl Default for EscalationRouter {
    fn default() -> Self {
        Self::from_config(&RoutingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> EscalationRouter {
        EscalationRouter::new("ops").with_supervisor("seat-a", "alice")
    }

    #[test]
    fn test_seat_supervisor() {
        assert_eq!(
            router().route(RoutingRule::SeatSupervisor, Some("seat-a"), None).unwrap(),
            "alice"
        );
    }

    #[test]
    fn test_seat_without_supervisor_falls_back() {
        assert_eq!(
            router().route(RoutingRule::SeatSupervisor, Some("seat-b"), None).unwrap(),
            "ops"
        );
        assert_eq!(
            router().route(RoutingRule::SeatSupervisor, None, None).unwrap(),
            "ops"
        );
    }

    #[test]
    fn test_operator_ignores_seat() {
        assert_eq!(
            router().route(RoutingRule::Operator, Some("seat-a"), None).unwrap(),
            "ops"
        );
    }

    #[test]
    fn test_explicit() {
        assert_eq!(
            router().route(RoutingRule::Explicit, None, Some("bob")).unwrap(),
            "bob"
        );
        let err = router().route(RoutingRule::Explicit, None, Some(" ")).unwrap_err();
        assert_eq!(err.to_string(), "explicit escalation requires a target actor");
    }

    #[test]
    fn test_default_uses_operator() {
        assert_eq!(EscalationRouter::default().default_actor(), "operator");
    }
}
