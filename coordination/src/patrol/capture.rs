//! Pane capture adapter
//!
//! The patrol loop reads agent panes and, when nudging, types into them
//! through [`PaneCapture`]. [`TmuxPane`] is the production adapter; tests
//! substitute scripted fakes.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

static TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_\-]+:[A-Za-z0-9_\-]+\.\d+$").expect("TARGET_RE regex should compile")
});

/// Errors from reading or writing a pane
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("invalid pane target '{0}' (expected session:window.pane)")]
    InvalidTarget(String),

    #[error("capture of {target} timed out after {timeout_ms}ms")]
    Timeout { target: String, timeout_ms: u64 },

    #[error("failed to run tmux: {0}")]
    Spawn(String),

    #[error("tmux {command} on {target} failed: {stderr}")]
    Failed {
        command: &'static str,
        target: String,
        stderr: String,
    },
}

impl CaptureError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Check that a target has the `session:window.pane` shape.
pub fn validate_target(target: &str) -> Result<(), CaptureError> {
    if TARGET_RE.is_match(target) {
        Ok(())
    } else {
        Err(CaptureError::InvalidTarget(target.to_string()))
    }
}

/// Read and type into a terminal pane.
#[async_trait]
pub trait PaneCapture: Send + Sync {
    /// Current visible text of the pane, escape sequences included.
    async fn capture_pane(&self, target: &str) -> Result<String, CaptureError>;

    /// Send keys to the pane (tmux key names, e.g. `Enter`).
    async fn send_keys(&self, target: &str, keys: &str) -> Result<(), CaptureError>;
}

/// `tmux capture-pane` / `tmux send-keys` under a timeout.
#[derive(Debug, Clone)]
pub struct TmuxPane {
    timeout: Duration,
    /// Scrollback lines above the visible area to include
    history_lines: u32,
}

impl TmuxPane {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            history_lines: 0,
        }
    }

    pub fn with_history(mut self, lines: u32) -> Self {
        self.history_lines = lines;
        self
    }

    async fn run(
        &self,
        command: &'static str,
        target: &str,
        args: &[String],
    ) -> Result<String, CaptureError> {
        validate_target(target)?;

        let mut cmd = tokio::process::Command::new("tmux");
        cmd.arg(command).args(args).kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(CaptureError::Spawn(e.to_string())),
            Err(_) => {
                return Err(CaptureError::Timeout {
                    target: target.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                })
            }
        };

        if !output.status.success() {
            return Err(CaptureError::Failed {
                command,
                target: target.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl PaneCapture for TmuxPane {
    async fn capture_pane(&self, target: &str) -> Result<String, CaptureError> {
        let mut args = vec!["-p".to_string(), "-e".to_string()];
        if self.history_lines > 0 {
            args.push("-S".to_string());
            args.push(format!("-{}", self.history_lines));
        }
        args.push("-t".to_string());
        args.push(target.to_string());

        let text = self.run("capture-pane", target, &args).await?;
        debug!(target, bytes = text.len(), "pane captured");
        Ok(text)
    }

    async fn send_keys(&self, target: &str, keys: &str) -> Result<(), CaptureError> {
        let args = vec!["-t".to_string(), target.to_string(), keys.to_string()];
        self.run("send-keys", target, &args).await?;
        debug!(target, keys, "keys sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_shape() {
        assert!(validate_target("orc:1.0").is_ok());
        assert!(validate_target("agent-7:editor.2").is_ok());
        assert!(validate_target("orc").is_err());
        assert!(validate_target("orc:1").is_err());
        assert!(validate_target("orc:1.0; kill-server").is_err());
    }

    #[test]
    fn test_only_timeouts_are_transient() {
        let timeout = CaptureError::Timeout {
            target: "orc:1.0".into(),
            timeout_ms: 5_000,
        };
        assert!(timeout.is_transient());
        assert!(!CaptureError::InvalidTarget("x".into()).is_transient());
    }

    #[tokio::test]
    async fn test_invalid_target_never_spawns() {
        let pane = TmuxPane::new(Duration::from_millis(50));
        let err = pane.capture_pane("not a target").await.unwrap_err();
        assert_eq!(err, CaptureError::InvalidTarget("not a target".into()));
    }
}
