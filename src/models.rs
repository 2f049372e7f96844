use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::config::Target;

/// The monitor's belief about whether the watched service is up, derived
/// fresh from every status query. Anything that is not positively
/// `ServiceRunning` counts as unhealthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthState {
    Reachable,
    Unreachable,
    ServiceRunning,
    ServiceStopped,
    ActionFailed,
    Unknown,
}

/// Verdict of a remediating or operator-requested state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    Succeeded,
    NoChangeNeeded,
    Unreachable,
    Failed,
    Unknown,
}

/// Desired run state passed to the service-state operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceAction {
    Started,
    Stopped,
    Restarted,
}

impl ServiceAction {
    /// Value for the automation tool's `state=` module argument.
    pub fn state_arg(self) -> &'static str {
        match self {
            ServiceAction::Started => "started",
            ServiceAction::Stopped => "stopped",
            ServiceAction::Restarted => "restarted",
        }
    }
}

/// Captured output of one external invocation. A non-zero exit code is data
/// for the classifier, not an error.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: i32,
    pub text: String,
}

/// One check's verdict: the observed health, the outcome of the automatic
/// start if one was attempted, and the raw tool output for diagnosis.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub timestamp: DateTime<Utc>,
    pub health: HealthState,
    pub remediation: Option<ActionOutcome>,
    pub detail: String,
}

/// Verdict of a single operator-requested service action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionReport {
    pub timestamp: DateTime<Utc>,
    pub outcome: ActionOutcome,
    pub detail: String,
}

/// Mutable monitor state shared between the scheduled loop and the control
/// endpoints. Replaced as a whole value, never field by field.
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub target: Target,
    pub enabled: bool,
}

/// Summary exposed on the status endpoint. Deliberately omits the secret.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub host: String,
    pub user: String,
    pub service: String,
    pub enabled: bool,
    pub period_secs: u64,
}
