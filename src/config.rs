use std::fmt;

use serde::Deserialize;

use crate::error::ValidationError;

/// The remote host and credentials everything acts against. Treated as one
/// unit: configuration updates swap the whole value.
///
/// `Debug` is hand-rolled so the secret never lands in a log line, and
/// `Serialize` is deliberately not derived.
#[derive(Clone, Deserialize)]
pub struct Target {
    pub host: String,
    pub user: String,
    pub secret: String,
}

impl Target {
    /// Boundary validation: every field must be non-empty after trimming.
    /// Runs before any external command is built.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.trim().is_empty() {
            return Err(ValidationError::EmptyHost);
        }
        if self.user.trim().is_empty() {
            return Err(ValidationError::EmptyUser);
        }
        if self.secret.trim().is_empty() {
            return Err(ValidationError::EmptySecret);
        }
        Ok(())
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub target: Target,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Seconds between scheduled checks.
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,
    /// Upper bound on one automation-tool invocation, in seconds. A hung
    /// remote call is killed and treated as an unknown result.
    #[serde(default = "default_command_timeout")]
    pub command_timeout: u64,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_service_name() -> String { "W3SVC".into() }
fn default_check_interval() -> u64 { 300 }
fn default_command_timeout() -> u64 { 120 }
fn default_api_port() -> u16 { 3000 }
fn default_enabled() -> bool { true }
