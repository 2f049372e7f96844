//! Invocation builder for the Ansible ad-hoc CLI over WinRM.
//!
//! Builds argv for the three remote operations and hands them to the command
//! runner. Output text is returned raw in every case; nothing here reads it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Target;
use crate::models::{CommandResult, ServiceAction};
use crate::runner::CommandRunner;

const ANSIBLE_PROGRAM: &str = "ansible";
const WINRM_PORT: u16 = 5985;

/// Environment variable the remote password travels in. The command line
/// only carries a lookup for it, so the credential never shows up in a
/// process table listing.
pub const PASSWORD_ENV: &str = "SVCPULSE_REMOTE_PASSWORD";

pub struct AnsibleClient {
    runner: Arc<dyn CommandRunner>,
    service_name: String,
    timeout: Duration,
}

impl AnsibleClient {
    pub fn new(runner: Arc<dyn CommandRunner>, service_name: String, timeout: Duration) -> Self {
        Self { runner, service_name, timeout }
    }

    /// win_ping reachability probe against the target host.
    pub async fn probe(&self, target: &Target) -> CommandResult {
        let mut args = self.base_args(target);
        args.extend(["-m".into(), "win_ping".into()]);
        self.dispatch(args, target).await
    }

    /// Query the current run state of the monitored service.
    pub async fn query_service_state(&self, target: &Target) -> CommandResult {
        let mut args = self.base_args(target);
        args.extend([
            "-m".into(),
            "win_service".into(),
            "-a".into(),
            format!("name={}", self.service_name),
        ]);
        self.dispatch(args, target).await
    }

    /// Request a state transition for the monitored service.
    pub async fn set_service_state(&self, target: &Target, action: ServiceAction) -> CommandResult {
        let mut args = self.base_args(target);
        args.extend([
            "-m".into(),
            "win_service".into(),
            "-a".into(),
            format!("name={} state={}", self.service_name, action.state_arg()),
        ]);
        self.dispatch(args, target).await
    }

    /// Shared connection arguments: single-host inventory, WinRM transport,
    /// one fork. The password extra-var is an env lookup that Ansible
    /// resolves on the control host, keeping the secret out of argv.
    fn base_args(&self, target: &Target) -> Vec<String> {
        let extra_vars = serde_json::json!({
            "ansible_password": format!("{{{{ lookup('env', '{PASSWORD_ENV}') }}}}"),
            "ansible_port": WINRM_PORT,
            "ansible_winrm_server_cert_validation": "ignore",
        });
        vec![
            "all".into(),
            "-i".into(),
            format!("{},", target.host),
            "--user".into(),
            target.user.clone(),
            "--connection=winrm".into(),
            "--extra-vars".into(),
            extra_vars.to_string(),
            "--forks=1".into(),
        ]
    }

    /// Run one invocation and always come back with something classifiable.
    /// Runner failures (spawn, wait, timeout) are folded into the result
    /// text; their wording carries no marker, so they classify as `Unknown`.
    async fn dispatch(&self, args: Vec<String>, target: &Target) -> CommandResult {
        let env_overrides = vec![
            (PASSWORD_ENV.to_string(), target.secret.clone()),
            // Serialize the tool's own workers and dodge the macOS
            // fork-safety abort seen on control hosts.
            ("ANSIBLE_FORKS".to_string(), "1".to_string()),
            ("OBJC_DISABLE_INITIALIZE_FORK_SAFETY".to_string(), "YES".to_string()),
        ];

        match self
            .runner
            .run(ANSIBLE_PROGRAM, &args, &env_overrides, self.timeout)
            .await
        {
            Ok(result) => {
                debug!("ansible exited {} with {} bytes of output", result.exit_code, result.text.len());
                result
            }
            Err(err) => {
                warn!("automation tool did not complete: {}", err);
                CommandResult {
                    exit_code: -1,
                    text: format!("automation tool did not complete: {err}"),
                }
            }
        }
    }
}
