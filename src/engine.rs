use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::ansible::AnsibleClient;
use crate::classify::{classify_action, classify_health, classify_probe};
use crate::config::{AppConfig, Target};
use crate::models::{
    ActionOutcome, ActionReport, CheckReport, HealthState, MonitorState, ServiceAction,
    StatusSummary,
};
use crate::runner::CommandRunner;

/// The sentinel: one recurring check against one remote service, with
/// automatic start when the service is not confirmed running.
pub struct Monitor {
    client: AnsibleClient,
    service_name: String,
    period: Duration,
    state: RwLock<MonitorState>,
    /// Single-slot token around query + decide + remediate. The scheduled
    /// loop and manual checks both take it, so two checks can never drive
    /// the remote host at the same time; a manual check that arrives while
    /// a tick is in flight waits its turn.
    tick_lock: Mutex<()>,
}

impl Monitor {
    pub fn new(config: AppConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let client = AnsibleClient::new(
            runner,
            config.service_name.clone(),
            Duration::from_secs(config.command_timeout),
        );
        Self {
            client,
            service_name: config.service_name,
            period: Duration::from_secs(config.check_interval),
            state: RwLock::new(MonitorState {
                target: config.target,
                enabled: config.enabled,
            }),
            tick_lock: Mutex::new(()),
        }
    }

    /// Scheduled loop. Checks run strictly one after another: the next sleep
    /// only starts once the current tick is done, and nothing a tick does can
    /// end the loop.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        info!(
            "Sentinel active: {} checked every {}s",
            self.service_name,
            self.period.as_secs()
        );
        loop {
            self.tick().await;
            tokio::time::sleep(self.period).await;
        }
    }

    async fn tick(&self) {
        if !self.state.read().await.enabled {
            debug!("Monitoring disabled, skipping scheduled check");
            return;
        }
        info!("Scheduled check starting");
        let report = self.run_check().await;
        info!(
            "Scheduled check done: health {:?}, remediation {:?}",
            report.health, report.remediation
        );
    }

    /// One full check: query the service state and, unless it is positively
    /// running, attempt one automatic start. Runs under the tick lock; the
    /// target snapshot is taken once at entry, so a concurrent config update
    /// only affects the next check.
    pub async fn run_check(&self) -> CheckReport {
        let _slot = self.tick_lock.lock().await;
        let target = self.state.read().await.target.clone();

        let status = self.client.query_service_state(&target).await;
        let health = classify_health(&status.text);

        if health == HealthState::ServiceRunning {
            info!("{} is running, no action needed", self.service_name);
            return CheckReport {
                timestamp: Utc::now(),
                health,
                remediation: None,
                detail: status.text,
            };
        }

        // Fail closed: unreachable, stopped, failed and unknown all get the
        // same single start attempt. Unreachable is included; the outage may
        // be the service itself holding the WinRM listener down.
        if health == HealthState::Unknown {
            warn!(
                "Could not determine {} state from response: {}",
                self.service_name,
                status.text.trim()
            );
        }
        warn!(
            "{} not confirmed running ({:?}), attempting automatic start",
            self.service_name, health
        );

        let action = self
            .client
            .set_service_state(&target, ServiceAction::Started)
            .await;
        let outcome = classify_action(&action.text, ServiceAction::Started);
        match outcome {
            ActionOutcome::Succeeded => info!("{} started automatically", self.service_name),
            ActionOutcome::NoChangeNeeded => {
                info!("{} was already back up, nothing to change", self.service_name)
            }
            ActionOutcome::Unreachable => {
                error!("Automatic start failed, host unreachable: {}", target.host)
            }
            ActionOutcome::Failed | ActionOutcome::Unknown => error!(
                "Automatic start of {} not confirmed: {}",
                self.service_name,
                action.text.trim()
            ),
        }

        CheckReport {
            timestamp: Utc::now(),
            health,
            remediation: Some(outcome),
            detail: action.text,
        }
    }

    /// Manual trigger: same check body, same lock, regardless of the enabled
    /// flag. An operator asking for a check always gets one.
    pub async fn check_now(&self) -> CheckReport {
        info!("Manual check triggered");
        self.run_check().await
    }

    /// Reachability probe against an arbitrary target. Control-plane only,
    /// no remediation, no tick lock.
    pub async fn probe(&self, target: &Target) -> CheckReport {
        let result = self.client.probe(target).await;
        CheckReport {
            timestamp: Utc::now(),
            health: classify_probe(&result.text),
            remediation: None,
            detail: result.text,
        }
    }

    /// Service-state query against an arbitrary target, without the
    /// remediation step.
    pub async fn query_service(&self, target: &Target) -> CheckReport {
        let result = self.client.query_service_state(target).await;
        CheckReport {
            timestamp: Utc::now(),
            health: classify_health(&result.text),
            remediation: None,
            detail: result.text,
        }
    }

    /// Operator-requested start/stop/restart against an arbitrary target.
    pub async fn apply_service_action(
        &self,
        target: &Target,
        action: ServiceAction,
    ) -> ActionReport {
        let result = self.client.set_service_state(target, action).await;
        let outcome = classify_action(&result.text, action);
        info!("Requested {:?}: outcome {:?}", action, outcome);
        ActionReport {
            timestamp: Utc::now(),
            outcome,
            detail: result.text,
        }
    }

    pub async fn set_enabled(&self, enabled: bool) {
        self.state.write().await.enabled = enabled;
        info!(
            "Monitoring {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Swap the monitored target wholesale. Callers validate first; a check
    /// already in flight keeps the snapshot it took.
    pub async fn update_target(&self, target: Target) {
        info!("Monitoring target updated: {}@{}", target.user, target.host);
        self.state.write().await.target = target;
    }

    pub async fn status(&self) -> StatusSummary {
        let state = self.state.read().await;
        StatusSummary {
            host: state.target.host.clone(),
            user: state.target.user.clone(),
            service: self.service_name.clone(),
            enabled: state.enabled,
            period_secs: self.period.as_secs(),
        }
    }
}
