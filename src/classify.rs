//! Heuristic classification of raw automation-tool output.
//!
//! The contract with the external tool is its human-readable text, so the
//! verdict comes from ordered, case-sensitive substring rules over the whole
//! captured blob, first match wins. Marker words inside unrelated log lines
//! can therefore misclassify a result; that is a known limitation of the
//! text contract, kept as-is. Everything not positively recognized resolves
//! to `Unknown`: an unconfirmed service is treated as down, never as up.

use crate::models::{ActionOutcome, HealthState, ServiceAction};

pub const UNREACHABLE_MARKER: &str = "UNREACHABLE";
pub const FAILED_MARKER: &str = "FAILED";
pub const SUCCESS_MARKER: &str = "SUCCESS";
pub const CHANGED_MARKER: &str = "CHANGED";

const STATE_RUNNING: &str = "\"state\": \"running\"";
const STATE_STOPPED: &str = "\"state\": \"stopped\"";
const CHANGED_TRUE: &str = "\"changed\": true";
const CHANGED_FALSE: &str = "\"changed\": false";

/// One ordered rule: every marker must be present for the verdict to apply.
struct Rule<T> {
    all: &'static [&'static str],
    verdict: T,
}

fn first_match<T: Copy>(rules: &[Rule<T>], text: &str, fallback: T) -> T {
    rules
        .iter()
        .find(|rule| rule.all.iter().all(|marker| text.contains(marker)))
        .map(|rule| rule.verdict)
        .unwrap_or(fallback)
}

/// Rule order matters: an unreachable host also prints failure counters, so
/// the unreachable marker must win over the generic failure marker, and both
/// must win over any stale success wording later in the blob.
const HEALTH_RULES: &[Rule<HealthState>] = &[
    Rule { all: &[UNREACHABLE_MARKER], verdict: HealthState::Unreachable },
    Rule { all: &[FAILED_MARKER], verdict: HealthState::ActionFailed },
    Rule { all: &[SUCCESS_MARKER, STATE_RUNNING], verdict: HealthState::ServiceRunning },
    Rule { all: &[SUCCESS_MARKER, STATE_STOPPED], verdict: HealthState::ServiceStopped },
];

const PROBE_RULES: &[Rule<HealthState>] = &[
    Rule { all: &[UNREACHABLE_MARKER], verdict: HealthState::Unreachable },
    Rule { all: &[FAILED_MARKER], verdict: HealthState::ActionFailed },
    Rule { all: &[SUCCESS_MARKER], verdict: HealthState::Reachable },
];

/// Map a service-state query's output to a health verdict.
pub fn classify_health(text: &str) -> HealthState {
    first_match(HEALTH_RULES, text, HealthState::Unknown)
}

/// Map a reachability probe's output to a health verdict.
pub fn classify_probe(text: &str) -> HealthState {
    first_match(PROBE_RULES, text, HealthState::Unknown)
}

/// Map a state-change attempt's output to an outcome, relative to the state
/// that was requested: a start only counts as `Succeeded` when the tool both
/// reports a change and shows the service in the requested state afterwards.
pub fn classify_action(text: &str, action: ServiceAction) -> ActionOutcome {
    let desired_state = match action {
        ServiceAction::Started | ServiceAction::Restarted => STATE_RUNNING,
        ServiceAction::Stopped => STATE_STOPPED,
    };
    if text.contains(UNREACHABLE_MARKER) {
        return ActionOutcome::Unreachable;
    }
    if text.contains(FAILED_MARKER) {
        return ActionOutcome::Failed;
    }
    let acknowledged = text.contains(SUCCESS_MARKER) || text.contains(CHANGED_MARKER);
    if acknowledged && text.contains(CHANGED_FALSE) {
        return ActionOutcome::NoChangeNeeded;
    }
    if acknowledged && text.contains(CHANGED_TRUE) && text.contains(desired_state) {
        return ActionOutcome::Succeeded;
    }
    ActionOutcome::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNING_STATUS: &str = r#"web01 | SUCCESS => {
    "changed": false,
    "exists": true,
    "name": "W3SVC",
    "state": "running"
}"#;

    const STOPPED_STATUS: &str = r#"web01 | SUCCESS => {
    "changed": false,
    "exists": true,
    "name": "W3SVC",
    "state": "stopped"
}"#;

    const UNREACHABLE_OUTPUT: &str = r#"web01 | UNREACHABLE! => {
    "changed": false,
    "msg": "ssl: HTTPSConnectionPool(host='web01', port=5986): Max retries exceeded",
    "unreachable": true
}"#;

    const FAILED_OUTPUT: &str = r#"web01 | FAILED! => {
    "changed": false,
    "msg": "Service 'W3SVC' not installed"
}"#;

    const START_CHANGED: &str = r#"web01 | CHANGED => {
    "changed": true,
    "exists": true,
    "name": "W3SVC",
    "state": "running"
}"#;

    const START_NOOP: &str = r#"web01 | SUCCESS => {
    "changed": false,
    "exists": true,
    "name": "W3SVC",
    "state": "running"
}"#;

    #[test]
    fn running_service_is_recognized() {
        assert_eq!(classify_health(RUNNING_STATUS), HealthState::ServiceRunning);
    }

    #[test]
    fn stopped_service_is_recognized() {
        assert_eq!(classify_health(STOPPED_STATUS), HealthState::ServiceStopped);
    }

    #[test]
    fn unreachable_host_is_recognized() {
        assert_eq!(classify_health(UNREACHABLE_OUTPUT), HealthState::Unreachable);
    }

    #[test]
    fn module_failure_is_recognized() {
        assert_eq!(classify_health(FAILED_OUTPUT), HealthState::ActionFailed);
    }

    #[test]
    fn unreachable_wins_over_later_success_markers() {
        // Retry noise can print a stale success block after the unreachable
        // verdict; precedence has to hold regardless of position.
        let mixed = format!("{UNREACHABLE_OUTPUT}\nretrying...\n{RUNNING_STATUS}");
        assert_eq!(classify_health(&mixed), HealthState::Unreachable);
        let mixed_rev = format!("{RUNNING_STATUS}\n{UNREACHABLE_OUTPUT}");
        assert_eq!(classify_health(&mixed_rev), HealthState::Unreachable);
    }

    #[test]
    fn failed_wins_over_success_when_both_present() {
        let mixed = format!("{FAILED_OUTPUT}\n{RUNNING_STATUS}");
        assert_eq!(classify_health(&mixed), HealthState::ActionFailed);
    }

    #[test]
    fn markerless_text_is_unknown_not_healthy() {
        assert_eq!(classify_health(""), HealthState::Unknown);
        assert_eq!(
            classify_health("connection reset by peer\ncould not launch ansible"),
            HealthState::Unknown
        );
    }

    #[test]
    fn success_without_a_state_token_is_unknown() {
        assert_eq!(
            classify_health("web01 | SUCCESS => { \"ping\": \"pong\" }"),
            HealthState::Unknown
        );
    }

    #[test]
    fn markers_are_case_sensitive() {
        assert_eq!(classify_health("web01 | success => running"), HealthState::Unknown);
    }

    #[test]
    fn probe_pong_is_reachable() {
        assert_eq!(
            classify_probe("web01 | SUCCESS => { \"changed\": false, \"ping\": \"pong\" }"),
            HealthState::Reachable
        );
        assert_eq!(classify_probe(UNREACHABLE_OUTPUT), HealthState::Unreachable);
        assert_eq!(classify_probe("no inventory matched"), HealthState::Unknown);
    }

    #[test]
    fn start_that_changed_state_succeeded() {
        assert_eq!(
            classify_action(START_CHANGED, ServiceAction::Started),
            ActionOutcome::Succeeded
        );
    }

    #[test]
    fn start_against_running_service_is_a_noop() {
        assert_eq!(
            classify_action(START_NOOP, ServiceAction::Started),
            ActionOutcome::NoChangeNeeded
        );
    }

    #[test]
    fn changed_flag_alone_separates_success_from_noop() {
        // Identical text apart from the changed flag must split the verdict.
        let changed = START_CHANGED.replace(CHANGED_MARKER, SUCCESS_MARKER);
        let unchanged = changed.replace("\"changed\": true", "\"changed\": false");
        assert_eq!(classify_action(&changed, ServiceAction::Started), ActionOutcome::Succeeded);
        assert_eq!(
            classify_action(&unchanged, ServiceAction::Started),
            ActionOutcome::NoChangeNeeded
        );
    }

    #[test]
    fn stop_is_judged_against_the_stopped_state() {
        let stopped = r#"web01 | CHANGED => {
    "changed": true,
    "state": "stopped"
}"#;
        assert_eq!(classify_action(stopped, ServiceAction::Stopped), ActionOutcome::Succeeded);
        // The same text does not certify a start.
        assert_eq!(classify_action(stopped, ServiceAction::Started), ActionOutcome::Unknown);
    }

    #[test]
    fn action_against_unreachable_host() {
        assert_eq!(
            classify_action(UNREACHABLE_OUTPUT, ServiceAction::Started),
            ActionOutcome::Unreachable
        );
    }

    #[test]
    fn action_failure_and_ambiguity() {
        assert_eq!(classify_action(FAILED_OUTPUT, ServiceAction::Started), ActionOutcome::Failed);
        assert_eq!(classify_action("", ServiceAction::Started), ActionOutcome::Unknown);
        // A change acknowledgement without the requested end state proves
        // nothing.
        assert_eq!(
            classify_action("web01 | CHANGED => { \"changed\": true }", ServiceAction::Started),
            ActionOutcome::Unknown
        );
    }
}
