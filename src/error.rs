use std::io;
use std::time::Duration;

use thiserror::Error;

/// Rejected at the boundary, before any external command is built or run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("host must not be empty")]
    EmptyHost,
    #[error("username must not be empty")]
    EmptyUser,
    #[error("password must not be empty")]
    EmptySecret,
}

/// Failures of the command runner itself. A child that runs and exits
/// non-zero is not an error here; only not being able to start it, losing
/// the wait, or having to kill it on timeout.
///
/// Display strings stay free of classifier marker words on purpose, so a
/// runner failure rendered into output text classifies as `Unknown`.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("could not launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("lost the wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} still busy after {}s, killed", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
}
