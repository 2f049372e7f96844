//! Child-process execution for the automation tool.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::RunnerError;
use crate::models::CommandResult;

/// Runs one external command to completion and hands back whatever it
/// printed. Exit codes are reported as data; interpreting the text is the
/// classifier's job. Implementations must enforce the given timeout.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        env_overrides: &[(String, String)],
        timeout: Duration,
    ) -> Result<CommandResult, RunnerError>;
}

/// The real thing: spawns a fresh child per call with stdout and stderr
/// piped, env overrides layered on top of the inherited environment, and the
/// child killed if it outlives the timeout.
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        env_overrides: &[(String, String)],
        timeout: Duration,
    ) -> Result<CommandResult, RunnerError> {
        debug!("Spawning {} with {} args", program, args.len());

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in env_overrides {
            cmd.env(key, value);
        }

        let child = cmd.spawn().map_err(|source| RunnerError::Spawn {
            program: program.to_string(),
            source,
        })?;

        // Dropping the wait future on timeout kills the child via
        // kill_on_drop, so a hung remote call cannot pin the tick forever.
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(RunnerError::Wait {
                    program: program.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(RunnerError::TimedOut {
                    program: program.to_string(),
                    timeout,
                })
            }
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&String::from_utf8_lossy(&output.stderr));
        }

        // Terminated by signal: no code to report, -1 stands in.
        let exit_code = output.status.code().unwrap_or(-1);

        Ok(CommandResult { exit_code, text })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let result = ProcessRunner
            .run("echo", &args(&["status: running"]), &[], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.text.trim(), "status: running");
    }

    #[tokio::test]
    async fn nonzero_exit_is_data_not_an_error() {
        let result = ProcessRunner
            .run("false", &[], &[], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(result.exit_code, 1);
    }

    #[tokio::test]
    async fn stderr_is_folded_into_the_text() {
        let result = ProcessRunner
            .run(
                "sh",
                &args(&["-c", "echo out; echo err >&2"]),
                &[],
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        assert!(result.text.contains("out"));
        assert!(result.text.contains("err"));
    }

    #[tokio::test]
    async fn env_overrides_reach_the_child() {
        let result = ProcessRunner
            .run(
                "sh",
                &args(&["-c", "printf '%s' \"$PULSE_PROBE\""]),
                &[("PULSE_PROBE".to_string(), "forty-two".to_string())],
                Duration::from_secs(5),
            )
            .await
            .unwrap();
        assert_eq!(result.text, "forty-two");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let err = ProcessRunner
            .run("definitely-not-a-real-binary", &[], &[], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::Spawn { .. }));
    }

    #[tokio::test]
    async fn hung_child_is_killed_at_the_deadline() {
        let started = std::time::Instant::now();
        let err = ProcessRunner
            .run("sleep", &args(&["30"]), &[], Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, RunnerError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
