//! Bounded external process execution

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

pub(crate) enum RunError {
    Spawn(std::io::Error),
    TimedOut,
    Failed { code: Option<i32>, stderr: String },
}

/// Run `command` to completion within `limit`; the child is killed if the future is dropped.
pub(crate) async fn run_bounded(mut command: Command, limit: Duration) -> Result<Output, RunError> {
    command.kill_on_drop(true);
    tracing::debug!(command = ?command.as_std(), "Spawning");

    let output = match tokio::time::timeout(limit, command.output()).await {
        Err(_) => return Err(RunError::TimedOut),
        Ok(result) => result.map_err(RunError::Spawn)?,
    };

    if output.status.success() {
        Ok(output)
    } else {
        Err(RunError::Failed {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(e) => write!(f, "could not start process: {e}"),
            Self::TimedOut => write!(f, "process timed out"),
            Self::Failed { code, stderr } => match code {
                Some(code) => write!(f, "exit status {code}: {stderr}"),
                None => write!(f, "terminated by signal: {stderr}"),
            },
        }
    }
}
