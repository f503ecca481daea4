use async_trait::async_trait;
use tracing::debug;

use crate::error::{AppError, AppResult, ManagerError};

/// Executes a worker invocation given as an argument vector.
///
/// Process execution sits behind this port so dispatch logic can be
/// exercised in tests without spawning real processes.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `argv` to completion and return its exit code (`None` when the
    /// process was terminated by a signal).
    ///
    /// # Errors
    ///
    /// Returns an error when the process cannot be started.
    async fn run(&self, argv: &[String]) -> AppResult<Option<i32>>;
}

/// Runs invocations as real child processes. The argument vector is handed
/// to the OS directly; nothing is interpreted by a local shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, argv: &[String]) -> AppResult<Option<i32>> {
        let (program, rest) = argv
            .split_first()
            .ok_or_else(|| AppError::manager(ManagerError::EmptyInvocation))?;
        debug!("Running {:?}", argv);
        let status = tokio::process::Command::new(program)
            .args(rest)
            .status()
            .await
            .map_err(|err| {
                AppError::manager(ManagerError::Spawn {
                    program: program.clone(),
                    source: err,
                })
            })?;
        Ok(status.code())
    }
}
