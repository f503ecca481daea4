use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{AppError, AppResult, ManagerError};

use super::hosts::HostPool;
use super::runner::CommandRunner;

/// Prefixes that mark a callback address as loopback. Not exhaustive: this
/// catches silly configuration mistakes early rather than leaving users
/// lost and confused.
const LOOPBACK_PREFIXES: [&str; 4] = ["localhost", "127.0.0.1", "0:0:0:0:0:0:0:1", "::1"];

#[must_use]
pub fn is_loopback_address(addr: &str) -> bool {
    LOOPBACK_PREFIXES
        .iter()
        .any(|prefix| addr.starts_with(prefix))
}

/// Where workers run: on this machine, or over ssh on a pool of remote
/// hosts. Chosen once at process start and shared by every launch.
#[derive(Debug, Clone)]
pub enum LaunchMode {
    Local,
    Remote(Arc<HostPool>),
}

/// Builds and runs worker invocations on behalf of one node manager.
#[derive(Debug)]
pub struct WorkerLauncher {
    worker_bin: String,
    shared_args: Vec<String>,
    mode: LaunchMode,
}

impl WorkerLauncher {
    #[must_use]
    pub const fn new(worker_bin: String, shared_args: Vec<String>, mode: LaunchMode) -> Self {
        Self {
            worker_bin,
            shared_args,
            mode,
        }
    }

    /// The argument vector for one worker: the shared arguments first, then
    /// the per-launch parameter block when present, then the callback
    /// address as the final positional argument.
    #[must_use]
    pub fn build_invocation(&self, callback_addr: &str, worker_args: &str) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.shared_args.len().saturating_add(3));
        argv.push(self.worker_bin.clone());
        argv.extend(self.shared_args.iter().cloned());
        if !worker_args.is_empty() {
            argv.push(format!("--workerparams={}", worker_args));
        }
        argv.push(callback_addr.to_owned());
        argv
    }

    /// Launch one worker bound to `(callback_addr, worker_args)` and wait
    /// for it to finish.
    ///
    /// # Errors
    ///
    /// Local launches fail only when the process cannot be started. Remote
    /// launches additionally fail with [`ManagerError::LoopbackCallback`]
    /// for a loopback callback address (raised before any host is
    /// reserved) and [`ManagerError::NoHostAvailable`] when the pool is
    /// exhausted; the launch is dropped, never queued.
    pub async fn launch(
        &self,
        runner: &dyn CommandRunner,
        callback_addr: &str,
        worker_args: &str,
    ) -> AppResult<()> {
        match &self.mode {
            LaunchMode::Local => self.launch_local(runner, callback_addr, worker_args).await,
            LaunchMode::Remote(pool) => {
                self.launch_remote(runner, pool, callback_addr, worker_args)
                    .await
            }
        }
    }

    async fn launch_local(
        &self,
        runner: &dyn CommandRunner,
        callback_addr: &str,
        worker_args: &str,
    ) -> AppResult<()> {
        let argv = self.build_invocation(callback_addr, worker_args);
        info!("Launch worker: {:?}", argv);
        let status = runner.run(&argv).await?;
        log_exit(status);
        Ok(())
    }

    async fn launch_remote(
        &self,
        runner: &dyn CommandRunner,
        pool: &Arc<HostPool>,
        callback_addr: &str,
        worker_args: &str,
    ) -> AppResult<()> {
        if is_loopback_address(callback_addr) {
            return Err(AppError::manager(ManagerError::LoopbackCallback {
                addr: callback_addr.to_owned(),
            }));
        }
        let host = pool
            .reserve()
            .ok_or_else(|| AppError::manager(ManagerError::NoHostAvailable))?;

        let mut argv = vec![
            "ssh".to_owned(),
            "-o".to_owned(),
            "StrictHostKeyChecking=no".to_owned(),
            host.clone(),
        ];
        argv.extend(self.build_invocation(callback_addr, worker_args));
        info!("Launch worker on {}: {:?}", host, argv);

        let run_result = runner.run(&argv).await;
        // The host goes back regardless of how the remote command exited.
        pool.release(host);
        let status = run_result?;
        log_exit(status);
        Ok(())
    }
}

fn log_exit(status: Option<i32>) {
    match status {
        Some(code) => info!("Worker returned with status {}", code),
        None => warn!("Worker terminated by signal"),
    }
}
