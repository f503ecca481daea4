//! Node manager: accepts master connections and turns worker-argument
//! lines into running worker processes, locally or on remote hosts.
//! Workers connect back to the master directly; nothing is relayed here.

mod connection;
mod hosts;
mod launcher;
mod runner;

#[cfg(test)]
mod tests;

pub use connection::handle_connection;
pub use hosts::HostPool;
pub use launcher::{LaunchMode, WorkerLauncher, is_loopback_address};
pub use runner::{CommandRunner, ProcessRunner};

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::args::NodeManagerArgs;
use crate::error::{AppError, AppResult, ManagerError};

/// Run the node manager: bind the listener and serve master connections
/// until the process is killed.
///
/// # Errors
///
/// Returns an error when the listen port cannot be bound or the accept
/// loop fails.
pub async fn run(args: NodeManagerArgs) -> AppResult<()> {
    let NodeManagerArgs {
        host,
        worker,
        port,
        worker_args,
        ..
    } = args;

    let mode = if host.is_empty() {
        LaunchMode::Local
    } else {
        info!("Launching on remote hosts: {:?}", host);
        LaunchMode::Remote(Arc::new(HostPool::new(host)))
    };
    let launcher = Arc::new(WorkerLauncher::new(worker, worker_args, mode));

    let listener = bind_listener(port).await?;
    serve(listener, launcher, Arc::new(ProcessRunner)).await
}

async fn bind_listener(port: u16) -> AppResult<TcpListener> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await.map_err(|err| {
        AppError::manager(ManagerError::Bind { addr, source: err })
    })?;
    info!("Listening on {}", port);
    Ok(listener)
}

/// Accept master connections forever, one handler task per connection.
/// Connections are fully independent; a failed handler never takes the
/// listener down.
///
/// # Errors
///
/// Returns an error when accepting a connection fails.
pub async fn serve(
    listener: TcpListener,
    launcher: Arc<WorkerLauncher>,
    runner: Arc<dyn CommandRunner>,
) -> AppResult<()> {
    loop {
        let (stream, peer) = listener.accept().await.map_err(|err| {
            AppError::manager(ManagerError::Io {
                context: "accept master connection",
                source: err,
            })
        })?;
        info!("Connection from {}", peer);
        let conn_launcher = launcher.clone();
        let conn_runner = runner.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, conn_launcher, conn_runner).await {
                warn!("Master connection failed: {}", err);
            }
        });
    }
}
