use std::sync::Arc;

use tokio::io::AsyncRead;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::protocol::recv_string;

use super::launcher::WorkerLauncher;
use super::runner::CommandRunner;

/// Drive one master connection through its lifecycle: read the callback
/// address, stream worker-argument lines, launch one worker per line
/// without waiting for earlier launches, and join every launch before
/// giving up the socket.
///
/// The master closing its end is the normal termination signal, both
/// before the first worker line and between lines. Launch failures are
/// logged per launch and never abort the connection.
///
/// # Errors
///
/// Returns an error when a frame violates the wire protocol (after all
/// launches already spawned have been joined).
pub async fn handle_connection<TConn>(
    mut stream: TConn,
    launcher: Arc<WorkerLauncher>,
    runner: Arc<dyn CommandRunner>,
) -> AppResult<()>
where
    TConn: AsyncRead + Unpin,
{
    let callback_addr = match recv_string(&mut stream).await {
        Ok(addr) => addr,
        Err(err) if err.is_connection_closed() => {
            debug!("Master closed before sending a callback address");
            return Ok(());
        }
        Err(err) => return Err(err),
    };
    info!("Master is listening on {}", callback_addr);

    let mut launches: JoinSet<()> = JoinSet::new();
    let mut result = Ok(());
    loop {
        match recv_string(&mut stream).await {
            Ok(worker_args) => {
                let launcher = launcher.clone();
                let runner = runner.clone();
                let addr = callback_addr.clone();
                launches.spawn(async move {
                    if let Err(err) = launcher.launch(runner.as_ref(), &addr, &worker_args).await {
                        warn!("Worker launch failed: {}", err);
                    }
                });
            }
            Err(err) if err.is_connection_closed() => break,
            Err(err) => {
                result = Err(err);
                break;
            }
        }
    }

    // Teardown back-pressure: every launch spawned on behalf of this
    // connection finishes before the handler closes its socket.
    while launches.join_next().await.is_some() {}
    info!("Connection from {} closed", callback_addr);
    result
}
