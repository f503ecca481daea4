//! Trace-driven load generator: waits for a master to become ready, then
//! replays a timestamped trace of requests over pooled connections and
//! reports per-request latency and correctness.

mod player;
mod pool;
mod records;
mod summary;


pub use player::{await_ready, run_trace};
pub use pool::ConnectionPool;
pub use records::{TraceJob, TraceRecord, load_trace};
pub use summary::{JobResult, LAST_REQUEST_WORK, TraceReport};

use std::sync::Arc;

use crate::args::WorkGenArgs;
use crate::error::AppResult;

/// Run the load generator end to end: wait for the master, replay the
/// trace, and print the results summary.
///
/// # Errors
///
/// Fails when the master cannot be reached, the trace is malformed or
/// empty, or a wire exchange during the readiness poll breaks protocol.
pub async fn run(args: &WorkGenArgs) -> AppResult<()> {
    let pool = Arc::new(ConnectionPool::new(args.address.to_string()));
    await_ready(&pool).await?;
    let jobs = load_trace(args.tracefile.as_deref()).await?;
    let report = run_trace(&pool, jobs).await?;
    report.print()
}
