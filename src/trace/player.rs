use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, TraceError};
use crate::protocol::{Tag, TaggedMessage, recv_string, send_string};

use super::pool::ConnectionPool;
use super::records::TraceJob;
use super::summary::{JobResult, TraceReport};

/// Delay between readiness probes.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);
/// Response literal that marks the master ready for work.
const READY_RESPONSE: &str = "ready";

/// Poll the master until it reports readiness.
///
/// # Errors
///
/// Fails when a connection cannot be established or a probe exchange
/// violates the wire protocol.
pub async fn await_ready(pool: &ConnectionPool) -> AppResult<()> {
    info!("Waiting for server to initialize...");
    loop {
        let mut conn = pool.checkout().await?;
        TaggedMessage::new(Tag::IsReady, 0).send(&mut conn).await?;
        TaggedMessage::receive(&mut conn).await?;
        let response = recv_string(&mut conn).await?;
        pool.checkin(conn);
        if response == READY_RESPONSE {
            break;
        }
        debug!("Master not ready yet (got {:?})", response);
        tokio::time::sleep(READY_POLL_INTERVAL).await;
    }
    info!("Server ready, beginning trace...");
    Ok(())
}

/// Replay `jobs` against the master behind `pool`.
///
/// Jobs are dispatched in file order, each no earlier than `epoch +
/// record.time` milliseconds (late under load is possible, early never
/// is), and run as independent tasks that may complete out of order.
/// Every job is joined before the report is assembled.
///
/// # Errors
///
/// Fails on an empty trace. Individual job failures are recorded in the
/// report, not raised.
pub async fn run_trace(pool: &Arc<ConnectionPool>, jobs: Vec<TraceJob>) -> AppResult<TraceReport> {
    if jobs.is_empty() {
        return Err(AppError::trace(TraceError::EmptyTrace));
    }

    let started_at = chrono::Local::now();
    let epoch = Instant::now();
    let mut tasks: JoinSet<JobResult> = JoinSet::new();
    for job in jobs {
        let target = epoch
            .checked_add(Duration::from_millis(job.record.time))
            .unwrap_or(epoch);
        loop {
            let now = Instant::now();
            if now >= target {
                break;
            }
            tokio::time::sleep(target.duration_since(now)).await;
        }
        debug!("Starting job {} ({:?})", job.id, job.record.work);
        let job_pool = pool.clone();
        tasks.spawn(async move { execute_job(&job_pool, &job).await });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(err) => warn!("Job task failed: {}", err),
        }
    }
    results.sort_by_key(|result| result.id);

    Ok(TraceReport {
        started_at,
        results,
        total_elapsed_ms: duration_to_ms(epoch.elapsed()),
    })
}

async fn execute_job(pool: &ConnectionPool, job: &TraceJob) -> JobResult {
    match job_round_trip(pool, job).await {
        Ok(result) => result,
        Err(err) => {
            warn!("Request {} failed: {}", job.id, err);
            JobResult {
                id: job.id,
                work: job.record.work.clone(),
                latency_ms: 0,
                response: String::new(),
                success: false,
            }
        }
    }
}

async fn job_round_trip(pool: &ConnectionPool, job: &TraceJob) -> AppResult<JobResult> {
    let mut conn = pool.checkout().await?;
    let before = Instant::now();
    TaggedMessage::new(Tag::Work, 0).send(&mut conn).await?;
    send_string(&mut conn, &job.record.work).await?;
    TaggedMessage::receive(&mut conn).await?;
    let response = recv_string(&mut conn).await?;
    let latency_ms = duration_to_ms(before.elapsed());
    pool.checkin(conn);

    info!(
        "Request {}: req: {:?}, resp: {:?}, latency: {} ms",
        job.id, job.record.work, response, latency_ms
    );

    let success = response == job.record.resp;
    if !success {
        warn!(
            "Incorrect response to request {} (req: {:?})",
            job.id, job.record.work
        );
        warn!("       expected: {:?}", job.record.resp);
        warn!("       received: {:?}", response);
    }

    Ok(JobResult {
        id: job.id,
        work: job.record.work.clone(),
        latency_ms,
        response,
        success,
    })
}

pub(crate) fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
