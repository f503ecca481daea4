use chrono::{DateTime, Local};
use hdrhistogram::Histogram;

use crate::error::{AppError, AppResult, TraceError};

/// Work string of the drain request that ends a trace. The job is replayed
/// like any other but excluded from the latency statistics.
pub const LAST_REQUEST_WORK: &str = "cmd=lastrequest";

/// Fixed-point divisor for two-decimal output.
const CENTI_DIVISOR: u64 = 100;
/// Milliseconds per second.
const MS_PER_SEC: u64 = 1_000;

/// Outcome of one trace job, retained read-only for the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub id: usize,
    pub work: String,
    pub latency_ms: u64,
    pub response: String,
    pub success: bool,
}

/// Everything the report phase needs once the last job has completed.
#[derive(Debug)]
pub struct TraceReport {
    pub started_at: DateTime<Local>,
    pub results: Vec<JobResult>,
    pub total_elapsed_ms: u64,
}

impl TraceReport {
    /// Mean latency over the counted jobs in centimilliseconds, or `None`
    /// when every job was a sentinel.
    #[must_use]
    pub fn mean_latency_ms_x100(&self) -> Option<u64> {
        let mut sum_ms = 0u64;
        let mut counted = 0u64;
        for result in self.counted_results() {
            sum_ms = sum_ms.saturating_add(result.latency_ms);
            counted = counted.saturating_add(1);
        }
        sum_ms.saturating_mul(CENTI_DIVISOR).checked_div(counted)
    }

    /// Latency percentiles (p50/p90/p99) over the counted jobs.
    ///
    /// # Errors
    ///
    /// Returns an error when the histogram rejects a value.
    pub fn latency_percentiles(&self) -> AppResult<(u64, u64, u64)> {
        let mut hist = Histogram::<u64>::new(3).map_err(|err| {
            AppError::trace(TraceError::Bookkeeping {
                context: "create latency histogram",
                source: Box::new(err),
            })
        })?;
        for result in self.counted_results() {
            hist.record(result.latency_ms.max(1)).map_err(|err| {
                AppError::trace(TraceError::Bookkeeping {
                    context: "record latency",
                    source: Box::new(err),
                })
            })?;
        }
        if hist.len() == 0 {
            return Ok((0, 0, 0));
        }
        Ok((
            hist.value_at_quantile(0.5),
            hist.value_at_quantile(0.9),
            hist.value_at_quantile(0.99),
        ))
    }

    fn counted_results(&self) -> impl Iterator<Item = &JobResult> {
        self.results
            .iter()
            .filter(|result| result.work != LAST_REQUEST_WORK)
    }

    /// Render the results block: one line per counted job, then the
    /// aggregate latency and elapsed-time lines.
    ///
    /// # Errors
    ///
    /// Returns an error when latency bookkeeping fails.
    pub fn lines(&self) -> AppResult<Vec<String>> {
        let mut lines = Vec::new();
        lines.push(String::new());
        lines.push("--- Results Summary ---".to_owned());
        lines.push(format!(
            "Trace started at {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S")
        ));
        lines.push(String::new());

        for result in self.counted_results() {
            let success = if result.success { "YES" } else { "NO" };
            lines.push(format!(
                "[{}] Request: {}, success: {}, latency: {}",
                result.id, result.work, success, result.latency_ms
            ));
        }
        lines.push(String::new());

        match self.mean_latency_ms_x100() {
            Some(mean_x100) => lines.push(format!(
                "Avg request latency: {}.{:02} ms",
                mean_x100 / CENTI_DIVISOR,
                mean_x100 % CENTI_DIVISOR
            )),
            None => lines.push("Avg request latency: n/a (no counted jobs)".to_owned()),
        }
        let (p50, p90, p99) = self.latency_percentiles()?;
        lines.push(format!(
            "P50/P90/P99 request latency: {} / {} / {} ms",
            p50, p90, p99
        ));
        let total = self.total_elapsed_ms;
        lines.push(format!(
            "Total test time {}.{:02} sec",
            total / MS_PER_SEC,
            (total % MS_PER_SEC) / 10
        ));
        lines.push(String::new());
        Ok(lines)
    }

    /// Print the results summary to stdout.
    ///
    /// # Errors
    ///
    /// Returns an error when latency bookkeeping fails.
    pub fn print(&self) -> AppResult<()> {
        for line in self.lines()? {
            println!("{}", line);
        }
        Ok(())
    }
}
