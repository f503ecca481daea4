use std::path::Path;

use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::error::{AppError, AppResult, TraceError};

/// One line of the trace file.
#[derive(Debug, Clone, Deserialize)]
pub struct TraceRecord {
    /// The work string submitted to the master.
    pub work: String,
    /// The exact response expected back.
    pub resp: String,
    /// Dispatch offset from the start of the trace, in milliseconds.
    pub time: u64,
}

/// A trace record with its position in the file. Positions double as job
/// ids in the results summary.
#[derive(Debug, Clone)]
pub struct TraceJob {
    pub id: usize,
    pub record: TraceRecord,
}

/// Load trace jobs from `path`, or from standard input when `None`.
///
/// # Errors
///
/// A record that does not parse aborts the whole run with its line number;
/// I/O failures are fatal as well.
pub async fn load_trace(path: Option<&Path>) -> AppResult<Vec<TraceJob>> {
    match path {
        Some(path) => {
            let file = tokio::fs::File::open(path).await.map_err(|err| {
                AppError::trace(TraceError::Io {
                    context: "open trace file",
                    source: err,
                })
            })?;
            read_jobs(BufReader::new(file)).await
        }
        None => read_jobs(BufReader::new(tokio::io::stdin())).await,
    }
}

pub(crate) async fn read_jobs<TReader>(mut reader: TReader) -> AppResult<Vec<TraceJob>>
where
    TReader: AsyncBufRead + Unpin,
{
    let mut jobs = Vec::new();
    let mut line = String::new();
    let mut line_no = 0usize;
    loop {
        line.clear();
        let bytes = reader.read_line(&mut line).await.map_err(|err| {
            AppError::trace(TraceError::Io {
                context: "read trace",
                source: err,
            })
        })?;
        if bytes == 0 {
            break;
        }
        line_no = line_no.saturating_add(1);
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: TraceRecord = serde_json::from_str(trimmed).map_err(|err| {
            AppError::trace(TraceError::MalformedRecord {
                line: line_no,
                source: err,
            })
        })?;
        jobs.push(TraceJob {
            id: jobs.len(),
            record,
        });
    }
    Ok(jobs)
}
