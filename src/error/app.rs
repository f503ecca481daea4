use thiserror::Error;

use super::{ManagerError, ProtocolError, TraceError, ValidationError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("Node manager error: {0}")]
    Manager(#[from] ManagerError),
    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation<E>(error: E) -> Self
    where
        E: Into<ValidationError>,
    {
        error.into().into()
    }

    pub fn protocol<E>(error: E) -> Self
    where
        E: Into<ProtocolError>,
    {
        error.into().into()
    }

    pub fn manager<E>(error: E) -> Self
    where
        E: Into<ManagerError>,
    {
        error.into().into()
    }

    pub fn trace<E>(error: E) -> Self
    where
        E: Into<TraceError>,
    {
        error.into().into()
    }

    /// True when the error is the graceful end-of-stream signal raised by
    /// `recv_string` after the peer closed its connection.
    #[must_use]
    pub const fn is_connection_closed(&self) -> bool {
        matches!(self, Self::Protocol(ProtocolError::ConnectionClosed))
    }
}
