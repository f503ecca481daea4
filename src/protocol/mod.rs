//! Wire protocol shared by the master, the node manager, and the load
//! generator: length-prefixed string frames plus a small tagged-message
//! envelope for control exchanges.
//!
//! Every string travels as a big-endian `u32` length followed by that many
//! raw bytes. A [`TaggedMessage`] is a fixed 8-byte header (tag code,
//! length) sent ahead of a separately framed payload where the call site
//! expects one; sender and receiver agree out of band on whether a payload
//! follows a given tag.


use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{AppError, AppResult, ProtocolError};

/// Upper bound on a single frame payload.
const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// Message kinds understood by all three roles. The enumeration is closed:
/// a tag code outside it is a protocol error, not an extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Submit one unit of work; followed by the work string.
    Work,
    /// Probe whether the master is ready to accept work.
    IsReady,
}

impl Tag {
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Tag::Work => 1,
            Tag::IsReady => 2,
        }
    }

    const fn from_code(code: u32) -> Result<Self, ProtocolError> {
        match code {
            1 => Ok(Tag::Work),
            2 => Ok(Tag::IsReady),
            other => Err(ProtocolError::UnknownTag { code: other }),
        }
    }
}

/// The fixed header identifying a control message's kind on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaggedMessage {
    pub tag: Tag,
    pub len: u32,
}

impl TaggedMessage {
    #[must_use]
    pub const fn new(tag: Tag, len: u32) -> Self {
        Self { tag, len }
    }

    /// Write the 8-byte header to `conn`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolError::Io`] when the underlying write fails.
    pub async fn send<TConn>(self, conn: &mut TConn) -> AppResult<()>
    where
        TConn: AsyncWrite + Unpin,
    {
        conn.write_all(&self.tag.code().to_be_bytes())
            .await
            .map_err(|err| {
                AppError::protocol(ProtocolError::Io {
                    context: "send tagged message",
                    source: err,
                })
            })?;
        conn.write_all(&self.len.to_be_bytes()).await.map_err(|err| {
            AppError::protocol(ProtocolError::Io {
                context: "send tagged message",
                source: err,
            })
        })
    }

    /// Read an 8-byte header from `conn` and validate its tag code.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ConnectionClosed`] when the peer closes
    /// before a complete header arrives, [`ProtocolError::UnknownTag`] for a
    /// tag code outside the closed enumeration, and [`ProtocolError::Io`]
    /// for any other read failure.
    pub async fn receive<TConn>(conn: &mut TConn) -> AppResult<Self>
    where
        TConn: AsyncRead + Unpin,
    {
        let code = read_u32(conn, "read tagged message").await?;
        let len = read_u32(conn, "read tagged message").await?;
        let tag = Tag::from_code(code).map_err(AppError::protocol)?;
        Ok(Self { tag, len })
    }
}

/// Send one length-prefixed string frame.
///
/// # Errors
///
/// Returns [`ProtocolError::FrameTooLarge`] when the payload exceeds the
/// frame size limit and [`ProtocolError::Io`] when the write fails.
pub async fn send_string<TConn>(conn: &mut TConn, payload: &str) -> AppResult<()>
where
    TConn: AsyncWrite + Unpin,
{
    if payload.len() > MAX_FRAME_BYTES {
        return Err(AppError::protocol(ProtocolError::FrameTooLarge {
            max_bytes: MAX_FRAME_BYTES,
        }));
    }
    let prefix = match u32::try_from(payload.len()) {
        Ok(value) => value,
        Err(_) => {
            return Err(AppError::protocol(ProtocolError::FrameTooLarge {
                max_bytes: MAX_FRAME_BYTES,
            }));
        }
    };
    conn.write_all(&prefix.to_be_bytes()).await.map_err(|err| {
        AppError::protocol(ProtocolError::Io {
            context: "send string length",
            source: err,
        })
    })?;
    conn.write_all(payload.as_bytes()).await.map_err(|err| {
        AppError::protocol(ProtocolError::Io {
            context: "send string payload",
            source: err,
        })
    })
}

/// Receive one length-prefixed string frame.
///
/// A peer that closes its end before a complete frame (length prefix or
/// full payload) is available yields [`ProtocolError::ConnectionClosed`],
/// the expected signal that the sender has no more items, not a crash.
///
/// # Errors
///
/// Returns [`ProtocolError::ConnectionClosed`] on early close,
/// [`ProtocolError::FrameTooLarge`] for an oversized announced length,
/// [`ProtocolError::InvalidUtf8`] for a non-UTF-8 payload, and
/// [`ProtocolError::Io`] for any other read failure.
pub async fn recv_string<TConn>(conn: &mut TConn) -> AppResult<String>
where
    TConn: AsyncRead + Unpin,
{
    let announced = read_u32(conn, "read string length").await?;
    let len = usize::try_from(announced).unwrap_or(usize::MAX);
    if len > MAX_FRAME_BYTES {
        return Err(AppError::protocol(ProtocolError::FrameTooLarge {
            max_bytes: MAX_FRAME_BYTES,
        }));
    }
    let mut payload = vec![0u8; len];
    read_all(conn, &mut payload, "read string payload").await?;
    String::from_utf8(payload)
        .map_err(|err| AppError::protocol(ProtocolError::InvalidUtf8 { source: err }))
}

async fn read_u32<TConn>(conn: &mut TConn, context: &'static str) -> AppResult<u32>
where
    TConn: AsyncRead + Unpin,
{
    let mut field = [0u8; 4];
    read_all(conn, &mut field, context).await?;
    Ok(u32::from_be_bytes(field))
}

async fn read_all<TConn>(
    conn: &mut TConn,
    buffer: &mut [u8],
    context: &'static str,
) -> AppResult<()>
where
    TConn: AsyncRead + Unpin,
{
    match conn.read_exact(buffer).await {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(AppError::protocol(ProtocolError::ConnectionClosed))
        }
        Err(err) => Err(AppError::protocol(ProtocolError::Io {
            context,
            source: err,
        })),
    }
}
