//! Framed byte reader, shared by the Unix-socket master endpoint and the
//! serial slave endpoint.
//!
//! Two framing modes are supported: a 4-byte ASCII-decimal length prefix,
//! and terminator-delimited accumulation. Both are generic over any
//! `AsyncRead` source, so the same code exercises a Unix socket, a serial
//! port, or (in tests) an in-memory `tokio::io::duplex` pipe.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{error::Elapsed, timeout};
use tracing::{debug, warn};

/// Outcome of a single framed read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete message, with the terminator already stripped if the
    /// caller asked for that.
    Message(Vec<u8>),
    /// The peer closed the stream (a zero-length read) before any bytes of
    /// a new message arrived.
    Eof,
}

#[derive(Debug, thiserror::Error)]
pub enum FramedReadError {
    #[error("i/o error reading frame: {0}")]
    Io(#[from] std::io::Error),
    #[error("length prefix was not 4 ASCII decimal digits: {0:?}")]
    InvalidLengthPrefix(Vec<u8>),
}

/// Read exactly one length-prefixed frame: a 4-byte ASCII decimal header
/// giving the payload length, followed by that many payload bytes.
///
/// This is a deliberately preserved wire-compatibility quirk: the header is
/// always 4 bytes wide and parsed as ASCII decimal, so payloads of length
/// 10000 or more cannot be represented. Values this large are not
/// truncated or handled specially — the header simply doesn't describe
/// them, matching the upstream protocol this crate is wire-compatible with.
pub async fn read_length_prefixed<R>(reader: &mut R) -> Result<Frame, FramedReadError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    let n = read_fill_or_eof(reader, &mut header).await?;
    if n == 0 {
        return Ok(Frame::Eof);
    }
    if n < 4 {
        return Err(FramedReadError::InvalidLengthPrefix(header[..n].to_vec()));
    }

    let text = std::str::from_utf8(&header)
        .map_err(|_| FramedReadError::InvalidLengthPrefix(header.to_vec()))?;
    let len: usize = text
        .parse()
        .map_err(|_| FramedReadError::InvalidLengthPrefix(header.to_vec()))?;

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Frame::Message(payload))
}

/// Read into `buf` until either `buf` is full or the stream reaches EOF,
/// returning the number of bytes actually read. Used by the length-prefix
/// reader, where a short header read (peer closed mid-header) is treated as
/// EOF rather than a malformed prefix.
async fn read_fill_or_eof<R>(reader: &mut R, buf: &mut [u8]) -> Result<usize, std::io::Error>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Options governing a terminator-framed read.
#[derive(Debug, Clone)]
pub struct TerminatorReadOptions {
    /// Terminator byte sequence ending a message.
    pub terminator: Vec<u8>,
    /// Number of bytes read per underlying `read()` call. The source
    /// defaults this to 1 (byte-at-a-time), trading throughput for the
    /// ability to stop the instant the terminator appears.
    pub buffer_size: usize,
    /// Strip the terminator from the returned message.
    pub strip_terminator: bool,
    /// Overall timeout for the whole message. A timeout with a non-empty
    /// accumulator returns what was read so far instead of erroring.
    pub timeout: Duration,
}

impl Default for TerminatorReadOptions {
    fn default() -> Self {
        Self {
            terminator: b"\n".to_vec(),
            buffer_size: 1,
            strip_terminator: false,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Read one terminator-delimited message, accumulating `buffer_size` bytes
/// at a time until the tail of the buffer matches `terminator`.
///
/// On a timeout with a non-empty accumulator, returns the partial message
/// read so far and logs a warning; an empty accumulator plus a read that
/// never arrives is reported as [`Frame::Eof`] once the underlying read
/// itself returns zero bytes, or propagated as a timeout error otherwise.
pub async fn read_terminated<R>(
    reader: &mut R,
    opts: &TerminatorReadOptions,
) -> Result<Frame, FramedReadError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; opts.buffer_size.max(1)];
    let mut acc: Vec<u8> = Vec::new();

    loop {
        let read_result = timeout(opts.timeout, reader.read(&mut buf)).await;
        let n = match read_result {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(FramedReadError::Io(e)),
            Err(Elapsed { .. }) => {
                if acc.is_empty() {
                    debug!("terminator read timed out with no bytes read");
                    return Ok(Frame::Eof);
                }
                warn!(
                    read_so_far = acc.len(),
                    "terminator read timed out mid-message, returning partial buffer"
                );
                return Ok(Frame::Message(acc));
            }
        };

        if n == 0 {
            if acc.is_empty() {
                return Ok(Frame::Eof);
            }
            return Ok(Frame::Message(acc));
        }

        acc.extend_from_slice(&buf[..n]);

        if !opts.terminator.is_empty() && acc.ends_with(opts.terminator.as_slice()) {
            if opts.strip_terminator {
                acc.truncate(acc.len() - opts.terminator.len());
            }
            return Ok(Frame::Message(acc));
        }
    }
}
