//! Frame codec for the stdio wire protocol.
//!
//! Frame format: one UTF-8 JSON document per line.
//! ```text
//! {"jsonrpc":"2.0","id":1,"method":"tools/list"}\n
//! ```
//! Lines longer than `max_frame_bytes` are drained and reported as
//! [`Frame::Oversized`] so the caller can answer and keep going.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// One inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Line content without the trailing `\n`/`\r\n`.
    Message(Vec<u8>),
    /// Line exceeded the limit; carries the number of bytes discarded.
    Oversized(usize),
}

/// Read one frame from the stream.
///
/// Returns `None` on clean EOF. A final line without a newline is still
/// returned as a frame. The limit applies to the payload, excluding the
/// `\n` or `\r\n` terminator.
pub async fn read_frame<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    max_frame_bytes: usize,
) -> std::io::Result<Option<Frame>> {
    // Room for the payload plus a `\r\n` terminator.
    let buffer_limit = max_frame_bytes.saturating_add(2);
    let mut line = Vec::new();
    let mut consumed = 0usize;
    let mut overflow = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            if consumed == 0 {
                return Ok(None);
            }
            break;
        }

        let (chunk_len, complete) = match available.iter().position(|b| *b == b'\n') {
            Some(idx) => (idx + 1, true),
            None => (available.len(), false),
        };

        consumed += chunk_len;
        if overflow || line.len() + chunk_len > buffer_limit {
            overflow = true;
            line.clear();
        } else {
            line.extend_from_slice(&available[..chunk_len]);
        }
        reader.consume(chunk_len);

        if complete {
            break;
        }
    }

    if overflow {
        return Ok(Some(Frame::Oversized(consumed)));
    }

    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
    if line.len() > max_frame_bytes {
        return Ok(Some(Frame::Oversized(consumed)));
    }
    Ok(Some(Frame::Message(line)))
}

/// Write one JSON value as a line and flush.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    value: &serde_json::Value,
) -> std::io::Result<()> {
    let mut payload = serde_json::to_vec(value)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    payload.push(b'\n');
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}
