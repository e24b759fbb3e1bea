//! Line-delimited JSON-RPC loop shared by every transport.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use super::TransportResult;
use crate::core::protocol::JsonRpcResponse;
use crate::core::server::Session;

/// Longest accepted message, newline excluded.
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// Serve one session until the reader reaches end of input.
///
/// Requests are answered strictly in arrival order; each response is
/// written as one line and flushed before the next request is read.
pub async fn serve_lines<R, W>(session: Session, reader: R, writer: W) -> TransportResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    serve_lines_with_limit(session, reader, writer, MAX_LINE_BYTES).await
}

/// [`serve_lines`] with a custom line length limit.
///
/// A longer line is discarded up to its newline and answered with a parse
/// error; the session keeps going.
pub async fn serve_lines_with_limit<R, W>(
    mut session: Session,
    mut reader: R,
    mut writer: W,
    max_line: usize,
) -> TransportResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let limit = max_line.saturating_add(1) as u64;
        if (&mut reader).take(limit).read_until(b'\n', &mut buf).await? == 0 {
            debug!("Input closed");
            return Ok(());
        }

        let response = if buf.len() > max_line && buf.last() != Some(&b'\n') {
            discard_line(&mut reader).await?;
            warn!("Discarding message longer than {} bytes", max_line);
            Some(JsonRpcResponse::parse_error("Parse error: line too long"))
        } else {
            match std::str::from_utf8(&buf) {
                Ok(line) => session.handle_line(line),
                Err(e) => {
                    warn!("Discarding non UTF-8 input: {}", e);
                    Some(JsonRpcResponse::parse_error("Parse error: invalid UTF-8"))
                }
            }
        };

        if let Some(response) = response {
            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }
    }
}

/// Skip the rest of the current line without buffering it.
async fn discard_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<()> {
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|b| *b == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                return Ok(());
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
}
