//! Eval wire codec
//!
//! Messages are HTTP-style framed JSON:
//! ```text
//! Content-Length: <byte-length>\r\n
//! \r\n
//! <JSON body>
//! ```

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::common::Error;

/// Read one framed message from the stream
///
/// Parses the Content-Length header and reads the JSON body
pub async fn read_message<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<String, Error> {
    // Read headers line by line until we get an empty line
    let mut content_length: Option<usize> = None;

    loop {
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line).await.map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                Error::ChannelClosed
            } else {
                Error::Io(e)
            }
        })?;

        if bytes_read == 0 {
            return Err(Error::ChannelClosed);
        }

        // Empty line (just \r\n) signals end of headers
        if line == "\r\n" || line == "\n" {
            break;
        }

        let line = line.trim();
        if let Some(value) = line.strip_prefix("Content-Length:") {
            content_length = Some(value.trim().parse().map_err(|_| {
                Error::Protocol(format!("Invalid Content-Length: {}", value.trim()))
            })?);
        }
        // Ignore other headers (like Content-Type)
    }

    let len = content_length
        .ok_or_else(|| Error::Protocol("Missing Content-Length header".to_string()))?;

    // Sanity check - 32MB covers any pretty-printed result
    if len > 32 * 1024 * 1024 {
        return Err(Error::Protocol(format!(
            "Content-Length too large: {} bytes",
            len
        )));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::ChannelClosed
        } else {
            Error::Io(e)
        }
    })?;

    String::from_utf8(body).map_err(|e| Error::Protocol(format!("Invalid UTF-8: {}", e)))
}

/// Write one framed message to the stream
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    json: &str,
) -> Result<(), Error> {
    let header = format!("Content-Length: {}\r\n\r\n", json.len());

    writer.write_all(header.as_bytes()).await?;
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;

    Ok(())
}
