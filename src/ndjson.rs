//! Newline-delimited JSON stream processing.
//!
//! Ollama streams chat responses as one JSON object per line:
//! ```text
//! {"message":{"role":"assistant","content":"Hel"},"done":false}
//! {"message":{"role":"assistant","content":"lo"},"done":false}
//! {"done":true,"done_reason":"stop","eval_count":2}
//! ```

use bytes::{Buf, Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};

use crate::client::ClientError;

/// Extension trait for `reqwest::Response` to read NDJSON bodies line by line.
pub trait NdjsonResponseExt {
    /// Convert the response into a stream of raw, non-empty JSON lines.
    ///
    /// A final line without a trailing newline is still yielded.
    fn ndjson_lines(self) -> impl Stream<Item = Result<String, ClientError>> + Send;
}

impl NdjsonResponseExt for reqwest::Response {
    fn ndjson_lines(self) -> impl Stream<Item = Result<String, ClientError>> + Send {
        ndjson_lines(self.bytes_stream())
    }
}

/// Split a byte stream into raw, non-empty JSON lines.
///
/// A transport error ends the stream: the error is yielded once and any
/// partially received line is discarded.
pub fn ndjson_lines<S, E>(byte_stream: S) -> impl Stream<Item = Result<String, ClientError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send,
    E: Into<ClientError> + Send,
{
    stream::unfold(
        (Box::pin(byte_stream), BytesMut::new(), false),
        |(mut byte_stream, mut buffer, mut stream_ended)| async move {
            loop {
                if let Some(line) = take_line(&mut buffer) {
                    return Some((Ok(line), (byte_stream, buffer, stream_ended)));
                }

                if stream_ended {
                    let rest = String::from_utf8_lossy(&buffer).trim().to_string();
                    buffer.clear();
                    if rest.is_empty() {
                        return None;
                    }
                    return Some((Ok(rest), (byte_stream, buffer, stream_ended)));
                }

                match byte_stream.next().await {
                    Some(Ok(chunk)) => buffer.extend_from_slice(&chunk),
                    Some(Err(e)) => {
                        // Includes the request timeout firing mid-stream
                        buffer.clear();
                        return Some((Err(e.into()), (byte_stream, buffer, true)));
                    }
                    None => stream_ended = true,
                }
            }
        },
    )
}

/// Pop the next complete, non-empty line from the buffer.
///
/// Lines are split on raw bytes so multi-byte characters spanning two
/// network chunks are decoded only once the whole line has arrived.
pub fn take_line(buffer: &mut BytesMut) -> Option<String> {
    while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
        let line = buffer.split_to(pos);
        buffer.advance(1);

        let line = String::from_utf8_lossy(&line).trim().to_string();
        if !line.is_empty() {
            return Some(line);
        }
    }
    None
}
