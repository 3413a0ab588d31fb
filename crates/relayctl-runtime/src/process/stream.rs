//! Async pipe readers (non-UTF8-safe).
//!
//! Transcoders can emit non-UTF8 bytes on stdout/stderr (file names, codec
//! metadata), so frames are decoded lossily. ffmpeg rewrites its progress
//! line in place with bare `\r`, so `\r`, `\n` and `\r\n` all end a line.

use std::io;
use std::sync::Arc;

use futures_util::StreamExt;
use relayctl_core::{OutputHandler, OutputStream};
use tokio::io::AsyncRead;
use tokio::task::JoinHandle;
use tokio_util::bytes::BytesMut;
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder, FramedRead};
use tracing::debug;

/// Longest line delivered; longer lines are dropped up to the next line end.
pub const MAX_LINE_BYTES: usize = 16 * 1024;

/// Splits captured output on any of `\r` / `\n`, skipping the empty frames
/// produced by `\r\n` and blank lines.
#[derive(Debug)]
struct OutputLineCodec {
    inner: AnyDelimiterCodec,
    dropped: u64,
}

impl OutputLineCodec {
    fn new(max_length: usize) -> Self {
        Self {
            inner: AnyDelimiterCodec::new_with_max_length(b"\r\n".to_vec(), Vec::new(), max_length),
            dropped: 0,
        }
    }

    fn next_line(
        &mut self,
        src: &mut BytesMut,
        at_eof: bool,
    ) -> Result<Option<String>, io::Error> {
        loop {
            let frame = if at_eof {
                self.inner.decode_eof(src)
            } else {
                self.inner.decode(src)
            };
            match frame {
                Ok(Some(frame)) if frame.is_empty() => {}
                Ok(Some(frame)) => return Ok(Some(String::from_utf8_lossy(&frame).into_owned())),
                Ok(None) => return Ok(None),
                // The codec now discards up to the next delimiter
                Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => self.dropped += 1,
                Err(AnyDelimiterCodecError::Io(e)) => return Err(e),
            }
        }
    }
}

impl Decoder for OutputLineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        self.next_line(src, false)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        self.next_line(src, true)
    }
}

pub fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    label: String,
    stream_type: OutputStream,
    handler: Arc<dyn OutputHandler>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = FramedRead::new(stream, OutputLineCodec::new(MAX_LINE_BYTES));

        while let Some(line) = lines.next().await {
            match line {
                Ok(line) => handler.on_line(stream_type, line),
                Err(e) => {
                    debug!(process = %label, %stream_type, error = %e, "pipe reader exiting due to read error");
                    break;
                }
            }
        }

        let dropped = lines.decoder().dropped;
        if dropped > 0 {
            debug!(process = %label, %stream_type, dropped, "Dropped overlong output lines");
        }
        debug!(process = %label, %stream_type, "pipe reader task exiting");
    })
}
