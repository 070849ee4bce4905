//! Newline-delimited framing of a unit's stdout.
//!
//! The synthesized prelude owns the unit's stdout and writes one frame per
//! line: `msg:<json string>` for a posted message and `out:<json string>` for
//! console output produced by user code. [`FrameReader`] decodes them.

use anyhow::{Context, Result};
use offload_types::frame::{MESSAGE_PREFIX, OUTPUT_PREFIX};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

/// Maximum frame size (64 MiB) to prevent unbounded memory allocation.
const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// One decoded stdout frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A message posted by the harness.
    Message(String),
    /// Console output. Lines written around the prelude (e.g. straight to
    /// file descriptor 1) surface here verbatim.
    Output(String),
}

impl Frame {
    /// Encode as the prelude does, including the trailing newline.
    #[must_use]
    pub fn encode(&self) -> String {
        let (prefix, text) = match self {
            Self::Message(text) => (MESSAGE_PREFIX, text),
            Self::Output(text) => (OUTPUT_PREFIX, text),
        };
        format!("{prefix}{}\n", serde_json::Value::from(text.as_str()))
    }
}

/// A stdout line longer than the frame limit. The unit's result can't be
/// delivered once this happens.
#[derive(Debug, Error)]
#[error("unit stdout frame exceeds maximum {limit} bytes")]
pub struct FrameTooLarge {
    pub limit: usize,
}

/// Reads frames from an async reader.
pub struct FrameReader<R> {
    reader: BufReader<R>,
    line: Vec<u8>,
    limit: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line: Vec::new(),
            limit: MAX_FRAME_BYTES,
        }
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` on EOF.
    /// Returns `Err` on read failures and on oversized lines ([`FrameTooLarge`]).
    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        self.line.clear();
        let bytes_read = (&mut self.reader)
            .take(self.limit as u64 + 1)
            .read_until(b'\n', &mut self.line)
            .await
            .context("reading unit stdout")?;

        if bytes_read == 0 {
            return Ok(None);
        }
        if self.line.len() > self.limit {
            return Err(FrameTooLarge { limit: self.limit }.into());
        }

        let line = String::from_utf8_lossy(&self.line);
        let line = line.trim_end_matches(['\n', '\r']);
        Ok(Some(decode_line(line)))
    }
}

/// Lines that don't decode as a frame, including a `msg:` prefix written
/// straight to file descriptor 1, are passed through as output.
fn decode_line(line: &str) -> Frame {
    if let Some(payload) = line.strip_prefix(MESSAGE_PREFIX)
        && let Ok(text) = serde_json::from_str(payload)
    {
        return Frame::Message(text);
    }
    if let Some(payload) = line.strip_prefix(OUTPUT_PREFIX)
        && let Ok(text) = serde_json::from_str(payload)
    {
        return Frame::Output(text);
    }
    Frame::Output(format!("{line}\n"))
}
