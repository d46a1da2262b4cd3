//! Request/response extraction over a noisy byte link.
//!
//! Each call is stateless: it flushes stale input, writes the command, reads
//! one bounded chunk and keeps the first candidate frame of the requested
//! kind. Chunks with no data or only frames of the other kind cost one retry;
//! once the retry budget is spent the call returns `Ok(None)`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jsonlink_core::{classify, decode_chunk, scan_frames, FrameKind};
use tracing::{debug, warn};

use crate::config::ExtractorConfig;
use crate::error::{Result, SerialError};
use crate::transport::Transport;

enum Attempt {
    Matched(String),
    NoData,
    NoMatchingFrame { candidates: usize },
}

#[derive(Debug, Clone, Default)]
pub struct FrameExtractor {
    config: ExtractorConfig,
    running: Option<Arc<AtomicBool>>,
}

impl FrameExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            running: None,
        }
    }

    /// Checked before every attempt; once cleared, `extract` returns
    /// [`SerialError::Cancelled`] instead of starting another write/read.
    pub fn with_running_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = Some(running);
        self
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Returns the first frame of kind `want`, as an unmodified slice of the
    /// chunk it was read from. An empty `command` only listens.
    pub fn extract<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        command: &str,
        want: FrameKind,
    ) -> Result<Option<String>> {
        let mut buf = vec![0u8; self.config.max_chunk_bytes.max(1)];

        for attempt in 1..=self.config.max_retries {
            if self.is_cancelled() {
                debug!(attempt, "Extraction cancelled");
                return Err(SerialError::Cancelled);
            }
            match self.attempt(transport, command, want, &mut buf)? {
                Attempt::Matched(frame) => {
                    debug!(attempt, len = frame.len(), ?want, "Frame extracted");
                    return Ok(Some(frame));
                }
                Attempt::NoData => debug!(attempt, "No data in chunk; retrying"),
                Attempt::NoMatchingFrame { candidates } => {
                    debug!(attempt, candidates, ?want, "No frame of requested kind; retrying")
                }
            }
        }

        warn!(
            retries = self.config.max_retries,
            ?want,
            command,
            "No matching frame before retry budget ran out"
        );
        Ok(None)
    }

    /// Listens for one heartbeat frame without sending anything.
    pub fn heartbeat<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<Option<String>> {
        self.extract(transport, "", FrameKind::Heartbeat)
    }

    fn attempt<T: Transport + ?Sized>(
        &self,
        transport: &mut T,
        command: &str,
        want: FrameKind,
        buf: &mut [u8],
    ) -> Result<Attempt> {
        transport.flush_input()?;
        if !command.is_empty() {
            transport.write(command.as_bytes())?;
        }
        let n = transport.read(buf)?;

        let text = decode_chunk(&buf[..n]);
        if text.is_empty() {
            return Ok(Attempt::NoData);
        }

        let candidates = scan_frames(&text, self.config.brace_matching);
        let count = candidates.len();
        let matched = candidates
            .into_iter()
            .find(|frame| classify(frame, &self.config.heartbeat_marker) == want);

        Ok(match matched {
            Some(frame) => Attempt::Matched(frame.to_string()),
            None => Attempt::NoMatchingFrame { candidates: count },
        })
    }

    fn is_cancelled(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.load(Ordering::Relaxed))
    }
}
