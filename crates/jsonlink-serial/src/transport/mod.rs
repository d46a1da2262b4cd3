//! Byte transports the frame extractor drives.
//!
//! The extractor needs only three capabilities: discard queued input, write a
//! command and read one bounded chunk. [`serial::SerialTransport`] is the real
//! UART; [`mock::MockTransport`] replays scripted chunks for tests.

pub mod mock;
pub mod serial;

use crate::error::Result;

pub trait Transport {
    /// Discards any input received but not yet read.
    fn flush_input(&mut self) -> Result<()>;

    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Reads at most `buf.len()` bytes. A read that times out with nothing
    /// received returns `Ok(0)`.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
}
