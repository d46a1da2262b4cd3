//! Scripted transport for exercising the extractor without hardware.

use std::collections::VecDeque;
use std::io;

use super::Transport;
use crate::error::Result;

#[derive(Debug, Clone)]
enum Step {
    Chunk(Vec<u8>),
    Fail(io::ErrorKind),
}

/// Transport calls in the order they were made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Flush,
    Write,
    Read,
}

/// Replays one scripted step per `read` call.
///
/// Bytes of a chunk that do not fit the caller's buffer stay pending, like
/// unread UART input, until the next read or `flush_input`. Once the script
/// runs out, reads return the repeat chunk if one was set, else nothing.
#[derive(Debug, Default)]
pub struct MockTransport {
    script: VecDeque<Step>,
    repeat: Option<Vec<u8>>,
    pending: Vec<u8>,
    writes: Vec<Vec<u8>>,
    ops: Vec<Op>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every read returns `chunk`.
    pub fn repeating(chunk: impl Into<Vec<u8>>) -> Self {
        Self {
            repeat: Some(chunk.into()),
            ..Self::default()
        }
    }

    pub fn with_chunk(mut self, chunk: impl Into<Vec<u8>>) -> Self {
        self.script.push_back(Step::Chunk(chunk.into()));
        self
    }

    pub fn with_read_error(mut self, kind: io::ErrorKind) -> Self {
        self.script.push_back(Step::Fail(kind));
        self
    }

    pub fn flushes(&self) -> usize {
        self.count(Op::Flush)
    }

    pub fn reads(&self) -> usize {
        self.count(Op::Read)
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    fn count(&self, op: Op) -> usize {
        self.ops.iter().filter(|o| **o == op).count()
    }

    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }
}

impl Transport for MockTransport {
    fn flush_input(&mut self) -> Result<()> {
        self.ops.push(Op::Flush);
        self.pending.clear();
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.ops.push(Op::Write);
        self.writes.push(bytes.to_vec());
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.ops.push(Op::Read);
        if self.pending.is_empty() {
            match self.script.pop_front() {
                Some(Step::Chunk(chunk)) => self.pending = chunk,
                Some(Step::Fail(kind)) => {
                    return Err(io::Error::new(kind, "scripted read failure").into())
                }
                None => self.pending = self.repeat.clone().unwrap_or_default(),
            }
        }
        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending = self.pending.split_off(n);
        Ok(n)
    }
}
