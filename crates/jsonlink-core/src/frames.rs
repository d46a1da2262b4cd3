//! Locating and classifying JSON frames inside raw serial chunks.
//!
//! The controller writes JSON objects back to back with no delimiter, and
//! interleaves unsolicited heartbeat objects with replies. A chunk is decoded
//! byte-for-char and scanned for brace-delimited candidates; candidates are not
//! validated as JSON until [`parse_payload`] is called on the one that is kept.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Literal prefix of the periodic status frames the controller emits on its own.
pub const HEARTBEAT_MARKER: &str = "{\"pa\":";

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("malformed frame {frame:?}: {source}")]
    Malformed {
        frame: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown brace matching mode: {0}")]
    UnknownBraceMatching(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Heartbeat,
    Response,
}

impl FrameKind {
    pub fn from_heartbeat_flag(want_heartbeat: bool) -> Self {
        if want_heartbeat {
            FrameKind::Heartbeat
        } else {
            FrameKind::Response
        }
    }
}

/// Classification is plain substring containment of `marker`, never a
/// structural inspection of the object.
pub fn classify(frame: &str, marker: &str) -> FrameKind {
    FrameKind::from_heartbeat_flag(frame.contains(marker))
}

/// How a `{` is paired with its closing `}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BraceMatching {
    /// First `{` is paired with the first `}` after it. Nested objects are
    /// cut at the inner closing brace: `{"a":{"b":1}}` yields `{"a":{"b":1}`.
    #[default]
    FirstClose,
    /// Depth counting that skips braces inside string literals. An opening
    /// brace that never closes is skipped and the scan resumes after it.
    Balanced,
}

impl BraceMatching {
    // Byte length of the frame starting at `candidate[0] == '{'`.
    fn frame_len(self, candidate: &str) -> Option<usize> {
        match self {
            BraceMatching::FirstClose => candidate.find('}').map(|end| end + 1),
            BraceMatching::Balanced => balanced_len(candidate),
        }
    }
}

impl FromStr for BraceMatching {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first-close" | "naive" => Ok(BraceMatching::FirstClose),
            "balanced" | "depth" => Ok(BraceMatching::Balanced),
            other => Err(FrameError::UnknownBraceMatching(other.to_string())),
        }
    }
}

impl fmt::Display for BraceMatching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BraceMatching::FirstClose => f.write_str("first-close"),
            BraceMatching::Balanced => f.write_str("balanced"),
        }
    }
}

fn balanced_len(candidate: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, b) in candidate.bytes().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Decodes a chunk as a single-byte encoding: every byte maps to the char with
/// the same code point, so nothing is ever rejected.
pub fn decode_chunk(bytes: &[u8]) -> String {
    bytes.iter().map(|b| *b as char).collect()
}

/// Peels candidate frames off `text` left to right.
///
/// Every returned frame is a contiguous slice of `text`. Scanning stops when no
/// further `{`, or no `}` after it, remains.
pub fn scan_frames(text: &str, matching: BraceMatching) -> Vec<&str> {
    let mut frames = Vec::new();
    let mut offset = 0;
    while let Some(found) = text[offset..].find('{') {
        let start = offset + found;
        match matching.frame_len(&text[start..]) {
            Some(len) => {
                frames.push(&text[start..start + len]);
                offset = start + len;
            }
            None if matching == BraceMatching::Balanced => offset = start + 1,
            None => break,
        }
    }
    frames
}

pub fn parse_payload(frame: &str) -> Result<serde_json::Value, FrameError> {
    serde_json::from_str(frame).map_err(|source| FrameError::Malformed {
        frame: frame.to_string(),
        source,
    })
}
