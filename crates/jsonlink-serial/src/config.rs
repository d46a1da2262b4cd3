use std::env;
use std::time::Duration;

use jsonlink_core::{BraceMatching, HEARTBEAT_MARKER};

#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub device: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    pub max_retries: u32,
    pub max_chunk_bytes: usize,
    pub brace_matching: BraceMatching,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyAMA0".to_string(),
            baud_rate: 115_200,
            read_timeout_ms: 500,
            max_retries: 3,
            max_chunk_bytes: 1024,
            brace_matching: BraceMatching::FirstClose,
        }
    }
}

impl SerialConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Unset, empty or unparsable values keep the default.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = SerialConfig::default();

        if let Some(v) = lookup("JSONLINK_DEVICE") {
            if !v.is_empty() {
                cfg.device = v;
            }
        }
        if let Some(v) = lookup("JSONLINK_BAUD_RATE") {
            if let Ok(b) = v.parse::<u32>() {
                cfg.baud_rate = b;
            }
        }
        if let Some(v) = lookup("JSONLINK_READ_TIMEOUT_MS") {
            if let Ok(ms) = v.parse::<u64>() {
                cfg.read_timeout_ms = ms;
            }
        }
        if let Some(v) = lookup("JSONLINK_MAX_RETRIES") {
            if let Ok(r) = v.parse::<u32>() {
                cfg.max_retries = r;
            }
        }
        if let Some(v) = lookup("JSONLINK_MAX_CHUNK_BYTES") {
            if let Ok(n) = v.parse::<usize>() {
                cfg.max_chunk_bytes = n;
            }
        }
        if let Some(v) = lookup("JSONLINK_BRACE_MATCHING") {
            if let Ok(m) = v.parse::<BraceMatching>() {
                cfg.brace_matching = m;
            }
        }

        cfg
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            max_retries: self.max_retries,
            max_chunk_bytes: self.max_chunk_bytes,
            brace_matching: self.brace_matching,
            ..ExtractorConfig::default()
        }
    }
}

/// Knobs of a single extraction call. Worst-case latency of one call is
/// `max_retries` times the transport's read timeout.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub max_retries: u32,
    pub max_chunk_bytes: usize,
    pub brace_matching: BraceMatching,
    pub heartbeat_marker: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            max_chunk_bytes: 1024,
            brace_matching: BraceMatching::FirstClose,
            heartbeat_marker: HEARTBEAT_MARKER.to_string(),
        }
    }
}
