pub mod commands;
pub mod frames;

pub use commands::{DeviceQuery, Request};
pub use frames::{
    classify, decode_chunk, parse_payload, scan_frames, BraceMatching, FrameError, FrameKind,
    HEARTBEAT_MARKER,
};
