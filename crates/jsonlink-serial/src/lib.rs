pub mod config;
pub mod error;
pub mod extractor;
pub mod transport;

pub use config::{ExtractorConfig, SerialConfig};
pub use error::{Result, SerialError};
pub use extractor::FrameExtractor;
pub use transport::{mock::{MockTransport, Op}, serial::SerialTransport, Transport};
