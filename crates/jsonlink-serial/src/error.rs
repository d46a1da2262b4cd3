use thiserror::Error;

#[derive(Debug, Error)]
pub enum SerialError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serial port {device}: {source}")]
    Port {
        device: String,
        #[source]
        source: serialport::Error,
    },

    #[error("extraction cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SerialError>;
