use std::io::{self, Read, Write};

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use super::Transport;
use crate::config::SerialConfig;
use crate::error::{Result, SerialError};

pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    device: String,
}

impl SerialTransport {
    /// Opens the device as 8N1 without flow control.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = serialport::new(&config.device, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout())
            .open()
            .map_err(|source| SerialError::Port {
                device: config.device.clone(),
                source,
            })?;
        info!(device = %config.device, baud = config.baud_rate, "Serial port opened");
        Ok(Self {
            port,
            device: config.device.clone(),
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }
}

impl Transport for SerialTransport {
    fn flush_input(&mut self) -> Result<()> {
        self.port
            .clear(ClearBuffer::Input)
            .map_err(|source| SerialError::Port {
                device: self.device.clone(),
                source,
            })
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        Write::write_all(&mut self.port, bytes)?;
        Write::flush(&mut self.port)?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match Read::read(&mut self.port, buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                debug!(device = %self.device, "Read timed out");
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }
}
