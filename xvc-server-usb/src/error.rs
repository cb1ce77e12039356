//! Module for error handling code.
use std::io;

use thiserror::Error;
use xvc_bitbang::engine::EngineError;
use xvc_bitbang::packet::FrameError;
use xvc_bitbang::vector::CapacityExceeded;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("No USB device with ID {vid:04x}:{pid:04x} was found! Check connection?")]
    DeviceNotFound { vid: u16, pid: u16 },

    #[error("USB transfer timed out while trying to {operation}")]
    Timeout {
        /// The USB operation that failed (e.g. `"read a bulk packet"`).
        operation: &'static str,
    },

    #[error("USB error while trying to {operation}")]
    Usb {
        #[source]
        source: rusb::Error,
        operation: &'static str,
    },

    #[error("Short bulk write: {written} of {expected} bytes sent")]
    ShortWrite { written: usize, expected: usize },

    #[error("{vector} vector has {got} bytes, expected {expected}")]
    VectorLength {
        vector: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Shift does not fit into the device buffers")]
    Capacity(#[from] CapacityExceeded),

    #[error("Device returned a malformed TDO vector")]
    Frame(#[from] FrameError),

    #[error("Device rejected the shift")]
    Device(#[from] EngineError),
}

impl BridgeError {
    /// Returns a mapper from libusb errors that reports timeouts separately.
    pub fn usb(operation: &'static str) -> impl FnOnce(rusb::Error) -> BridgeError {
        move |source| match source {
            rusb::Error::Timeout => BridgeError::Timeout { operation },
            source => BridgeError::Usb { source, operation },
        }
    }
}

impl From<BridgeError> for io::Error {
    fn from(value: BridgeError) -> Self {
        let kind = match value {
            BridgeError::Timeout { .. } => io::ErrorKind::TimedOut,
            BridgeError::DeviceNotFound { .. } => io::ErrorKind::NotFound,
            BridgeError::VectorLength { .. } | BridgeError::Capacity(_) => {
                io::ErrorKind::InvalidInput
            }
            BridgeError::Frame(_) | BridgeError::Device(_) => io::ErrorKind::InvalidData,
            BridgeError::Usb { .. } | BridgeError::ShortWrite { .. } => io::ErrorKind::Other,
        };
        io::Error::new(kind, value)
    }
}
