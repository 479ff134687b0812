//! Byte channels to the RF dongles.

use thiserror::Error;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
#[cfg(feature = "usb")]
pub mod usb;

/// A blocking, bounded duplex byte channel.
pub trait Transport {
    /// Writes `data`, returning the number of bytes accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize, ConnectionError>;

    /// Reads at most `max_len` bytes.
    ///
    /// A read may return fewer bytes than requested. Blocks until the
    /// configured timeout and fails with [`ConnectionError::Timeout`] if nothing arrives.
    fn read(&mut self, max_len: usize) -> Result<Vec<u8>, ConnectionError>;

    /// Releases the underlying resources. Calling this more than once has no further effect.
    fn close(&mut self);
}

#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "usb")]
    #[error("USB transfer failed: {0}")]
    TransferError(#[from] nusb::transfer::TransferError),

    #[error("Packet timeout")]
    Timeout,

    #[error("Device {vendor_id:04x}:{product_id:04x} not found")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    #[error("Endpoint {0:#04x} not found on the claimed interface")]
    EndpointNotFound(u8),

    #[error("Not connected to the device")]
    NotConnected,

    #[error("RF receiver returned no data")]
    NoData,

    #[error("Unexpected RF header {0:#04x}")]
    UnexpectedHeader(u8),
}
