//! The sender/receiver pair and the device table exchange.

use log::{debug, trace};

use crate::{
    connection::{ConnectionError, Transport},
    encode::Encode,
    packets::{
        devices::{DeviceRecord, GetDevicesPacket, PageResponse},
        pages_for, GET_DEVICES_CMD, READ_CHUNK_SIZE,
    },
};

#[cfg(feature = "usb")]
use crate::connection::usb::{
    UsbEndpointOptions, UsbTransport, RF_RECEIVER_USB_PID, RF_SENDER_USB_PID, RF_USB_VID,
};

/// The devices reported by one [`WirelessTransceiver::list_devices`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Snapshot {
    pub devices: Vec<DeviceRecord>,
    /// The reply buffer the devices were decoded from.
    pub raw: Vec<u8>,
}

/// An open RF sender and receiver.
///
/// Only the receiver takes part in enumeration. The sender is held open for
/// the lifetime of the transceiver and both are closed together.
///
/// Calls take `&mut self`, so at most one exchange is in flight at a time.
#[derive(Debug)]
pub struct WirelessTransceiver<T: Transport> {
    sender: Option<T>,
    receiver: Option<T>,
}

#[cfg(feature = "usb")]
impl WirelessTransceiver<UsbTransport> {
    /// Opens both RF dongles over USB.
    pub fn open(timeout: std::time::Duration) -> Result<Self, ConnectionError> {
        let options = UsbEndpointOptions::with_timeout(timeout);

        let mut sender = UsbTransport::open(RF_USB_VID, RF_SENDER_USB_PID, options)?;
        let receiver = match UsbTransport::open(RF_USB_VID, RF_RECEIVER_USB_PID, options) {
            Ok(receiver) => receiver,
            Err(e) => {
                sender.close();
                return Err(e);
            }
        };

        Ok(Self::new(sender, receiver))
    }
}

impl<T: Transport> WirelessTransceiver<T> {
    pub fn new(sender: T, receiver: T) -> Self {
        Self {
            sender: Some(sender),
            receiver: Some(receiver),
        }
    }

    pub fn sender(&self) -> Option<&T> {
        self.sender.as_ref()
    }

    pub fn receiver(&self) -> Option<&T> {
        self.receiver.as_ref()
    }

    /// Requests `page_count` pages of the device table and accumulates the reply.
    ///
    /// Reads stop once the expected length is reached, on an empty read, or on
    /// a read shorter than the requested chunk, which the hub uses to mark the
    /// end of a reply. Anything past the expected length is discarded.
    pub fn fetch_page(&mut self, page_count: usize) -> Result<PageResponse, ConnectionError> {
        let receiver = self.receiver.as_mut().ok_or(ConnectionError::NotConnected)?;

        let packet = GetDevicesPacket::new(page_count);
        let frame = packet.to_frame();
        trace!("Sending device table request: {:x?}", frame);
        receiver.write(&frame)?;

        let expected_len = packet.reply_len();
        let mut data = Vec::with_capacity(expected_len);

        while data.len() < expected_len {
            let chunk = receiver.read(READ_CHUNK_SIZE)?;
            if chunk.is_empty() {
                break;
            }
            data.extend_from_slice(&chunk);
            if chunk.len() < READ_CHUNK_SIZE {
                break;
            }
        }

        if data.is_empty() {
            return Err(ConnectionError::NoData);
        }
        if data.len() > expected_len {
            trace!("Discarding {} bytes past the reply", data.len() - expected_len);
            data.truncate(expected_len);
        }
        if data[0] != GET_DEVICES_CMD {
            return Err(ConnectionError::UnexpectedHeader(data[0]));
        }

        // A lone header byte carries no count.
        let device_count = data.get(1).copied().unwrap_or_default();
        debug!(
            "Received {} of {expected_len} bytes for {page_count} page(s), {device_count} device(s) reported",
            data.len(),
        );

        Ok(PageResponse { device_count, data })
    }

    /// Lists every device the hub reports.
    ///
    /// A one-page probe reveals the device count. If that many devices do not
    /// fit into one page, the table is fetched again with enough pages and only
    /// the second reply is used.
    pub fn list_devices(&mut self) -> Result<Snapshot, ConnectionError> {
        let probe = self.fetch_page(1)?;
        let pages = pages_for(probe.device_count as usize);

        let response = if pages == 1 {
            probe
        } else {
            debug!(
                "{} devices reported, refetching {pages} pages",
                probe.device_count
            );
            self.fetch_page(pages)?
        };

        Ok(Snapshot {
            devices: response.records(),
            raw: response.data,
        })
    }

    /// Closes both channels. Later calls fail with [`ConnectionError::NotConnected`].
    pub fn close(&mut self) {
        if let Some(mut sender) = self.sender.take() {
            sender.close();
        }
        if let Some(mut receiver) = self.receiver.take() {
            receiver.close();
        }
    }
}

impl<T: Transport> Drop for WirelessTransceiver<T> {
    fn drop(&mut self) {
        self.close();
    }
}
