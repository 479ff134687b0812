//! Implements discovering and opening the RF dongles over USB bulk endpoints.

use std::time::Duration;

use log::{debug, trace, warn};
use nusb::transfer::RequestBuffer;
use tokio::runtime::Runtime;

use super::{ConnectionError, Transport};

/// The USB vendor ID of the RF dongles
pub const RF_USB_VID: u16 = 0x0416;

/// The USB PID of the RF sender dongle
pub const RF_SENDER_USB_PID: u16 = 0x8040;

/// The USB PID of the RF receiver dongle
pub const RF_RECEIVER_USB_PID: u16 = 0x8041;

/// Timeout used when [`UsbEndpointOptions::timeout`] is zero.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Which half of the RF pair a dongle is.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RfRole {
    Sender,
    Receiver,
}

impl RfRole {
    pub const fn product_id(&self) -> u16 {
        match self {
            RfRole::Sender => RF_SENDER_USB_PID,
            RfRole::Receiver => RF_RECEIVER_USB_PID,
        }
    }

    fn from_product_id(pid: u16) -> Option<Self> {
        match pid {
            RF_SENDER_USB_PID => Some(RfRole::Sender),
            RF_RECEIVER_USB_PID => Some(RfRole::Receiver),
            _ => None,
        }
    }
}

/// An RF dongle found on the USB bus.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RfDevice {
    pub role: RfRole,
    pub vendor_id: u16,
    pub product_id: u16,
    pub bus_number: u8,
    pub device_address: u8,
    pub product: Option<String>,
}

/// Finds all attached RF dongles.
pub fn find_devices() -> Result<Vec<RfDevice>, ConnectionError> {
    let devices: Vec<RfDevice> = nusb::list_devices()?
        .filter(|info| info.vendor_id() == RF_USB_VID)
        .filter_map(|info| {
            let role = RfRole::from_product_id(info.product_id())?;
            Some(RfDevice {
                role,
                vendor_id: info.vendor_id(),
                product_id: role.product_id(),
                bus_number: info.bus_number(),
                device_address: info.device_address(),
                product: info.product_string().map(str::to_string),
            })
        })
        .collect();

    for role in [RfRole::Sender, RfRole::Receiver] {
        let count = devices.iter().filter(|d| d.role == role).count();
        if count > 1 {
            warn!("Found {count} RF {role:?} dongles, only the first one will be used");
        }
    }

    Ok(devices)
}

/// Where to find the bulk endpoints on a dongle.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct UsbEndpointOptions {
    pub interface: u8,
    pub write_endpoint: u8,
    pub read_endpoint: u8,
    /// Bound on every transfer. Zero selects [`DEFAULT_TIMEOUT`].
    pub timeout: Duration,
}

impl Default for UsbEndpointOptions {
    fn default() -> Self {
        Self {
            interface: 0,
            write_endpoint: 0x01,
            read_endpoint: 0x81,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl UsbEndpointOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }
}

/// A claimed USB interface with one bulk OUT and one bulk IN endpoint.
pub struct UsbTransport {
    interface: Option<nusb::Interface>,
    options: UsbEndpointOptions,
    runtime: Runtime,
}

impl std::fmt::Debug for UsbTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsbTransport")
            .field("open", &self.interface.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl UsbTransport {
    /// Opens the first device matching `vendor_id:product_id` and claims its interface.
    pub fn open(
        vendor_id: u16,
        product_id: u16,
        mut options: UsbEndpointOptions,
    ) -> Result<Self, ConnectionError> {
        if options.timeout.is_zero() {
            options.timeout = DEFAULT_TIMEOUT;
        }

        let info = nusb::list_devices()?
            .find(|info| info.vendor_id() == vendor_id && info.product_id() == product_id)
            .ok_or(ConnectionError::DeviceNotFound {
                vendor_id,
                product_id,
            })?;

        debug!(
            "Opening {vendor_id:04x}:{product_id:04x} at bus {} address {}",
            info.bus_number(),
            info.device_address()
        );

        let device = info.open()?;
        let interface = device.claim_interface(options.interface)?;

        let has_endpoint = |address: u8| {
            interface
                .descriptors()
                .any(|alt| alt.endpoints().any(|ep| ep.address() == address))
        };
        for address in [options.write_endpoint, options.read_endpoint] {
            if !has_endpoint(address) {
                return Err(ConnectionError::EndpointNotFound(address));
            }
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        Ok(Self {
            interface: Some(interface),
            options,
            runtime,
        })
    }

    pub fn options(&self) -> &UsbEndpointOptions {
        &self.options
    }
}

impl Transport for UsbTransport {
    fn write(&mut self, data: &[u8]) -> Result<usize, ConnectionError> {
        let interface = self.interface.as_ref().ok_or(ConnectionError::NotConnected)?;
        trace!("USB write: {:x?}", data);

        let transfer = interface.bulk_out(self.options.write_endpoint, data.to_vec());
        let completion = self
            .runtime
            .block_on(async { tokio::time::timeout(self.options.timeout, transfer).await })
            .map_err(|_| ConnectionError::Timeout)?;

        Ok(completion.into_result()?.actual_length())
    }

    fn read(&mut self, max_len: usize) -> Result<Vec<u8>, ConnectionError> {
        let interface = self.interface.as_ref().ok_or(ConnectionError::NotConnected)?;

        let transfer = interface.bulk_in(self.options.read_endpoint, RequestBuffer::new(max_len));
        let completion = self
            .runtime
            .block_on(async { tokio::time::timeout(self.options.timeout, transfer).await })
            .map_err(|_| ConnectionError::Timeout)?;

        let data = completion.into_result()?;
        trace!("USB read {} bytes: {:x?}", data.len(), data);
        Ok(data)
    }

    fn close(&mut self) {
        if self.interface.take().is_some() {
            debug!("Released USB interface {}", self.options.interface);
        }
    }
}
