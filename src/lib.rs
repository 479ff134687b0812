//! Crate for enumerating wireless fan and RGB controllers bound to an RF hub.
//!
//! The hub is reached through a pair of USB dongles. The receiver dongle answers
//! a paged device table query ([`GetDevicesPacket`](packets::devices::GetDevicesPacket)),
//! and each populated 42-byte slot of the reply is decoded into a
//! [`DeviceRecord`](packets::devices::DeviceRecord).
//!
//! Wire types implement [`Encode`](encode::Encode) or [`Decode`](decode::Decode).
//! The exchange itself runs over any [`Transport`](connection::Transport), so it
//! can be driven by real hardware or by the in-memory
//! `MockTransport` (feature `mock`).
//!
//! ```no_run
//! # #[cfg(feature = "usb")]
//! # fn main() -> Result<(), unilink_rf::connection::ConnectionError> {
//! use std::time::Duration;
//! use unilink_rf::transceiver::WirelessTransceiver;
//!
//! let mut transceiver = WirelessTransceiver::open(Duration::from_secs(1))?;
//! for device in transceiver.list_devices()?.devices {
//!     println!("{} bound={}", device.mac, device.is_bound());
//! }
//! transceiver.close();
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "usb"))]
//! # fn main() {}
//! ```

pub mod connection;
pub mod decode;
pub mod encode;
pub mod mac;
pub mod packets;
pub mod transceiver;
