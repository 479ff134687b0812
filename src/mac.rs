//! Hardware addresses of RF devices.

use std::fmt;

use crate::decode::{Decode, DecodeError};

/// A 6-byte hardware address as reported by the hub.
///
/// Displayed as lowercase colon-separated hex octets, e.g. `aa:bb:cc:00:11:22`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// The all-zero address, used by the hub to mean "no address".
    pub const UNSET: Self = Self([0; 6]);

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Returns `true` if every octet is zero.
    pub fn is_unset(&self) -> bool {
        *self == Self::UNSET
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl Decode for MacAddress {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        Ok(Self(<[u8; 6]>::decode(data)?))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for MacAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::MacAddress;
    use crate::decode::Decode;

    #[test]
    fn display() {
        let mac = MacAddress([0xAA, 0xBB, 0xCC, 0x00, 0x11, 0x22]);
        assert_eq!(mac.to_string(), "aa:bb:cc:00:11:22");
        assert_eq!(MacAddress::UNSET.to_string(), "00:00:00:00:00:00");
    }

    #[test]
    fn unset() {
        assert!(MacAddress::UNSET.is_unset());
        assert!(!MacAddress([0, 0, 0, 0, 0, 1]).is_unset());
        assert!(!MacAddress([0x80, 0, 0, 0, 0, 0]).is_unset());
    }

    #[test]
    fn decode_consumes_six_bytes() {
        let mut data: &[u8] = &[1, 2, 3, 4, 5, 6, 7];
        let mac = MacAddress::decode(&mut data).unwrap();
        assert_eq!(mac.octets(), [1, 2, 3, 4, 5, 6]);
        assert_eq!(data, &[7]);
    }
}
