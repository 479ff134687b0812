//! The device table query and the records it returns.

use log::{debug, warn};

use super::{
    COMMAND_FRAME_SIZE, GET_DEVICES_CMD, PAGE_HEADER_SIZE, PAGE_STRIDE, SLOT_SIZE, SLOT_TRAILER,
};
use crate::{
    decode::{Decode, DecodeError, DecodeErrorKind},
    encode::Encode,
    mac::MacAddress,
};

/// Requests `page_count` pages of the hub's device table.
///
/// # Encoding
///
/// | Field        | Size | Description |
/// |--------------|------|-------------|
/// | `cmd`        | 1    | Always [`GET_DEVICES_CMD`]. |
/// | `page_count` | 1    | Pages requested, truncated to the low byte. |
/// | padding      | 62   | Zeroes. |
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct GetDevicesPacket {
    pub page_count: usize,
}

impl GetDevicesPacket {
    pub const fn new(page_count: usize) -> Self {
        Self { page_count }
    }

    /// Number of reply bytes the hub sends for this request.
    pub const fn reply_len(&self) -> usize {
        PAGE_STRIDE * self.page_count
    }
}

impl Encode for GetDevicesPacket {
    fn size(&self) -> usize {
        COMMAND_FRAME_SIZE
    }

    fn encode(&self, data: &mut [u8]) {
        data[..COMMAND_FRAME_SIZE].fill(0);
        GET_DEVICES_CMD.encode(data);
        ((self.page_count & 0xFF) as u8).encode(&mut data[1..]);
    }
}

/// One device bound to (or heard by) the hub.
///
/// # Slot layout
///
/// | Offset | Size | Field |
/// |--------|------|-------|
/// | 0      | 6    | `mac` |
/// | 6      | 6    | `master_mac` |
/// | 12     | 1    | `channel` |
/// | 13     | 1    | `rx_type` |
/// | 14     | 4    | unknown |
/// | 18     | 1    | `device_type` |
/// | 19     | 1    | fan count, +10 while the fans are idle |
/// | 20     | 8    | unknown |
/// | 28     | 8    | `fan_rpm`, four big-endian u16 |
/// | 36     | 4    | `pwm` |
/// | 40     | 1    | `command_sequence` |
/// | 41     | 1    | trailer, always [`SLOT_TRAILER`] |
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceRecord {
    pub mac: MacAddress,
    /// Address of the hub this device is bound to. Unset when unbound.
    pub master_mac: MacAddress,
    pub channel: u8,
    pub rx_type: u8,
    pub device_type: u8,
    /// Number of fans attached. Raw values of 20 and above are passed through uncorrected.
    pub fan_count: u8,
    /// Duty cycle per fan channel.
    pub pwm: [u8; 4],
    pub fan_rpm: [u16; 4],
    /// Rolling sequence number maintained by the hub.
    pub command_sequence: u8,
    /// The slot this record was decoded from.
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_slot"))]
    pub raw: [u8; SLOT_SIZE],
}

impl DeviceRecord {
    pub fn is_bound(&self) -> bool {
        !self.master_mac.is_unset()
    }
}

/// Removes the idle offset from a raw fan count byte.
fn correct_fan_count(raw: u8) -> u8 {
    match raw {
        0..=9 => raw,
        10..=19 => raw - 10,
        _ => {
            warn!("Fan count byte {raw} is outside the known range, keeping it as is");
            raw
        }
    }
}

impl Decode for DeviceRecord {
    /// Consumes one full slot, even when the slot turns out to be unpopulated.
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        let raw = <[u8; SLOT_SIZE]>::decode(data)?;

        let trailer = raw[SLOT_SIZE - 1];
        if trailer != SLOT_TRAILER {
            return Err(DecodeError::new::<Self>(DecodeErrorKind::UnexpectedByte {
                name: "slot trailer",
                value: trailer,
                expected: &[SLOT_TRAILER],
            }));
        }

        let slot = &mut &raw[..];
        let mac = MacAddress::decode(slot)?;
        let master_mac = MacAddress::decode(slot)?;
        let channel = u8::decode(slot)?;
        let rx_type = u8::decode(slot)?;
        <[u8; 4]>::decode(slot)?;
        let device_type = u8::decode(slot)?;
        let fan_count = correct_fan_count(u8::decode(slot)?);
        <[u8; 8]>::decode(slot)?;

        let mut fan_rpm = [0; 4];
        for rpm in &mut fan_rpm {
            *rpm = u16::decode(slot)?;
        }

        let pwm = <[u8; 4]>::decode(slot)?;
        let command_sequence = u8::decode(slot)?;

        Ok(Self {
            mac,
            master_mac,
            channel,
            rx_type,
            device_type,
            fan_count,
            pwm,
            fan_rpm,
            command_sequence,
            raw,
        })
    }
}

#[cfg(feature = "serde")]
fn serialize_slot<S: serde::Serializer>(
    raw: &[u8; SLOT_SIZE],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serde::Serialize::serialize(raw.as_slice(), serializer)
}

/// Decodes up to `device_count` records from a reply buffer.
///
/// Slots are read back to back after the page header. Unpopulated slots are
/// skipped, and decoding stops quietly if the buffer runs out early.
pub fn decode_records(device_count: usize, data: &[u8]) -> Vec<DeviceRecord> {
    let mut records = Vec::with_capacity(device_count);
    let mut slots = data.get(PAGE_HEADER_SIZE..).unwrap_or_default();

    for index in 0..device_count {
        match DeviceRecord::decode(&mut slots) {
            Ok(record) => records.push(record),
            Err(e) if e.kind() == DecodeErrorKind::UnexpectedEnd => {
                debug!(
                    "Buffer ended after {index} of {device_count} device slots ({} bytes left)",
                    slots.len()
                );
                break;
            }
            Err(e) => debug!("Skipping device slot {index}: {e}"),
        }
    }

    records
}

/// A validated reply to a [`GetDevicesPacket`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    /// Number of devices the hub reports, regardless of how many pages were requested.
    pub device_count: u8,
    pub data: Vec<u8>,
}

impl PageResponse {
    pub fn records(&self) -> Vec<DeviceRecord> {
        decode_records(self.device_count as usize, &self.data)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{decode_records, DeviceRecord, GetDevicesPacket, PageResponse};
    use crate::{
        decode::{Decode, DecodeErrorKind},
        encode::Encode,
        packets::{GET_DEVICES_CMD, SLOT_SIZE, SLOT_TRAILER},
    };

    /// A populated slot whose first MAC octet is `id`.
    pub(crate) fn slot(id: u8) -> [u8; SLOT_SIZE] {
        let mut slot = [0; SLOT_SIZE];
        slot[..6].copy_from_slice(&[id, 0xBB, 0xCC, 0x00, 0x11, 0x22]);
        slot[6..12].copy_from_slice(&[0x10, 0x20, 0x30, 0x40, 0x50, 0x60]);
        slot[12] = 8;
        slot[13] = 1;
        slot[18] = 3;
        slot[19] = 13;
        slot[28..36].copy_from_slice(&[0x01, 0x2C, 0x02, 0x58, 0x00, 0x00, 0xFF, 0xFF]);
        slot[36..40].copy_from_slice(&[10, 20, 30, 40]);
        slot[40] = 7;
        slot[41] = SLOT_TRAILER;
        slot
    }

    /// A reply buffer holding the given slots, padded to `len`.
    pub(crate) fn reply(device_count: u8, slots: &[[u8; SLOT_SIZE]], len: usize) -> Vec<u8> {
        let mut data = vec![GET_DEVICES_CMD, device_count, 0, 0];
        for slot in slots {
            data.extend_from_slice(slot);
        }
        data.resize(len.max(data.len()), 0);
        data
    }

    #[test]
    fn request_frame() {
        for page_count in [1, 2, 3, 26, 255, 256, 300] {
            let frame = GetDevicesPacket::new(page_count).to_frame();
            assert_eq!(frame.len(), 64);
            assert_eq!(frame[0], 0x10);
            assert_eq!(frame[1] as usize, page_count % 256);
            assert!(frame[2..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn encode_clears_stale_bytes() {
        let mut frame = [0xEE; 64];
        GetDevicesPacket::new(2).encode(&mut frame);
        assert_eq!(&frame[..2], &[0x10, 0x02]);
        assert!(frame[2..].iter().all(|&b| b == 0));
    }

    #[test]
    fn decode_fields() {
        let record = DeviceRecord::decode(&mut &slot(0xAA)[..]).unwrap();

        assert_eq!(record.mac.to_string(), "aa:bb:cc:00:11:22");
        assert_eq!(record.master_mac.to_string(), "10:20:30:40:50:60");
        assert!(record.is_bound());
        assert_eq!(record.channel, 8);
        assert_eq!(record.rx_type, 1);
        assert_eq!(record.device_type, 3);
        assert_eq!(record.fan_count, 3);
        assert_eq!(record.fan_rpm, [300, 600, 0, 0xFFFF]);
        assert_eq!(record.pwm, [10, 20, 30, 40]);
        assert_eq!(record.command_sequence, 7);
        assert_eq!(record.raw, slot(0xAA));
    }

    #[test]
    fn unbound_device() {
        let mut raw = slot(1);
        raw[6..12].fill(0);
        let record = DeviceRecord::decode(&mut &raw[..]).unwrap();
        assert!(!record.is_bound());

        raw[11] = 1;
        let record = DeviceRecord::decode(&mut &raw[..]).unwrap();
        assert!(record.is_bound());
    }

    #[test]
    fn fan_count_correction() {
        let mut raw = slot(1);
        for (byte, expected) in [(0, 0), (4, 4), (9, 9), (10, 0), (14, 4), (19, 9), (20, 20), (200, 200)] {
            raw[19] = byte;
            let record = DeviceRecord::decode(&mut &raw[..]).unwrap();
            assert_eq!(record.fan_count, expected, "raw fan count {byte}");
        }
    }

    #[test]
    fn bad_trailer_still_consumes_slot() {
        let mut raw = slot(1).to_vec();
        raw[41] = 5;
        raw.push(0x99);

        let data = &mut &raw[..];
        let err = DeviceRecord::decode(data).unwrap_err();
        assert!(matches!(
            err.kind(),
            DecodeErrorKind::UnexpectedByte { value: 5, .. }
        ));
        assert_eq!(*data, &[0x99]);
    }

    #[test]
    fn skipped_slot_keeps_alignment() {
        let mut bad = slot(2);
        bad[41] = 5;
        let data = reply(3, &[slot(1), bad, slot(3)], 434);

        let records = decode_records(3, &data);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].mac.octets()[0], 1);
        assert_eq!(records[1].mac.octets()[0], 3);
        assert_eq!(records[1].raw, slot(3));
    }

    #[test]
    fn skips_slot_with_bad_trailer() {
        let mut bad = slot(0xB0);
        bad[41] = 5;
        let data = reply(2, &[slot(0xA0), bad], 0);

        let records = decode_records(2, &data);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mac.octets()[0], 0xA0);
    }

    #[test]
    fn truncated_buffer_yields_fewer_records() {
        let mut data = reply(3, &[slot(1), slot(2), slot(3)], 0);
        data.truncate(4 + 42 * 2 + 41);

        let records = decode_records(3, &data);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn tiny_buffers() {
        assert!(decode_records(5, &[]).is_empty());
        assert!(decode_records(5, &[GET_DEVICES_CMD, 5]).is_empty());
        assert!(decode_records(0, &reply(0, &[slot(1)], 434)).is_empty());
    }

    #[test]
    fn never_emits_more_than_count() {
        let data = reply(1, &[slot(1), slot(2), slot(3)], 434);
        assert_eq!(decode_records(1, &data).len(), 1);
    }

    #[test]
    fn decoding_is_idempotent() {
        let mut bad = slot(2);
        bad[41] = 0;
        let response = PageResponse {
            device_count: 3,
            data: reply(3, &[slot(1), bad, slot(3)], 434),
        };
        assert_eq!(response.records(), response.records());
    }
}
