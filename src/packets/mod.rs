//! Wire formats exchanged with the RF hub.

pub mod devices;

/// Command code requesting the device table. The hub echoes it as byte 0 of its reply.
pub const GET_DEVICES_CMD: u8 = 0x10;

/// Size of every command frame sent to the hub.
pub const COMMAND_FRAME_SIZE: usize = 64;

/// Number of reply bytes the hub sends per requested page.
pub const PAGE_STRIDE: usize = 434;

/// Device slots that fit into one page.
pub const MAX_DEVICES_PER_PAGE: usize = 10;

/// Command code, device count and two reserved bytes.
pub const PAGE_HEADER_SIZE: usize = 4;

/// Size of one device slot.
pub const SLOT_SIZE: usize = 42;

/// Value of the last byte of every populated device slot.
pub const SLOT_TRAILER: u8 = 28;

/// Largest read issued while accumulating a reply.
pub const READ_CHUNK_SIZE: usize = 512;

/// Number of pages needed to hold `device_count` slots. Never less than one.
pub fn pages_for(device_count: usize) -> usize {
    device_count.div_ceil(MAX_DEVICES_PER_PAGE).max(1)
}

#[cfg(test)]
mod tests {
    use super::pages_for;

    #[test]
    fn page_math() {
        assert_eq!(pages_for(0), 1);
        assert_eq!(pages_for(1), 1);
        assert_eq!(pages_for(10), 1);
        assert_eq!(pages_for(11), 2);
        assert_eq!(pages_for(20), 2);
        assert_eq!(pages_for(21), 3);
        assert_eq!(pages_for(255), 26);
    }
}
