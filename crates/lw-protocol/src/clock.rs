//! Clock-master announcement frames.
//!
//! The master node announces itself by multicasting a fixed-size frame to
//! the standard-clock channel. There is no framing header; the frame is
//! recognized purely by its exact length and the multicast destination at
//! a fixed offset. The offsets and length below are protocol contract.

use std::net::Ipv4Addr;

/// Multicast group carrying clock announcements — the standard-clock
/// special channel, `239.192.255.2`.
pub const CLOCK_MULTICAST: Ipv4Addr = Ipv4Addr::new(239, 192, 255, 2);

/// Exact on-the-wire length of a clock announcement, Ethernet and IP
/// headers included. Frames of any other length are not announcements.
pub const CLOCK_FRAME_LEN: usize = 78;

/// Byte offset of the destination IPv4 address within the raw frame.
pub const DST_ADDR_OFFSET: usize = 30;

/// Byte offset of the announcing node's IPv4 address. This field sits in
/// network byte order, reversed relative to the frame's other multi-byte
/// fields; the octets are taken in frame order.
pub const SRC_ADDR_OFFSET: usize = 26;

/// Extract the master node's address from one raw frame, or `None` for
/// anything that is not a clock announcement.
pub fn parse_clock_frame(frame: &[u8]) -> Option<Ipv4Addr> {
    if frame.len() != CLOCK_FRAME_LEN {
        return None;
    }
    let dst = u32::from_be_bytes([
        frame[DST_ADDR_OFFSET],
        frame[DST_ADDR_OFFSET + 1],
        frame[DST_ADDR_OFFSET + 2],
        frame[DST_ADDR_OFFSET + 3],
    ]);
    if dst != u32::from(CLOCK_MULTICAST) {
        return None;
    }
    Some(Ipv4Addr::new(
        frame[SRC_ADDR_OFFSET],
        frame[SRC_ADDR_OFFSET + 1],
        frame[SRC_ADDR_OFFSET + 2],
        frame[SRC_ADDR_OFFSET + 3],
    ))
}
