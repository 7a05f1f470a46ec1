pub mod address;
pub mod clock;

/// Lowest valid LiveWire source number.
pub const MIN_SOURCE: u16 = 1;

/// Highest valid LiveWire source number. The surround family only has
/// 15 bits of source space, so the cap applies to every family.
pub const MAX_SOURCE: u16 = 0x7fff;
