//! LiveWire address families and the source-number codec.
//!
//! A source number owns one slot in each of the three multicast families
//! (stereo, surround, backfeed) simultaneously; four reserved channels
//! live outside the source-number space at `239.192.255.{1..4}`.
//! Address ranges per "Intro to LiveWire v2.1.1", pp 113-114.

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{MAX_SOURCE, MIN_SOURCE};

/// Malformed or out-of-range address token. Terminal for a CLI caller,
/// recoverable for a library caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid argument: {0}")]
pub struct InvalidArgument(pub String);

// -- Signal families --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalType {
    Stereo,
    Surround,
    Backfeed,
}

// -- Ethernet multicast --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacAddr(pub [u8; 6]);

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

// -- Reserved special channels --

/// The four reserved non-audio channels of the stereo multicast network,
/// keyed by the last octet of `239.192.255.{1..4}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SpecialChannel {
    LivestreamClock = 1,
    StandardClock = 2,
    Advertisement = 3,
    Gpio = 4,
}

impl SpecialChannel {
    pub fn from_last_octet(octet: u8) -> Option<Self> {
        match octet {
            1 => Some(Self::LivestreamClock),
            2 => Some(Self::StandardClock),
            3 => Some(Self::Advertisement),
            4 => Some(Self::Gpio),
            _ => None,
        }
    }

    pub fn last_octet(self) -> u8 {
        self as u8
    }

    pub fn ip(self) -> Ipv4Addr {
        Ipv4Addr::new(239, 192, 255, self as u8)
    }

    pub fn mac(self) -> MacAddr {
        MacAddr([0x01, 0x00, 0x5e, 0x00, 0xff, self as u8])
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::LivestreamClock => "Livestream clock",
            Self::StandardClock => "Standard stream clock",
            Self::Advertisement => "Advertisement channel",
            Self::Gpio => "GPIO channel",
        }
    }
}

impl fmt::Display for SpecialChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " *{}: {}    {}", self.name(), self.ip(), self.mac())
    }
}

// -- Source addresses --

/// One LiveWire source. `signal_type` is `None` until some concrete
/// scheme (stream ID, MAC, dotted quad) has classified the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveWireAddress {
    source: u16,
    signal_type: Option<SignalType>,
}

impl LiveWireAddress {
    pub fn new(source: u16, signal_type: Option<SignalType>) -> Result<Self, InvalidArgument> {
        if !(MIN_SOURCE..=MAX_SOURCE).contains(&source) {
            return Err(InvalidArgument(format!(
                "source number {source} outside {MIN_SOURCE}..{MAX_SOURCE}"
            )));
        }
        Ok(Self {
            source,
            signal_type,
        })
    }

    pub fn source(&self) -> u16 {
        self.source
    }

    pub fn signal_type(&self) -> Option<SignalType> {
        self.signal_type
    }

    /// The multicast group this source occupies in the given family.
    pub fn ip_for(&self, family: SignalType) -> Ipv4Addr {
        let hi = (self.source / 256) as u8;
        let lo = (self.source % 256) as u8;
        match family {
            SignalType::Stereo => Ipv4Addr::new(239, 192, hi, lo),
            SignalType::Surround => Ipv4Addr::new(239, 196, 128 + hi, lo),
            SignalType::Backfeed => Ipv4Addr::new(239, 193, hi, lo),
        }
    }

    /// The Ethernet multicast address paired with [`ip_for`](Self::ip_for).
    pub fn mac_for(&self, family: SignalType) -> MacAddr {
        let hi = (self.source / 256) as u8;
        let lo = (self.source % 256) as u8;
        match family {
            SignalType::Stereo => MacAddr([0x01, 0x00, 0x5e, 0x00, hi, lo]),
            SignalType::Surround => MacAddr([0x01, 0x00, 0x5e, 0x04, 128 + hi, lo]),
            SignalType::Backfeed => MacAddr([0x01, 0x00, 0x5e, 0x01, hi, lo]),
        }
    }

    /// 32-bit stream ID (the family's multicast group as a big-endian word).
    pub fn stream_id_for(&self, family: SignalType) -> u32 {
        u32::from(self.ip_for(family))
    }
}

impl fmt::Display for LiveWireAddress {
    /// The three derived addresses, with a `*` marker on the family that
    /// matched during parsing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |family| {
            if self.signal_type == Some(family) {
                "*"
            } else {
                " "
            }
        };
        writeln!(f, "LiveWire Source # {}", self.source)?;
        writeln!(
            f,
            "   {}Stereo Address: {:<15}  {}",
            mark(SignalType::Stereo),
            self.ip_for(SignalType::Stereo),
            self.mac_for(SignalType::Stereo)
        )?;
        writeln!(
            f,
            " {}Surround Address: {:<15}  {}",
            mark(SignalType::Surround),
            self.ip_for(SignalType::Surround),
            self.mac_for(SignalType::Surround)
        )?;
        write!(
            f,
            " {}Backfeed Address: {:<15}  {}",
            mark(SignalType::Backfeed),
            self.ip_for(SignalType::Backfeed),
            self.mac_for(SignalType::Backfeed)
        )
    }
}

// -- Token parsing --

/// Everything one input token can denote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interpretation {
    Source(LiveWireAddress),
    Special(SpecialChannel),
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(addr) => addr.fmt(f),
            Self::Special(channel) => channel.fmt(f),
        }
    }
}

/// Try every applicable interpretation of `token` — stream ID, MAC,
/// bare source number, dotted quad — and return all matches.
///
/// A dotted quad with a malformed or out-of-range octet fails
/// immediately; a token matching no scheme at all fails with an
/// "unrecognized address" condition.
pub fn parse_token(token: &str) -> Result<Vec<Interpretation>, InvalidArgument> {
    let mut found = Vec::new();

    // 8 hex digits: a 32-bit stream ID.
    if token.len() == 8 {
        if let Ok(id) = u32::from_str_radix(token, 16) {
            parse_stream_id(id, &mut found);
        }
    }

    // 12 hex digits, or 6 colon/hyphen-delimited groups: a MAC.
    if let Some(mac) = normalize_mac(token) {
        parse_mac(mac, &mut found);
    }

    // Bare decimal source number, family not yet classified.
    if let Ok(source) = token.parse::<u16>() {
        if let Ok(addr) = LiveWireAddress::new(source, None) {
            found.push(Interpretation::Source(addr));
        }
    }

    // Dotted-quad IPv4.
    if token.split('.').count() == 4 {
        parse_dotted_quad(token, &mut found)?;
    }

    if found.is_empty() {
        return Err(InvalidArgument(format!("unrecognized address {token:?}")));
    }
    Ok(found)
}

fn push_source(found: &mut Vec<Interpretation>, source: u16, family: Option<SignalType>) {
    if let Ok(addr) = LiveWireAddress::new(source, family) {
        found.push(Interpretation::Source(addr));
    }
}

fn parse_stream_id(id: u32, found: &mut Vec<Interpretation>) {
    match id & 0xffff_0000 {
        // 239.192 net: special channel when octet 3 is 0xff, else stereo.
        0xefc0_0000 => {
            if id & 0x0000_ff00 == 0x0000_ff00 {
                if let Some(channel) = SpecialChannel::from_last_octet((id & 0xff) as u8) {
                    found.push(Interpretation::Special(channel));
                }
            } else {
                push_source(found, (id & 0xffff) as u16, Some(SignalType::Stereo));
            }
        }
        // Deployed scanners read the 239.196 net as backfeed and the
        // 239.193 net as surround in stream IDs; kept for wire
        // compatibility even though the dotted-quad classifier differs.
        0xefc4_0000 => push_source(found, (id & 0xffff) as u16, Some(SignalType::Backfeed)),
        0xefc1_0000 => push_source(found, (id & 0x7fff) as u16, Some(SignalType::Surround)),
        _ => {}
    }
}

/// Strip MAC delimiters and parse the remaining hex. Accepts 12 bare hex
/// digits or exactly 6 colon- or hyphen-delimited groups.
fn normalize_mac(token: &str) -> Option<u64> {
    let hex: String = if token.len() == 12 && token.chars().all(|c| c.is_ascii_hexdigit()) {
        token.to_owned()
    } else {
        let groups: Vec<&str> = if token.contains(':') {
            token.split(':').collect()
        } else if token.contains('-') {
            token.split('-').collect()
        } else {
            return None;
        };
        if groups.len() != 6 {
            return None;
        }
        groups.concat()
    };
    u64::from_str_radix(&hex, 16).ok()
}

fn parse_mac(mac: u64, found: &mut Vec<Interpretation>) {
    match mac & 0xffff_ffff_0000 {
        // 01:00:5e:00 prefix: special channel when byte 5 is 0xff.
        0x0100_5e00_0000 => {
            if mac & 0xff00 == 0xff00 {
                if let Some(channel) = SpecialChannel::from_last_octet((mac & 0xff) as u8) {
                    found.push(Interpretation::Special(channel));
                }
            } else {
                push_source(found, (mac & 0xffff) as u16, Some(SignalType::Stereo));
            }
        }
        0x0100_5e01_0000 => push_source(found, (mac & 0xffff) as u16, Some(SignalType::Backfeed)),
        0x0100_5e04_0000 => push_source(found, (mac & 0x7fff) as u16, Some(SignalType::Surround)),
        _ => {}
    }
}

fn parse_dotted_quad(token: &str, found: &mut Vec<Interpretation>) -> Result<(), InvalidArgument> {
    let mut octets = [0u8; 4];
    for (i, field) in token.split('.').enumerate() {
        let value: u32 = field
            .parse()
            .map_err(|_| InvalidArgument(format!("malformed octet {:?} in {token:?}", field)))?;
        if value > 255 {
            return Err(InvalidArgument(format!(
                "octet {value} out of range in {token:?}"
            )));
        }
        octets[i] = value as u8;
    }

    if octets[0] != 239 {
        return Ok(());
    }
    let source = |o3: u8| 256 * u16::from(o3) + u16::from(octets[3]);
    match (octets[1], octets[2]) {
        (192, o3) if o3 < 128 => push_source(found, source(o3), Some(SignalType::Stereo)),
        (193, o3) if o3 < 128 => push_source(found, source(o3), Some(SignalType::Backfeed)),
        (196, o3) if o3 >= 128 => push_source(found, source(o3 - 128), Some(SignalType::Surround)),
        (192, 255) => {
            if let Some(channel) = SpecialChannel::from_last_octet(octets[3]) {
                found.push(Interpretation::Special(channel));
            }
        }
        _ => {}
    }
    Ok(())
}
