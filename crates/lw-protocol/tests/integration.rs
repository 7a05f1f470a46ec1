//! Integration tests for the lw-protocol crate.
//!
//! These exercise the public API across module boundaries: token parsing
//! against rendered addresses, the special channels against the clock
//! frame constants, and the documented display formats.

use std::net::Ipv4Addr;

use lw_protocol::address::{
    parse_token, Interpretation, LiveWireAddress, SignalType, SpecialChannel,
};
use lw_protocol::clock::{parse_clock_frame, CLOCK_FRAME_LEN, CLOCK_MULTICAST, DST_ADDR_OFFSET,
    SRC_ADDR_OFFSET};
use lw_protocol::{MAX_SOURCE, MIN_SOURCE};

// ---------------------------------------------------------------------------
// 1. Every rendered representation reparses to the same source
// ---------------------------------------------------------------------------

#[test]
fn rendered_addresses_reparse_to_same_source() {
    let addr = LiveWireAddress::new(2001, None).unwrap();

    for family in [SignalType::Stereo, SignalType::Surround, SignalType::Backfeed] {
        // The stream ID is the family's multicast group as one word.
        assert_eq!(addr.stream_id_for(family), u32::from(addr.ip_for(family)));

        let token = addr.ip_for(family).to_string();
        let found = parse_token(&token).expect("rendered address must parse");
        match found.as_slice() {
            [Interpretation::Source(reparsed)] => {
                assert_eq!(reparsed.source(), 2001, "family {family:?}");
                assert_eq!(reparsed.signal_type(), Some(family));
            }
            other => panic!("unexpected interpretations {other:?}"),
        }
    }

    // The MAC forms reparse too; the stream-ID net mapping is historical
    // and intentionally not the inverse of the dotted-quad classifier.
    let mac = addr.mac_for(SignalType::Backfeed).to_string();
    let found = parse_token(&mac).unwrap();
    match found.as_slice() {
        [Interpretation::Source(reparsed)] => {
            assert_eq!(reparsed.source(), 2001);
            assert_eq!(reparsed.signal_type(), Some(SignalType::Backfeed));
        }
        other => panic!("unexpected interpretations {other:?}"),
    }
}

#[test]
fn source_range_endpoints() {
    assert!(LiveWireAddress::new(MIN_SOURCE, None).is_ok());
    assert!(LiveWireAddress::new(MAX_SOURCE, None).is_ok());
    assert!(LiveWireAddress::new(0, None).is_err());
    assert!(LiveWireAddress::new(MAX_SOURCE + 1, None).is_err());
}

// ---------------------------------------------------------------------------
// 2. Special channels and the clock constants agree
// ---------------------------------------------------------------------------

#[test]
fn special_channels_cover_exactly_four_last_octets() {
    assert!(SpecialChannel::from_last_octet(0).is_none());
    for octet in 1..=4u8 {
        let channel = SpecialChannel::from_last_octet(octet).unwrap();
        assert_eq!(channel.last_octet(), octet);
        assert_eq!(channel.ip(), Ipv4Addr::new(239, 192, 255, octet));
        assert_eq!(
            channel.mac().to_string(),
            format!("01:00:5e:00:ff:{octet:02x}")
        );
    }
    assert!(SpecialChannel::from_last_octet(5).is_none());
}

#[test]
fn discovery_listens_on_the_standard_clock_channel() {
    assert_eq!(SpecialChannel::StandardClock.ip(), CLOCK_MULTICAST);
}

#[test]
fn clock_frame_built_from_channel_constants_parses() {
    let mut frame = vec![0u8; CLOCK_FRAME_LEN];
    frame[SRC_ADDR_OFFSET..SRC_ADDR_OFFSET + 4].copy_from_slice(&[192, 168, 2, 7]);
    frame[DST_ADDR_OFFSET..DST_ADDR_OFFSET + 4]
        .copy_from_slice(&SpecialChannel::StandardClock.ip().octets());
    assert_eq!(
        parse_clock_frame(&frame),
        Some(Ipv4Addr::new(192, 168, 2, 7))
    );
}

// ---------------------------------------------------------------------------
// 3. Display formats are the documented text
// ---------------------------------------------------------------------------

#[test]
fn source_display_format() {
    let addr = LiveWireAddress::new(1, Some(SignalType::Stereo)).unwrap();
    let display = addr.to_string();
    let lines: Vec<&str> = display.lines().map(str::trim_end).collect();
    assert_eq!(lines[0], "LiveWire Source # 1");
    assert_eq!(lines[1], "   *Stereo Address: 239.192.0.1      01:00:5e:00:00:01");
    assert_eq!(lines[2], "  Surround Address: 239.196.128.1    01:00:5e:04:80:01");
    assert_eq!(lines[3], "  Backfeed Address: 239.193.0.1      01:00:5e:01:00:01");
}

#[test]
fn special_channel_display_format() {
    assert_eq!(
        SpecialChannel::Gpio.to_string(),
        " *GPIO channel: 239.192.255.4    01:00:5e:00:ff:04"
    );
}

// ---------------------------------------------------------------------------
// 4. A token can denote both a bare source and nothing else
// ---------------------------------------------------------------------------

#[test]
fn decimal_token_yields_unclassified_source() {
    let found = parse_token("4077").unwrap();
    assert_eq!(found.len(), 1);
    match found[0] {
        Interpretation::Source(addr) => {
            assert_eq!(addr.source(), 4077);
            assert_eq!(addr.signal_type(), None);
        }
        Interpretation::Special(ch) => panic!("unexpected special channel {ch:?}"),
    }
}
