//! Master-clock discovery for LiveWire LANs.
//!
//! The protocol has no request/response for locating the clock master;
//! the master simply multicasts periodic clock frames. Discovery is
//! therefore passive: subscribe every interface to the clock group,
//! sniff raw frames through one shared capture socket, and race a
//! wall-clock deadline against the first matching announcement.
//!
//! Requires `CAP_NET_RAW` (the capture socket is `AF_PACKET`); Linux only.

pub mod capture;
pub mod discover;
pub mod interfaces;

pub use capture::{FrameCapture, MulticastMembership, PromiscuousCapture};
pub use discover::{
    discover_master, poll_master, subscribe_all, Deadline, DiscoveryOutcome, DEFAULT_TIMEOUT,
    NO_MASTER,
};
pub use interfaces::{active_interfaces, NetworkInterface};

use std::io;

use thiserror::Error;

/// Fatal conditions within one discovery attempt. None of these is
/// retried internally; repeated probing is the caller's cadence.
/// A timeout is not an error — see [`DiscoveryOutcome::TimedOut`].
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("unable to enumerate network interfaces: {0}")]
    Enumeration(#[source] io::Error),

    /// Interface join or promiscuous-mode set failed, usually missing
    /// privilege or a vanished interface.
    #[error("unable to subscribe interface {interface:?}: {source}")]
    Subscription {
        interface: String,
        #[source]
        source: io::Error,
    },

    #[error("capture socket error: {0}")]
    Capture(#[from] io::Error),
}
