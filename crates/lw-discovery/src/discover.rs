//! Deadline-bounded polling for the master clock announcement.

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use lw_protocol::clock::{parse_clock_frame, CLOCK_MULTICAST};

use crate::capture::{FrameCapture, MulticastMembership, PromiscuousCapture};
use crate::interfaces::{active_interfaces, NetworkInterface};
use crate::DiscoveryError;

/// Default listening budget per attempt. Callers probing on a cadence
/// (monitor front-ends) pass their own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

/// Sentinel reported when no master is observable.
pub const NO_MASTER: Ipv4Addr = Ipv4Addr::UNSPECIFIED;

/// Wall-clock budget for one discovery run. `remaining()` is recomputed
/// every loop iteration so the overall call never exceeds the budget.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    /// Budget left; zero once the deadline has passed.
    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.started.elapsed())
    }
}

/// Terminal discovery states. A timeout is a defined, successful outcome
/// meaning "no master currently observable", not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    Found(Ipv4Addr),
    TimedOut,
}

impl DiscoveryOutcome {
    /// The discovered address, or the `0.0.0.0` sentinel on timeout.
    pub fn address(&self) -> Ipv4Addr {
        match self {
            Self::Found(addr) => *addr,
            Self::TimedOut => NO_MASTER,
        }
    }
}

/// One-shot discovery: snapshot the interface table, subscribe every
/// interface at both layers, poll until the deadline. Synchronous; one
/// capture socket serves all interfaces. No internal retry.
pub fn discover_master(budget: Duration) -> Result<DiscoveryOutcome, DiscoveryError> {
    let interfaces = active_interfaces()?;
    let membership = MulticastMembership::new(CLOCK_MULTICAST)?;
    let mut capture = PromiscuousCapture::open()?;

    subscribe_all(&membership, &capture, &interfaces)?;
    poll_master(&mut capture, Deadline::new(budget))
}

/// Join the clock group and enable promiscuous capture on every
/// interface. The first failure aborts: polling never runs against a
/// partially subscribed interface set.
pub fn subscribe_all(
    membership: &MulticastMembership,
    capture: &PromiscuousCapture,
    interfaces: &[NetworkInterface],
) -> Result<(), DiscoveryError> {
    for iface in interfaces {
        let subscription_error = |source| DiscoveryError::Subscription {
            interface: iface.name.clone(),
            source,
        };
        membership.join(iface.index).map_err(subscription_error)?;
        capture.add_interface(iface.index).map_err(subscription_error)?;
        debug!(
            name = %iface.name,
            index = iface.index,
            addr = %iface.addr,
            group = %CLOCK_MULTICAST,
            "interface subscribed"
        );
    }
    Ok(())
}

/// Race the deadline against incoming frames. Each iteration waits with
/// the *remaining* budget; frames that are not clock announcements
/// (wrong length or wrong destination) are skipped silently.
pub fn poll_master<C: FrameCapture>(
    capture: &mut C,
    deadline: Deadline,
) -> Result<DiscoveryOutcome, DiscoveryError> {
    // MTU-sized; announcements are 78 bytes but the socket sees all traffic.
    let mut buf = [0u8; 1500];

    loop {
        let remaining = deadline.remaining();
        if remaining.is_zero() || !capture.wait(remaining)? {
            debug!(budget = ?deadline.budget, "no master before deadline");
            return Ok(DiscoveryOutcome::TimedOut);
        }

        let len = capture.read_frame(&mut buf)?;
        if let Some(addr) = parse_clock_frame(&buf[..len]) {
            info!(master = %addr, "clock master announcement seen");
            return Ok(DiscoveryOutcome::Found(addr));
        }
    }
}
