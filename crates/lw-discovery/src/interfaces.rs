//! Snapshot of the host's interface table at discovery start.

use std::io;
use std::net::Ipv4Addr;

use nix::ifaddrs::getifaddrs;
use nix::net::if_::{if_nametoindex, InterfaceFlags};
use tracing::debug;

use crate::DiscoveryError;

/// One eligible local interface. The OS owns the lifetime; discovery
/// only reads this snapshot once, before subscribing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    pub index: u32,
    pub name: String,
    pub addr: Ipv4Addr,
}

/// Every UP, non-loopback interface carrying an IPv4 address.
pub fn active_interfaces() -> Result<Vec<NetworkInterface>, DiscoveryError> {
    let addrs = getifaddrs().map_err(|e| DiscoveryError::Enumeration(io_error(e)))?;
    let mut interfaces: Vec<NetworkInterface> = Vec::new();

    for ifaddr in addrs {
        if ifaddr.flags.contains(InterfaceFlags::IFF_LOOPBACK)
            || !ifaddr.flags.contains(InterfaceFlags::IFF_UP)
        {
            continue;
        }
        // getifaddrs yields one entry per address family; keep the IPv4
        // ones and dedupe by name.
        let Some(sin) = ifaddr.address.as_ref().and_then(|a| a.as_sockaddr_in()) else {
            continue;
        };
        if interfaces.iter().any(|i| i.name == ifaddr.interface_name) {
            continue;
        }
        let index = if_nametoindex(ifaddr.interface_name.as_str())
            .map_err(|e| DiscoveryError::Enumeration(io_error(e)))?;

        debug!(
            name = %ifaddr.interface_name,
            index,
            addr = %sin.ip(),
            "interface eligible for capture"
        );
        interfaces.push(NetworkInterface {
            index,
            name: ifaddr.interface_name,
            addr: sin.ip(),
        });
    }

    Ok(interfaces)
}

fn io_error(errno: nix::Error) -> io::Error {
    io::Error::from_raw_os_error(errno as i32)
}
