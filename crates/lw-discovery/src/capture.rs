//! The two kernel delivery paths needed to see clock frames.
//!
//! An IP-layer multicast membership makes the kernel's filter pass the
//! clock group up at all; a separate link-layer promiscuous capture
//! socket is what actually reads the frames, because discovery needs the
//! raw Ethernet/IP headers that datagram delivery would strip. Each
//! capability is its own object so each can fail independently.

use std::io;
use std::mem;
use std::net::Ipv4Addr;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::time::{Duration, Instant};

use socket2::{Domain, InterfaceIndexOrAddress, Protocol, Socket, Type};
use tracing::debug;

/// Readiness-then-read access to raw frames. The seam between the
/// polling loop and the packet socket; test doubles implement it too.
pub trait FrameCapture {
    /// Wait until a frame is readable. `Ok(false)` means the timeout
    /// elapsed with nothing to read.
    fn wait(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Read one frame into `buf`, returning its length.
    fn read_frame(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// IP-layer capability: one UDP socket holding a clock-group membership
/// per interface.
pub struct MulticastMembership {
    socket: Socket,
    group: Ipv4Addr,
}

impl MulticastMembership {
    pub fn new(group: Ipv4Addr) -> io::Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        Ok(Self { socket, group })
    }

    pub fn group(&self) -> Ipv4Addr {
        self.group
    }

    pub fn join(&self, if_index: u32) -> io::Result<()> {
        self.socket
            .join_multicast_v4_n(&self.group, &InterfaceIndexOrAddress::Index(if_index))?;
        debug!(if_index, group = %self.group, "joined multicast group");
        Ok(())
    }
}

/// Link-layer capability: a single `AF_PACKET`/`SOCK_RAW` socket shared
/// by every interface. Promiscuous membership per interface makes frames
/// from any of them visible on this one descriptor.
pub struct PromiscuousCapture {
    fd: OwnedFd,
}

impl PromiscuousCapture {
    pub fn open() -> io::Result<Self> {
        // The protocol field of an AF_PACKET socket is in network byte order.
        let protocol = (libc::ETH_P_IP as u16).to_be() as libc::c_int;
        let fd = unsafe { libc::socket(libc::AF_PACKET, libc::SOCK_RAW, protocol) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self {
            fd: unsafe { OwnedFd::from_raw_fd(fd) },
        })
    }

    pub fn add_interface(&self, if_index: u32) -> io::Result<()> {
        let mut req: libc::packet_mreq = unsafe { mem::zeroed() };
        req.mr_ifindex = if_index as libc::c_int;
        req.mr_type = libc::PACKET_MR_PROMISC as libc::c_ushort;
        let rc = unsafe {
            libc::setsockopt(
                self.fd.as_raw_fd(),
                libc::SOL_PACKET,
                libc::PACKET_ADD_MEMBERSHIP,
                &req as *const libc::packet_mreq as *const libc::c_void,
                mem::size_of::<libc::packet_mreq>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        debug!(if_index, "promiscuous capture enabled");
        Ok(())
    }
}

impl FrameCapture for PromiscuousCapture {
    fn wait(&mut self, timeout: Duration) -> io::Result<bool> {
        wait_readable(self.fd.as_raw_fd(), timeout)
    }

    fn read_frame(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = unsafe {
            libc::recv(
                self.fd.as_raw_fd(),
                buf.as_mut_ptr() as *mut libc::c_void,
                buf.len(),
                0,
            )
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }
}

/// Poll `fd` for readability until `timeout` elapses. `POLLERR` and
/// `POLLNVAL` wakes are socket errors; other non-`POLLIN` wakes (a
/// `POLLHUP`, say) do not end the wait early — the remaining time is
/// recomputed and polling continues.
fn wait_readable(fd: RawFd, timeout: Duration) -> io::Result<bool> {
    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let millis = remaining.as_millis().min(i32::MAX as u128) as libc::c_int;
        let mut pfd = libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };
        match unsafe { libc::poll(&mut pfd, 1, millis) } {
            -1 => return Err(io::Error::last_os_error()),
            0 => return Ok(false),
            _ => {
                if pfd.revents & libc::POLLIN != 0 {
                    return Ok(true);
                }
                if pfd.revents & (libc::POLLERR | libc::POLLNVAL) != 0 {
                    return Err(io::Error::other("capture socket poll error"));
                }
                if remaining.is_zero() {
                    return Ok(false);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipe() -> (OwnedFd, OwnedFd) {
        let mut fds = [0i32; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) }
    }

    #[test]
    fn test_wait_reports_readable_data() {
        let (read_end, write_end) = pipe();
        let n = unsafe {
            libc::write(
                write_end.as_raw_fd(),
                b"x".as_ptr() as *const libc::c_void,
                1,
            )
        };
        assert_eq!(n, 1);
        assert!(wait_readable(read_end.as_raw_fd(), Duration::from_millis(100)).unwrap());
    }

    #[test]
    fn test_hangup_without_data_waits_out_the_budget() {
        // A descriptor whose peer is gone wakes poll with POLLHUP, not
        // POLLIN; that must not be reported as the timeout having
        // elapsed while budget remains.
        let (read_end, write_end) = pipe();
        drop(write_end);

        let started = Instant::now();
        let readable = wait_readable(read_end.as_raw_fd(), Duration::from_millis(50)).unwrap();
        assert!(!readable);
        assert!(
            started.elapsed() >= Duration::from_millis(50),
            "wait gave up before the budget: {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn test_poll_error_surfaces_as_io_error() {
        // The write end of a pipe with no reader left polls as POLLERR.
        let (read_end, write_end) = pipe();
        drop(read_end);

        let err = wait_readable(write_end.as_raw_fd(), Duration::from_millis(50)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }
}
