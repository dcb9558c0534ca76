// CLASSIFICATION: COMMUNITY
// Filename: netlink.rs v0.2
// Author: Lukas Bower
// Date Modified: 2025-11-21

//! The kernel uevent multicast socket.
//!
//! `NETLINK_KOBJECT_UEVENT`, all multicast groups, non-blocking and
//! close-on-exec. Datagrams not originating from the kernel (sender pid
//! nonzero, or unicast) are dropped before the caller sees them.

use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

/// A bound uevent socket.
#[derive(Debug)]
pub struct UeventSocket {
    fd: OwnedFd,
}

impl UeventSocket {
    /// Open and bind with the given kernel receive buffer size.
    pub fn open(buffer_bytes: usize) -> io::Result<UeventSocket> {
        let fd = unsafe {
            libc::socket(
                libc::PF_NETLINK,
                libc::SOCK_DGRAM | libc::SOCK_CLOEXEC | libc::SOCK_NONBLOCK,
                libc::NETLINK_KOBJECT_UEVENT,
            )
        };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        let sock = UeventSocket {
            fd: unsafe { OwnedFd::from_raw_fd(fd) },
        };

        let on: libc::c_int = 1;
        unsafe {
            libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_PASSCRED,
                &on as *const _ as *const libc::c_void,
                mem::size_of::<libc::c_int>() as libc::socklen_t,
            );
        }

        // RCVBUFFORCE needs CAP_NET_ADMIN; fall back to the capped variant
        let size = buffer_bytes as libc::c_int;
        let rc = unsafe {
            libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_RCVBUFFORCE,
                &size as *const _ as *const libc::c_void,
                mem::size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            unsafe {
                libc::setsockopt(
                    fd,
                    libc::SOL_SOCKET,
                    libc::SO_RCVBUF,
                    &size as *const _ as *const libc::c_void,
                    mem::size_of::<libc::c_int>() as libc::socklen_t,
                );
            }
        }

        let mut addr: libc::sockaddr_nl = unsafe { mem::zeroed() };
        addr.nl_family = libc::AF_NETLINK as libc::sa_family_t;
        addr.nl_pid = std::process::id();
        addr.nl_groups = 0xffff_ffff;
        let rc = unsafe {
            libc::bind(
                fd,
                &addr as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(sock)
    }

    /// Receive one kernel-originated datagram. `WouldBlock` when drained.
    pub fn recv_multicast(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let mut addr: libc::sockaddr_nl = unsafe { mem::zeroed() };
            let mut addr_len = mem::size_of::<libc::sockaddr_nl>() as libc::socklen_t;
            let n = unsafe {
                libc::recvfrom(
                    self.fd.as_raw_fd(),
                    buf.as_mut_ptr() as *mut libc::c_void,
                    buf.len(),
                    0,
                    &mut addr as *mut _ as *mut libc::sockaddr,
                    &mut addr_len,
                )
            };
            if n < 0 {
                return Err(io::Error::last_os_error());
            }
            // nl_pid 0 is the kernel; nonzero groups means multicast
            if addr.nl_pid != 0 || addr.nl_groups == 0 {
                continue;
            }
            return Ok(n as usize);
        }
    }

    /// Block until the socket is readable.
    pub fn wait_readable(&self) -> io::Result<()> {
        let mut pfd = libc::pollfd {
            fd: self.fd.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        loop {
            let rc = unsafe { libc::poll(&mut pfd, 1, -1) };
            if rc < 0 {
                let e = io::Error::last_os_error();
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e);
            }
            return Ok(());
        }
    }
}

impl AsRawFd for UeventSocket {
    fn as_raw_fd(&self) -> libc::c_int {
        self.fd.as_raw_fd()
    }
}
