// OS primitives: one readiness wait plus one read/write per call
use dis_core::{ConnHandle, Interest};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::socket::{recv, send, MsgFlags};
use std::os::fd::AsFd;
use std::time::Duration;

/// Raw per-call socket operations. Retry and classification live above this.
pub trait SocketIo: Send + Sync {
    /// `Ok(true)` when ready, `Ok(false)` when `timeout` elapsed first.
    fn wait(&self, handle: ConnHandle, interest: Interest, timeout: Duration) -> nix::Result<bool>;

    fn read(&self, handle: ConnHandle, buf: &mut [u8]) -> nix::Result<usize>;

    fn write(&self, handle: ConnHandle, buf: &[u8]) -> nix::Result<usize>;
}

/// `poll(2)` + `recv(2)`/`send(2)` on the raw descriptor
#[derive(Debug, Clone, Copy, Default)]
pub struct SysSocketIo;

impl SocketIo for SysSocketIo {
    fn wait(&self, handle: ConnHandle, interest: Interest, timeout: Duration) -> nix::Result<bool> {
        let events = match interest {
            Interest::Read => PollFlags::POLLIN,
            Interest::Write => PollFlags::POLLOUT,
        };
        let mut fds = [PollFd::new(handle.as_fd(), events)];
        let ready = poll(&mut fds, poll_timeout(timeout))?;
        Ok(ready > 0)
    }

    fn read(&self, handle: ConnHandle, buf: &mut [u8]) -> nix::Result<usize> {
        recv(handle.raw(), buf, MsgFlags::empty())
    }

    fn write(&self, handle: ConnHandle, buf: &[u8]) -> nix::Result<usize> {
        send(handle.raw(), buf, MsgFlags::empty())
    }
}

// Seconds-scale timeouts in poll's millisecond unit, saturating at i32::MAX
fn poll_timeout(timeout: Duration) -> PollTimeout {
    let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
    PollTimeout::try_from(millis).unwrap_or(PollTimeout::MAX)
}
