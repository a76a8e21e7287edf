// Core types shared by the buffer, transport and library crates
use std::fmt;
use std::os::fd::{AsFd, BorrowedFd, RawFd};

/// Opaque handle of an open stream socket. Not owned: the caller keeps the
/// descriptor open for as long as it passes the handle around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnHandle(pub RawFd);

impl ConnHandle {
    pub fn raw(&self) -> RawFd {
        self.0
    }
}

impl AsFd for ConnHandle {
    fn as_fd(&self) -> BorrowedFd<'_> {
        // SAFETY: a handle is only passed around while its descriptor is open
        unsafe { BorrowedFd::borrow_raw(self.0) }
    }
}

impl From<RawFd> for ConnHandle {
    fn from(fd: RawFd) -> Self {
        ConnHandle(fd)
    }
}

impl fmt::Display for ConnHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "fd#{}", self.0)
    }
}

// Readiness direction for a bounded wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interest {
    Read,
    Write,
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Interest::Read => write!(f, "read"),
            Interest::Write => write!(f, "write"),
        }
    }
}

/// Integer result codes seen by the framing layer.
/// Positive values are byte counts.
pub mod codes {
    /// Readiness wait elapsed without data
    pub const TIMEOUT: isize = 0;
    /// Hard error
    pub const ERROR: isize = -1;
    /// Stream closed by the peer
    pub const EOF: isize = -2;
}
