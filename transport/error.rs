// Transport error classification and its integer-code mapping
use dis_core::codes;
use nix::errno::Errno;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Readiness wait elapsed with no event
    #[error("readiness wait timed out")]
    Timeout,
    /// The readiness wait itself failed
    #[error("readiness wait failed: {0}")]
    Wait(Errno),
    /// Receive wait interrupted while an abort was requested
    #[error("readiness wait aborted")]
    Aborted,
    /// Peer closed the stream
    #[error("stream closed by peer")]
    Closed,
    /// Socket stayed full past the deadline
    #[error("send backpressure did not clear before the deadline")]
    Backpressure,
    #[error("socket I/O failed: {0}")]
    Io(Errno),
    #[error("socket accepted zero bytes")]
    WriteZero,
}

impl TransportError {
    /// Integer code handed to the framing layer
    pub fn code(&self) -> isize {
        match self {
            TransportError::Timeout => codes::TIMEOUT,
            TransportError::Closed => codes::EOF,
            _ => codes::ERROR,
        }
    }

    /// OS error behind the failure, if any
    pub fn errno(&self) -> Option<Errno> {
        match self {
            TransportError::Wait(e) | TransportError::Io(e) => Some(*e),
            TransportError::Backpressure => Some(Errno::EAGAIN),
            TransportError::Aborted => Some(Errno::EINTR),
            _ => None,
        }
    }
}

/// Collapse a typed result into the byte-count-or-code convention
pub fn result_code(result: Result<usize, TransportError>) -> isize {
    match result {
        Ok(n) => isize::try_from(n).unwrap_or(isize::MAX),
        Err(e) => e.code(),
    }
}
