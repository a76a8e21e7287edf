// Transport abstraction - the operation set the framing layer calls polymorphically
use crate::error::TransportError;
use dis_buffer::{AuthCtx, RegistryError, SharedChan};
use dis_core::{ConnHandle, ReplyDeadline};

/// One concrete implementation is active at a time; the framing layer only
/// sees this interface.
pub trait ChanTransport: Send + Sync {
    /// Channel of `handle`, created on demand. `None` means no channel is
    /// available (e.g. the handle is not connected).
    fn get_chan(&self, handle: ConnHandle) -> Option<SharedChan>;

    fn set_chan(&self, handle: ConnHandle, chan: SharedChan) -> Result<(), RegistryError>;

    /// Release the extra context detached from a channel being torn down.
    fn free_extra(&self, extra: Option<AuthCtx>);

    /// One bounded read: `Ok(n)` with `1 <= n <= buf.len()`.
    fn recv(&self, handle: ConnHandle, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Write all of `data` or fail; `Ok` always carries `data.len()`.
    /// An expired `deadline` cuts short the next backpressure wait and is
    /// consumed by it.
    fn send_with_deadline(
        &self,
        handle: ConnHandle,
        data: &[u8],
        deadline: Option<&ReplyDeadline>,
    ) -> Result<usize, TransportError>;

    /// [`ChanTransport::send_with_deadline`] with no reply deadline
    fn send(&self, handle: ConnHandle, data: &[u8]) -> Result<usize, TransportError> {
        self.send_with_deadline(handle, data, None)
    }
}
