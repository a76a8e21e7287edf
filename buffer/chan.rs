// Channel state kept per connection for the framing layer
use dis_core::ReplyDeadline;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};

const DIS_BUF_INITIAL: usize = 4096;

/// Opaque extra context attached to a channel (usually the auth context)
pub type AuthCtx = Box<dyn Any + Send>;

/// Channel shared between the registry and its users
pub type SharedChan = Arc<Mutex<TcpChan>>;

/// Growable byte buffer with a consume cursor
#[derive(Debug, Clone)]
pub struct DisBuffer {
    data: Vec<u8>,
    pos: usize,
}

impl DisBuffer {
    pub fn new() -> Self {
        DisBuffer::with_capacity(DIS_BUF_INITIAL)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        DisBuffer {
            data: Vec::with_capacity(capacity),
            pos: 0,
        }
    }

    pub fn append(&mut self, bytes: &[u8]) {
        // Reclaim consumed space before growing
        if self.pos > 0 && self.data.len() + bytes.len() > self.data.capacity() {
            self.data.drain(..self.pos);
            self.pos = 0;
        }
        self.data.extend_from_slice(bytes);
    }

    /// Bytes not yet consumed
    pub fn pending(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Mark `n` pending bytes as consumed (clamped to what is pending)
    pub fn consume(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.data.len());
        if self.pos == self.data.len() {
            self.clear();
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.pos = 0;
    }

    pub fn len(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DisBuffer {
    fn default() -> Self {
        DisBuffer::new()
    }
}

/// Per-connection channel: read/write accumulation, the deadline of the reply
/// being written, and an optional extra context
#[derive(Default)]
pub struct TcpChan {
    pub read_buf: DisBuffer,
    pub write_buf: DisBuffer,
    pub reply_deadline: ReplyDeadline,
    pub extra: Option<AuthCtx>,
    failed: bool,
}

impl TcpChan {
    pub fn new() -> Self {
        TcpChan::default()
    }

    pub fn shared(self) -> SharedChan {
        Arc::new(Mutex::new(self))
    }

    /// Drop pending output after a failed write. The peer may already hold a
    /// prefix of it, so the channel carries no more output afterwards.
    pub fn mark_failed(&mut self) {
        self.write_buf.clear();
        self.failed = true;
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Detach the extra context, leaving `None` behind
    pub fn take_extra(&mut self) -> Option<AuthCtx> {
        self.extra.take()
    }
}

impl fmt::Debug for TcpChan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TcpChan")
            .field("read_pending", &self.read_buf.len())
            .field("write_pending", &self.write_buf.len())
            .field("has_extra", &self.extra.is_some())
            .field("failed", &self.failed)
            .finish()
    }
}
