// Transport registration and the integer-code API the framing layer calls
use crate::config::TransportConfig;
use dis_buffer::{AuthCtx, ChanRegistry, RegistryError, SharedChan, TcpChan};
use dis_core::{codes, ConnHandle, ReplyDeadline, TransportControl};
use dis_transport::{result_code, ChanTransport, TcpTransport, TransportError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DisError {
    #[error("no transport registered")]
    NoTransport,
    #[error("no channel available for {0}")]
    NoChannel(ConnHandle),
    /// An earlier flush failed part way; the stream may hold a partial reply
    #[error("channel of {0} failed an earlier write")]
    ChanFailed(ConnHandle),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl DisError {
    pub fn code(&self) -> isize {
        match self {
            DisError::Transport(e) => e.code(),
            _ => codes::ERROR,
        }
    }
}

/// Registry, control flags and the active transport for one process (or test).
pub struct DisStack {
    registry: Arc<ChanRegistry>,
    control: TransportControl,
    reply_budget: Duration,
    transport: RwLock<Option<Arc<dyn ChanTransport>>>,
}

impl DisStack {
    pub fn new(config: &TransportConfig) -> Self {
        DisStack {
            registry: Arc::new(ChanRegistry::new()),
            control: TransportControl::new(config.timeout_secs),
            reply_budget: config.reply_budget(),
            transport: RwLock::new(None),
        }
    }

    pub fn registry(&self) -> &Arc<ChanRegistry> {
        &self.registry
    }

    pub fn control(&self) -> &TransportControl {
        &self.control
    }

    /// Replace the active transport. All operations switch together.
    pub fn register(&self, transport: Arc<dyn ChanTransport>) {
        *self.transport.write().unwrap_or_else(PoisonError::into_inner) = Some(transport);
    }

    /// TCP transport bound to this stack's registry and control flags
    pub fn tcp_transport(&self) -> TcpTransport {
        TcpTransport::new(self.registry.clone(), self.control.clone())
    }

    /// Make the TCP transport the active one
    pub fn use_tcp(&self) {
        self.register(Arc::new(self.tcp_transport()));
        debug!(timeout_secs = self.control.timeout.secs(), "tcp transport registered");
    }

    pub fn transport(&self) -> Result<Arc<dyn ChanTransport>, DisError> {
        self.transport
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(DisError::NoTransport)
    }

    /// Bytes read, or 0 (timeout), -1 (error), -2 (EOF)
    pub fn recv(&self, handle: ConnHandle, buf: &mut [u8]) -> isize {
        match self.transport() {
            Ok(t) => result_code(t.recv(handle, buf)),
            Err(e) => {
                warn!(%handle, error = %e, "recv without transport");
                e.code()
            }
        }
    }

    /// `data.len()`, or -1. Honours the reply deadline of the handle's
    /// channel, if it has one.
    pub fn send(&self, handle: ConnHandle, data: &[u8]) -> isize {
        let deadline = match self.registry.get_chan(handle) {
            Ok(Some(chan)) => Some(lock(&chan).reply_deadline.clone()),
            _ => None,
        };
        match self.transport() {
            Ok(t) => result_code(t.send_with_deadline(handle, data, deadline.as_ref())),
            Err(e) => {
                warn!(%handle, error = %e, "send without transport");
                e.code()
            }
        }
    }

    pub fn get_chan(&self, handle: ConnHandle) -> Option<SharedChan> {
        self.transport().ok()?.get_chan(handle)
    }

    pub fn set_chan(&self, handle: ConnHandle, chan: SharedChan) -> Result<(), DisError> {
        Ok(self.transport()?.set_chan(handle, chan)?)
    }

    pub fn free_extra(&self, extra: Option<AuthCtx>) {
        match self.transport() {
            Ok(t) => t.free_extra(extra),
            Err(_) => drop(extra),
        }
    }

    /// Detach the channel of `handle` and release its extra context
    pub fn destroy_chan(&self, handle: ConnHandle) {
        if let Some(chan) = self.registry.take_chan(handle) {
            let extra = lock(&chan).take_extra();
            self.free_extra(extra);
            debug!(%handle, "channel destroyed");
        }
    }

    /// One bounded receive of up to `max` bytes appended to the read buffer
    pub fn fill(&self, handle: ConnHandle, max: usize) -> Result<usize, DisError> {
        let transport = self.transport()?;
        let chan = transport.get_chan(handle).ok_or(DisError::NoChannel(handle))?;
        let mut scratch = vec![0u8; max];
        let n = transport.recv(handle, &mut scratch)?;
        lock(&chan).read_buf.append(&scratch[..n]);
        Ok(n)
    }

    /// Send everything pending in the write buffer with one bounded send.
    ///
    /// The pending bytes leave the buffer before the send starts. On failure
    /// the channel is marked failed: a prefix may already be on the wire, so
    /// it must not be resent and later flushes report [`DisError::ChanFailed`].
    pub fn flush(&self, handle: ConnHandle) -> Result<(), DisError> {
        let transport = self.transport()?;
        let chan = transport.get_chan(handle).ok_or(DisError::NoChannel(handle))?;
        let (pending, deadline) = {
            let mut chan = lock(&chan);
            if chan.is_failed() {
                return Err(DisError::ChanFailed(handle));
            }
            let pending = chan.write_buf.pending().to_vec();
            chan.write_buf.clear();
            (pending, chan.reply_deadline.clone())
        };
        if pending.is_empty() {
            return Ok(());
        }

        // no lock held while sending, so a timer can fire the deadline
        match transport.send_with_deadline(handle, &pending, Some(&deadline)) {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(%handle, error = %e, "flush failed, channel output dropped");
                lock(&chan).mark_failed();
                Err(e.into())
            }
        }
    }

    /// Flush a reply under one deadline covering all of its writes.
    /// The deadline belongs to the handle's channel, so concurrent replies on
    /// other connections neither see nor reset it.
    pub fn reply_write(&self, handle: ConnHandle) -> Result<(), DisError> {
        let transport = self.transport()?;
        let chan = transport.get_chan(handle).ok_or(DisError::NoChannel(handle))?;
        let deadline = lock(&chan).reply_deadline.clone();
        deadline.arm(self.reply_budget);
        let res = self.flush(handle);
        deadline.disarm();
        res
    }

    /// Reply deadline of the handle's channel, for timers that fire it
    pub fn reply_deadline(&self, handle: ConnHandle) -> Option<ReplyDeadline> {
        let chan = self.get_chan(handle)?;
        let deadline = lock(&chan).reply_deadline.clone();
        Some(deadline)
    }
}

impl Default for DisStack {
    fn default() -> Self {
        DisStack::new(&TransportConfig::default())
    }
}

fn lock(chan: &Mutex<TcpChan>) -> MutexGuard<'_, TcpChan> {
    chan.lock().unwrap_or_else(PoisonError::into_inner)
}
