// Connection registry: which handles are open, and which channel each one owns
use crate::chan::{SharedChan, TcpChan};
use dis_core::ConnHandle;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The handle is not a registered, connected socket (ENOTCONN)
    #[error("{0} is not connected")]
    NotConnected(ConnHandle),
}

/// Handle table. A registered handle maps to `None` until its channel is set up.
#[derive(Debug, Default)]
pub struct ChanRegistry {
    conns: Mutex<HashMap<ConnHandle, Option<SharedChan>>>,
}

impl ChanRegistry {
    pub fn new() -> Self {
        ChanRegistry::default()
    }

    /// Record `handle` as an open connection without a channel yet
    pub fn register(&self, handle: ConnHandle) {
        self.conns().entry(handle).or_insert(None);
    }

    /// Forget `handle`, returning its channel if one was attached
    pub fn unregister(&self, handle: ConnHandle) -> Option<SharedChan> {
        self.conns().remove(&handle).flatten()
    }

    pub fn is_registered(&self, handle: ConnHandle) -> bool {
        self.conns().contains_key(&handle)
    }

    /// Channel of `handle`; `Ok(None)` when connected but not set up yet
    pub fn get_chan(&self, handle: ConnHandle) -> Result<Option<SharedChan>, RegistryError> {
        match self.conns().get(&handle) {
            Some(slot) => Ok(slot.clone()),
            None => Err(RegistryError::NotConnected(handle)),
        }
    }

    /// Associate `chan` with `handle`, replacing any previous channel
    pub fn set_chan(&self, handle: ConnHandle, chan: SharedChan) -> Result<(), RegistryError> {
        match self.conns().get_mut(&handle) {
            Some(slot) => {
                *slot = Some(chan);
                Ok(())
            }
            None => Err(RegistryError::NotConnected(handle)),
        }
    }

    /// Allocate a fresh channel for `handle` and install it
    pub fn setup_chan(&self, handle: ConnHandle) -> Result<SharedChan, RegistryError> {
        let chan = TcpChan::new().shared();
        self.set_chan(handle, chan.clone())?;
        debug!(%handle, "channel set up");
        Ok(chan)
    }

    /// Detach the channel of `handle`, keeping the handle registered
    pub fn take_chan(&self, handle: ConnHandle) -> Option<SharedChan> {
        self.conns().get_mut(&handle).and_then(Option::take)
    }

    pub fn len(&self) -> usize {
        self.conns().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn conns(&self) -> MutexGuard<'_, HashMap<ConnHandle, Option<SharedChan>>> {
        self.conns.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
