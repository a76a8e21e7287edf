// Transport control: shared timeout and abort token, plus the per-reply deadline.
// These replace process-wide mutable globals; every clone observes the same state.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Default readiness-wait timeout in seconds
pub const DEFAULT_TCP_TIMEOUT_SECS: u64 = 30;

/// Per-wait timeout applied to every readiness wait, in whole seconds.
/// Mutable at runtime by the owner; the transport only reads it.
#[derive(Debug, Clone)]
pub struct TcpTimeout {
    secs: Arc<AtomicU64>,
}

impl TcpTimeout {
    pub fn new(secs: u64) -> Self {
        TcpTimeout {
            secs: Arc::new(AtomicU64::new(secs)),
        }
    }

    pub fn secs(&self) -> u64 {
        self.secs.load(Ordering::Relaxed)
    }

    pub fn set_secs(&self, secs: u64) {
        self.secs.store(secs, Ordering::Relaxed);
    }

    pub fn get(&self) -> Duration {
        Duration::from_secs(self.secs())
    }
}

impl Default for TcpTimeout {
    fn default() -> Self {
        TcpTimeout::new(DEFAULT_TCP_TIMEOUT_SECS)
    }
}

/// Immediate-abort request for a blocked receive wait.
/// Raised from another thread or a signal handler (a plain atomic store).
#[derive(Debug, Clone, Default)]
pub struct AbortToken {
    raised: Arc<AtomicBool>,
}

impl AbortToken {
    pub fn new() -> Self {
        AbortToken::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.raised.store(false, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
struct DeadlineInner {
    fired: AtomicBool,
    until: Mutex<Option<Instant>>,
}

/// Deadline spanning every write of one logical reply.
///
/// Owned by whoever drives that reply (one per channel), never shared between
/// connections. Either fired asynchronously with [`ReplyDeadline::fire`]
/// (timer, signal, another thread) or armed with a budget. The send path
/// consumes it with [`ReplyDeadline::take_expired`], which clears it.
#[derive(Debug, Clone, Default)]
pub struct ReplyDeadline {
    inner: Arc<DeadlineInner>,
}

impl ReplyDeadline {
    pub fn new() -> Self {
        ReplyDeadline::default()
    }

    /// Mark the deadline as elapsed right now.
    pub fn fire(&self) {
        self.inner.fired.store(true, Ordering::SeqCst);
    }

    /// Start a budget; it expires `budget` from now.
    pub fn arm(&self, budget: Duration) {
        *self.until() = Some(Instant::now() + budget);
    }

    /// Drop any armed budget and any pending fired flag.
    pub fn disarm(&self) {
        *self.until() = None;
        self.inner.fired.store(false, Ordering::SeqCst);
    }

    pub fn is_expired(&self) -> bool {
        if self.inner.fired.load(Ordering::SeqCst) {
            return true;
        }
        matches!(*self.until(), Some(at) if Instant::now() >= at)
    }

    /// Read-and-clear: true if the deadline had expired.
    pub fn take_expired(&self) -> bool {
        if self.inner.fired.swap(false, Ordering::SeqCst) {
            return true;
        }
        let mut until = self.until();
        let expired = matches!(*until, Some(at) if Instant::now() >= at);
        if expired {
            *until = None;
        }
        expired
    }

    /// Time left on an armed budget, `None` when not armed.
    pub fn remaining(&self) -> Option<Duration> {
        let until = *self.until();
        until.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Shorten `timeout` to what is left of an armed budget.
    pub fn clamp(&self, timeout: Duration) -> Duration {
        match self.remaining() {
            Some(left) => timeout.min(left),
            None => timeout,
        }
    }

    fn until(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        self.inner.until.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Process-wide settings a transport consults on every call.
/// Reply deadlines are per operation and passed to the send path instead.
#[derive(Debug, Clone, Default)]
pub struct TransportControl {
    pub timeout: TcpTimeout,
    pub abort: AbortToken,
}

impl TransportControl {
    pub fn new(timeout_secs: u64) -> Self {
        TransportControl {
            timeout: TcpTimeout::new(timeout_secs),
            abort: AbortToken::new(),
        }
    }
}
