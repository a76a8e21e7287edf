// TCP transport implementation: bounded receive, send driven to completion
use crate::error::TransportError;
use crate::sys::{SocketIo, SysSocketIo};
use crate::traits::ChanTransport;
use dis_buffer::{AuthCtx, ChanRegistry, RegistryError, SharedChan};
use dis_core::{ConnHandle, Interest, ReplyDeadline, TransportControl};
use nix::errno::Errno;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Teardown routine for auth contexts attached to channels
pub type AuthDestroyFn = Arc<dyn Fn(AuthCtx) + Send + Sync>;

/// Stream-socket transport.
///
/// Every readiness wait is bounded by the control's timeout. Receives may be
/// cut short by its abort token, and backpressure waits by the reply deadline
/// the caller passes to [`ChanTransport::send_with_deadline`].
pub struct TcpTransport<I = SysSocketIo> {
    io: I,
    registry: Arc<ChanRegistry>,
    control: TransportControl,
    auth_destroy: Option<AuthDestroyFn>,
}

impl TcpTransport<SysSocketIo> {
    pub fn new(registry: Arc<ChanRegistry>, control: TransportControl) -> Self {
        TcpTransport::with_io(SysSocketIo, registry, control)
    }
}

impl<I: SocketIo> TcpTransport<I> {
    pub fn with_io(io: I, registry: Arc<ChanRegistry>, control: TransportControl) -> Self {
        TcpTransport {
            io,
            registry,
            control,
            auth_destroy: None,
        }
    }

    /// Install the routine `free_extra` hands auth contexts to
    pub fn with_auth_destroy(mut self, destroy: AuthDestroyFn) -> Self {
        self.auth_destroy = Some(destroy);
        self
    }

    pub fn control(&self) -> &TransportControl {
        &self.control
    }

    pub fn registry(&self) -> &Arc<ChanRegistry> {
        &self.registry
    }

    // Wait for input. EINTR is retried unless an abort was requested meanwhile,
    // in which case the raw outcome is kept.
    fn wait_readable(&self, handle: ConnHandle) -> Result<(), TransportError> {
        let timeout = self.control.timeout.get();
        let outcome = loop {
            let res = self.io.wait(handle, Interest::Read, timeout);
            if self.control.abort.is_raised() {
                break res;
            }
            match res {
                Err(Errno::EINTR) => trace!(%handle, "read wait interrupted, retrying"),
                other => break other,
            }
        };

        match outcome {
            Ok(true) => Ok(()),
            Ok(false) => Err(TransportError::Timeout),
            Err(Errno::EINTR) => {
                debug!(%handle, "read wait aborted");
                Err(TransportError::Aborted)
            }
            Err(e) => Err(TransportError::Wait(e)),
        }
    }

    // Backpressure wait. An already expired reply deadline counts as a timeout
    // without polling, and is consumed.
    fn wait_writable(
        &self,
        handle: ConnHandle,
        deadline: Option<&ReplyDeadline>,
    ) -> Result<(), TransportError> {
        let outcome = loop {
            let res = if deadline.is_some_and(ReplyDeadline::take_expired) {
                debug!(%handle, "reply deadline elapsed, skipping write wait");
                Ok(false)
            } else {
                let timeout = self.control.timeout.get();
                let timeout = deadline.map_or(timeout, |d| d.clamp(timeout));
                self.io.wait(handle, Interest::Write, timeout)
            };
            match res {
                Err(Errno::EINTR) => trace!(%handle, "write wait interrupted, retrying"),
                other => break other,
            }
        };

        match outcome {
            Ok(true) => Ok(()),
            Ok(false) => {
                if let Some(deadline) = deadline {
                    // a budget that ran out during the wait is spent too
                    deadline.take_expired();
                }
                warn!(%handle, "socket never became writable");
                Err(TransportError::Backpressure)
            }
            Err(e) => {
                warn!(%handle, error = %e, "write wait failed");
                Err(TransportError::Wait(e))
            }
        }
    }
}

impl<I: SocketIo> ChanTransport for TcpTransport<I> {
    fn get_chan(&self, handle: ConnHandle) -> Option<SharedChan> {
        match self.registry.get_chan(handle) {
            Ok(Some(chan)) => Some(chan),
            Ok(None) => self.registry.setup_chan(handle).ok(),
            Err(RegistryError::NotConnected(_)) => None,
        }
    }

    fn set_chan(&self, handle: ConnHandle, chan: SharedChan) -> Result<(), RegistryError> {
        self.registry.set_chan(handle, chan)
    }

    fn free_extra(&self, extra: Option<AuthCtx>) {
        if let (Some(extra), Some(destroy)) = (extra, self.auth_destroy.as_ref()) {
            destroy(extra);
        }
    }

    fn recv(&self, handle: ConnHandle, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.wait_readable(handle)?;

        let read = loop {
            match self.io.read(handle, buf) {
                Err(Errno::EINTR) => trace!(%handle, "read interrupted, retrying"),
                other => break other,
            }
        };

        match read {
            // zero bytes from a ready stream socket means the peer shut down
            Ok(0) => Err(TransportError::Closed),
            Ok(n) => Ok(n),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    fn send_with_deadline(
        &self,
        handle: ConnHandle,
        data: &[u8],
        deadline: Option<&ReplyDeadline>,
    ) -> Result<usize, TransportError> {
        let mut rest = data;
        while !rest.is_empty() {
            match self.io.write(handle, rest) {
                Ok(0) => {
                    warn!(%handle, remaining = rest.len(), "socket accepted zero bytes");
                    return Err(TransportError::WriteZero);
                }
                Ok(n) => rest = &rest[n.min(rest.len())..],
                Err(Errno::EINTR) => trace!(%handle, "write interrupted, retrying"),
                Err(e) if e == Errno::EAGAIN || e == Errno::EWOULDBLOCK => {
                    trace!(%handle, remaining = rest.len(), "send buffer full, waiting");
                    self.wait_writable(handle, deadline)?;
                }
                Err(e) => {
                    warn!(%handle, error = %e, "fatal write error, aborting output");
                    return Err(TransportError::Io(e));
                }
            }
        }
        Ok(data.len())
    }
}

impl<I: fmt::Debug> fmt::Debug for TcpTransport<I> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TcpTransport")
            .field("io", &self.io)
            .field("timeout_secs", &self.control.timeout.secs())
            .field("auth_destroy", &self.auth_destroy.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::socket::{setsockopt, sockopt};
    use std::collections::VecDeque;
    use std::io::{Read, Write};
    use std::net::{Shutdown, TcpListener, TcpStream};
    use std::os::fd::AsRawFd;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::thread;
    use std::time::{Duration, Instant};

    const H: ConnHandle = ConnHandle(42);

    enum WriteStep {
        Accept(usize),
        Fail(Errno),
    }

    #[derive(Default)]
    struct Script {
        waits: VecDeque<nix::Result<bool>>,
        reads: VecDeque<nix::Result<Vec<u8>>>,
        writes: VecDeque<WriteStep>,
        wire: Vec<u8>,
        wait_calls: Vec<(Interest, Duration)>,
        read_calls: usize,
        write_calls: usize,
    }

    // Replays queued outcomes; empty queues mean ready / EOF / accept everything
    #[derive(Default)]
    struct ScriptedIo {
        script: Mutex<Script>,
        on_wait: Option<Box<dyn Fn() + Send + Sync>>,
    }

    impl ScriptedIo {
        fn script(&self) -> std::sync::MutexGuard<'_, Script> {
            self.script.lock().unwrap()
        }
    }

    impl SocketIo for ScriptedIo {
        fn wait(&self, _: ConnHandle, interest: Interest, timeout: Duration) -> nix::Result<bool> {
            if let Some(hook) = &self.on_wait {
                hook();
            }
            let mut s = self.script();
            s.wait_calls.push((interest, timeout));
            s.waits.pop_front().unwrap_or(Ok(true))
        }

        fn read(&self, _: ConnHandle, buf: &mut [u8]) -> nix::Result<usize> {
            let mut s = self.script();
            s.read_calls += 1;
            match s.reads.pop_front() {
                Some(Ok(bytes)) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }

        fn write(&self, _: ConnHandle, buf: &[u8]) -> nix::Result<usize> {
            let mut s = self.script();
            s.write_calls += 1;
            let n = match s.writes.pop_front() {
                Some(WriteStep::Accept(n)) => n.min(buf.len()),
                Some(WriteStep::Fail(e)) => return Err(e),
                None => buf.len(),
            };
            s.wire.extend_from_slice(&buf[..n]);
            Ok(n)
        }
    }

    fn scripted(io: ScriptedIo) -> TcpTransport<ScriptedIo> {
        TcpTransport::with_io(io, Arc::new(ChanRegistry::new()), TransportControl::new(7))
    }

    fn tcp_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    fn real(timeout_secs: u64) -> TcpTransport {
        TcpTransport::new(Arc::new(ChanRegistry::new()), TransportControl::new(timeout_secs))
    }

    // ---- send ----

    #[test]
    fn partial_writes_are_driven_to_completion() {
        let io = ScriptedIo::default();
        io.script().writes.extend([WriteStep::Accept(4), WriteStep::Accept(4), WriteStep::Accept(2)]);
        let t = scripted(io);

        assert_eq!(t.send(H, b"0123456789"), Ok(10));
        let s = t.io.script();
        assert_eq!(s.wire, b"0123456789");
        assert_eq!(s.write_calls, 3);
    }

    #[test]
    fn hello_over_two_byte_writes() {
        let io = ScriptedIo::default();
        io.script().writes.extend([WriteStep::Accept(2), WriteStep::Accept(2), WriteStep::Accept(2)]);
        let t = scripted(io);

        assert_eq!(t.send(H, b"HELLO"), Ok(5));
        let s = t.io.script();
        assert_eq!(s.wire, b"HELLO");
        assert_eq!(s.write_calls, 3);
    }

    #[test]
    fn interrupted_write_is_retried() {
        let io = ScriptedIo::default();
        io.script().writes.extend([WriteStep::Fail(Errno::EINTR), WriteStep::Accept(3)]);
        let t = scripted(io);

        assert_eq!(t.send(H, b"abc"), Ok(3));
        assert_eq!(t.io.script().write_calls, 2);
        assert!(t.io.script().wait_calls.is_empty());
    }

    #[test]
    fn would_block_waits_then_resumes_at_same_offset() {
        let io = ScriptedIo::default();
        io.script().writes.extend([
            WriteStep::Accept(2),
            WriteStep::Fail(Errno::EAGAIN),
            WriteStep::Accept(1),
            WriteStep::Fail(Errno::EAGAIN),
        ]);
        io.script().waits.extend([Ok(true), Err(Errno::EINTR), Ok(true)]);
        let t = scripted(io);

        assert_eq!(t.send(H, b"abcdef"), Ok(6));
        let s = t.io.script();
        assert_eq!(s.wire, b"abcdef");
        assert_eq!(s.wait_calls.len(), 3);
        assert!(s
            .wait_calls
            .iter()
            .all(|&(interest, timeout)| interest == Interest::Write && timeout == Duration::from_secs(7)));
    }

    #[test]
    fn backpressure_timeout_fails_without_duplicating_prefix() {
        let io = ScriptedIo::default();
        io.script().writes.extend([WriteStep::Accept(3), WriteStep::Fail(Errno::EAGAIN)]);
        io.script().waits.push_back(Ok(false));
        let t = scripted(io);

        let err = t.send(H, b"abcdef").unwrap_err();
        assert_eq!(err, TransportError::Backpressure);
        assert_eq!(err.code(), -1);
        assert_eq!(err.errno(), Some(Errno::EAGAIN));
        assert_eq!(t.io.script().wire, b"abc");
    }

    #[test]
    fn backpressure_wait_error_is_fatal() {
        let io = ScriptedIo::default();
        io.script().writes.push_back(WriteStep::Fail(Errno::EAGAIN));
        io.script().waits.push_back(Err(Errno::EBADF));
        let t = scripted(io);

        assert_eq!(t.send(H, b"x"), Err(TransportError::Wait(Errno::EBADF)));
    }

    #[test]
    fn fired_deadline_skips_the_os_wait_and_is_cleared() {
        let io = ScriptedIo::default();
        io.script().writes.extend([WriteStep::Accept(1), WriteStep::Fail(Errno::EAGAIN)]);
        let t = scripted(io);
        let deadline = ReplyDeadline::new();
        deadline.fire();

        assert_eq!(
            t.send_with_deadline(H, b"xyz", Some(&deadline)),
            Err(TransportError::Backpressure)
        );
        assert!(t.io.script().wait_calls.is_empty());
        assert!(!deadline.is_expired());
    }

    #[test]
    fn plain_send_ignores_other_reply_deadlines() {
        let io = ScriptedIo::default();
        io.script().writes.extend([WriteStep::Fail(Errno::EAGAIN), WriteStep::Accept(2)]);
        let t = scripted(io);
        let elsewhere = ReplyDeadline::new();
        elsewhere.fire();

        assert_eq!(t.send(H, b"ok"), Ok(2));
        assert_eq!(t.io.script().wait_calls.len(), 1);
        assert!(elsewhere.is_expired());
    }

    #[test]
    fn armed_deadline_clamps_the_write_wait() {
        let io = ScriptedIo::default();
        io.script().writes.push_back(WriteStep::Fail(Errno::EAGAIN));
        let t = scripted(io);
        let deadline = ReplyDeadline::new();
        deadline.arm(Duration::from_secs(2));

        assert_eq!(t.send_with_deadline(H, b"z", Some(&deadline)), Ok(1));
        let s = t.io.script();
        assert_eq!(s.wait_calls.len(), 1);
        assert!(s.wait_calls[0].1 <= Duration::from_secs(2));
    }

    #[test]
    fn other_write_errors_abort_immediately() {
        let io = ScriptedIo::default();
        io.script().writes.extend([WriteStep::Accept(1), WriteStep::Fail(Errno::EPIPE)]);
        let t = scripted(io);

        assert_eq!(t.send(H, b"abc"), Err(TransportError::Io(Errno::EPIPE)));
        let s = t.io.script();
        assert_eq!(s.write_calls, 2);
        assert!(s.wait_calls.is_empty());
    }

    #[test]
    fn zero_byte_write_is_an_error_not_a_spin() {
        let io = ScriptedIo::default();
        io.script().writes.push_back(WriteStep::Accept(0));
        let t = scripted(io);

        assert_eq!(t.send(H, b"abc"), Err(TransportError::WriteZero));
    }

    #[test]
    fn empty_send_succeeds_without_io() {
        let t = scripted(ScriptedIo::default());
        assert_eq!(t.send(H, b""), Ok(0));
        assert_eq!(t.io.script().write_calls, 0);
    }

    // ---- recv ----

    #[test]
    fn recv_returns_one_read_worth_of_data() {
        let io = ScriptedIo::default();
        io.script().reads.extend([Ok(b"abc".to_vec()), Ok(b"def".to_vec())]);
        let t = scripted(io);

        let mut buf = [0u8; 10];
        assert_eq!(t.recv(H, &mut buf), Ok(3));
        assert_eq!(&buf[..3], b"abc");
        let s = t.io.script();
        assert_eq!(s.read_calls, 1);
        assert_eq!(s.wait_calls, vec![(Interest::Read, Duration::from_secs(7))]);
    }

    #[test]
    fn recv_timeout_and_wait_error() {
        let io = ScriptedIo::default();
        io.script().waits.extend([Ok(false), Err(Errno::EBADF)]);
        let t = scripted(io);
        let mut buf = [0u8; 4];

        let timed_out = t.recv(H, &mut buf).unwrap_err();
        assert_eq!(timed_out, TransportError::Timeout);
        assert!(timed_out.code() <= 0);
        assert_eq!(t.recv(H, &mut buf), Err(TransportError::Wait(Errno::EBADF)));
        assert_eq!(t.io.script().read_calls, 0);
    }

    #[test]
    fn recv_wait_interrupt_is_retried() {
        let io = ScriptedIo::default();
        io.script().waits.extend([Err(Errno::EINTR), Err(Errno::EINTR), Ok(true)]);
        io.script().reads.push_back(Ok(b"ok".to_vec()));
        let t = scripted(io);

        let mut buf = [0u8; 4];
        assert_eq!(t.recv(H, &mut buf), Ok(2));
        assert_eq!(t.io.script().wait_calls.len(), 3);
    }

    #[test]
    fn abort_keeps_the_interrupted_wait_result() {
        let control = TransportControl::new(7);
        let abort = control.abort.clone();
        let io = ScriptedIo {
            on_wait: Some(Box::new(move || abort.raise())),
            ..ScriptedIo::default()
        };
        io.script().waits.extend([Err(Errno::EINTR), Ok(true)]);
        let t = TcpTransport::with_io(io, Arc::new(ChanRegistry::new()), control);

        let mut buf = [0u8; 4];
        let err = t.recv(H, &mut buf).unwrap_err();
        assert_eq!(err, TransportError::Aborted);
        assert_eq!(err.code(), -1);
        let s = t.io.script();
        assert_eq!(s.wait_calls.len(), 1);
        assert_eq!(s.read_calls, 0);
    }

    #[test]
    fn abort_does_not_discard_a_ready_wait() {
        let io = ScriptedIo::default();
        io.script().reads.push_back(Ok(b"late".to_vec()));
        let t = scripted(io);
        t.control().abort.raise();

        let mut buf = [0u8; 8];
        assert_eq!(t.recv(H, &mut buf), Ok(4));
    }

    #[test]
    fn interrupted_read_retries_the_read_only() {
        let io = ScriptedIo::default();
        io.script().reads.extend([Err(Errno::EINTR), Ok(b"xy".to_vec())]);
        let t = scripted(io);

        let mut buf = [0u8; 4];
        assert_eq!(t.recv(H, &mut buf), Ok(2));
        let s = t.io.script();
        assert_eq!(s.read_calls, 2);
        assert_eq!(s.wait_calls.len(), 1);
    }

    #[test]
    fn read_failures_and_eof_are_classified() {
        let io = ScriptedIo::default();
        io.script().reads.extend([Err(Errno::ECONNRESET), Ok(Vec::new())]);
        let t = scripted(io);

        let mut buf = [0u8; 4];
        assert_eq!(t.recv(H, &mut buf), Err(TransportError::Io(Errno::ECONNRESET)));
        let eof = t.recv(H, &mut buf).unwrap_err();
        assert_eq!(eof, TransportError::Closed);
        assert_eq!(eof.code(), -2);
    }

    // ---- channel accessor / cleanup ----

    #[test]
    fn get_chan_creates_once_for_connected_handles() {
        let t = scripted(ScriptedIo::default());
        assert!(t.get_chan(H).is_none());
        assert!(t.registry().is_empty());

        t.registry().register(H);
        let first = t.get_chan(H).unwrap();
        let second = t.get_chan(H).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn set_chan_delegates_to_registry() {
        let t = scripted(ScriptedIo::default());
        let chan = dis_buffer::TcpChan::new().shared();
        assert!(t.set_chan(H, chan.clone()).is_err());

        t.registry().register(H);
        t.set_chan(H, chan.clone()).unwrap();
        assert!(Arc::ptr_eq(&t.get_chan(H).unwrap(), &chan));
    }

    #[test]
    fn free_extra_calls_destroy_only_with_context() {
        let destroyed = Arc::new(AtomicUsize::new(0));
        let counter = destroyed.clone();
        let t = scripted(ScriptedIo::default()).with_auth_destroy(Arc::new(move |ctx: AuthCtx| {
            assert_eq!(ctx.downcast_ref::<&str>(), Some(&"krb"));
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        t.free_extra(None);
        assert_eq!(destroyed.load(Ordering::SeqCst), 0);
        t.free_extra(Some(Box::new("krb")));
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);

        // no routine configured: the context is just dropped
        scripted(ScriptedIo::default()).free_extra(Some(Box::new(1u8)));
    }

    // ---- real sockets ----

    #[test]
    fn loopback_hello_reaches_peer() {
        let (client, mut server) = tcp_pair();
        let t = real(5);

        assert_eq!(t.send(ConnHandle(client.as_raw_fd()), b"HELLO"), Ok(5));
        drop(client);
        let mut got = Vec::new();
        server.read_to_end(&mut got).unwrap();
        assert_eq!(got, b"HELLO");
    }

    #[test]
    fn loopback_recv_data_then_eof() {
        let (mut client, server) = tcp_pair();
        let t = real(5);
        let handle = ConnHandle(server.as_raw_fd());

        client.write_all(b"abc").unwrap();
        client.shutdown(Shutdown::Write).unwrap();

        let mut buf = [0u8; 10];
        let n = t.recv(handle, &mut buf).unwrap();
        assert!((1..=3).contains(&n));
        assert_eq!(&buf[..n], &b"abc"[..n]);
        let mut total = n;
        while total < 3 {
            total += t.recv(handle, &mut buf[total..]).unwrap();
        }
        assert_eq!(&buf[..3], b"abc");
        assert_eq!(t.recv(handle, &mut buf), Err(TransportError::Closed));
    }

    #[test]
    fn loopback_closed_peer_gives_eof_code() {
        let (client, server) = tcp_pair();
        drop(client);
        let t = real(5);

        let mut buf = [0u8; 10];
        let res = t.recv(ConnHandle(server.as_raw_fd()), &mut buf);
        assert_eq!(crate::error::result_code(res), -2);
    }

    #[test]
    fn loopback_recv_times_out_without_data() {
        let (_client, server) = tcp_pair();
        let t = real(0);

        let mut buf = [0u8; 10];
        let res = t.recv(ConnHandle(server.as_raw_fd()), &mut buf);
        assert_eq!(res, Err(TransportError::Timeout));
        assert!(crate::error::result_code(res) <= 0);
    }

    #[test]
    fn loopback_large_send_arrives_in_order() {
        let (client, mut server) = tcp_pair();
        client.set_nonblocking(true).unwrap();
        setsockopt(&client, sockopt::SndBuf, &4096).unwrap();
        let payload: Vec<u8> = (0..2_000_000u32).map(|i| (i % 251) as u8).collect();

        let reader = thread::spawn(move || {
            let mut got = Vec::new();
            server.read_to_end(&mut got).unwrap();
            got
        });

        let t = real(10);
        assert_eq!(t.send(ConnHandle(client.as_raw_fd()), &payload), Ok(payload.len()));
        drop(client);
        assert_eq!(reader.join().unwrap(), payload);
    }

    #[test]
    fn loopback_stalled_peer_hits_backpressure() {
        let (client, mut server) = tcp_pair();
        client.set_nonblocking(true).unwrap();
        setsockopt(&client, sockopt::SndBuf, &4096).unwrap();
        setsockopt(&server, sockopt::RcvBuf, &4096).unwrap();
        let payload: Vec<u8> = (0..32_000_000u32).map(|i| (i % 251) as u8).collect();

        let t = real(0);
        let res = t.send(ConnHandle(client.as_raw_fd()), &payload);
        assert_eq!(res, Err(TransportError::Backpressure));
        drop(client);

        let mut got = Vec::new();
        server.read_to_end(&mut got).unwrap();
        assert!(!got.is_empty() && got.len() < payload.len());
        assert_eq!(got, payload[..got.len()]);
    }

    #[test]
    fn fired_deadline_returns_before_the_timeout() {
        let (client, _server) = tcp_pair();
        client.set_nonblocking(true).unwrap();
        setsockopt(&client, sockopt::SndBuf, &4096).unwrap();
        let payload = vec![7u8; 32_000_000];

        let t = real(30);
        let deadline = ReplyDeadline::new();
        deadline.fire();
        let started = Instant::now();
        assert_eq!(
            t.send_with_deadline(ConnHandle(client.as_raw_fd()), &payload, Some(&deadline)),
            Err(TransportError::Backpressure)
        );
        assert!(started.elapsed() < Duration::from_secs(30));
    }
}
