// client: probe helpers driving a DIS stack over real TCP connections
use crossbeam::channel::Receiver;
use dis_ng::{ConnHandle, DisError, DisStack, TransportError};
use std::net::TcpStream;
use std::os::fd::AsRawFd;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const RECV_CHUNK: usize = 64 * 1024;

/// Echo everything received on `stream` back to the peer until it closes.
/// Returns the number of bytes echoed. The stream should be non-blocking so
/// a stalled peer surfaces as backpressure instead of a hung write.
pub fn serve_conn(stack: &DisStack, stream: &TcpStream) -> Result<u64, DisError> {
    let handle = handle_of(stream);
    stack.registry().register(handle);

    let res = echo_loop(stack, handle);

    stack.destroy_chan(handle);
    stack.registry().unregister(handle);
    res
}

fn echo_loop(stack: &DisStack, handle: ConnHandle) -> Result<u64, DisError> {
    let mut echoed = 0u64;
    loop {
        match stack.fill(handle, RECV_CHUNK) {
            Ok(_) => {}
            Err(DisError::Transport(TransportError::Closed)) => {
                debug!(%handle, echoed, "peer closed");
                return Ok(echoed);
            }
            Err(DisError::Transport(TransportError::Timeout)) => {
                info!(%handle, "idle connection timed out, dropping");
                return Ok(echoed);
            }
            Err(e) => return Err(e),
        }

        let chan = stack.get_chan(handle).ok_or(DisError::NoChannel(handle))?;
        {
            let mut chan = chan.lock().unwrap_or_else(|p| p.into_inner());
            let request = chan.read_buf.pending().to_vec();
            chan.read_buf.clear();
            chan.write_buf.append(&request);
            echoed += request.len() as u64;
        }
        stack.reply_write(handle)?;
    }
}

/// Outcome of one ping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pong {
    pub rtt: Duration,
    pub echoed: Vec<u8>,
}

/// Send `payload` and read back as many bytes as were sent
pub fn ping(stack: &DisStack, stream: &TcpStream, payload: &[u8]) -> Result<Pong, DisError> {
    let handle = handle_of(stream);
    stack.registry().register(handle);
    let started = Instant::now();

    let res = round_trip(stack, handle, payload);

    stack.destroy_chan(handle);
    stack.registry().unregister(handle);
    res.map(|echoed| Pong {
        rtt: started.elapsed(),
        echoed,
    })
}

fn round_trip(stack: &DisStack, handle: ConnHandle, payload: &[u8]) -> Result<Vec<u8>, DisError> {
    let chan = stack.get_chan(handle).ok_or(DisError::NoChannel(handle))?;
    chan.lock()
        .unwrap_or_else(|p| p.into_inner())
        .write_buf
        .append(payload);
    stack.flush(handle)?;

    let mut received = 0;
    while received < payload.len() {
        received += stack.fill(handle, payload.len() - received)?;
    }

    let mut chan = chan.lock().unwrap_or_else(|p| p.into_inner());
    let echoed = chan.read_buf.pending().to_vec();
    chan.read_buf.clear();
    Ok(echoed)
}

/// Start `count` echo workers pulling accepted connections from `rx`
pub fn spawn_workers(stack: &'static DisStack, count: usize, rx: Receiver<TcpStream>) -> Vec<JoinHandle<()>> {
    (0..count)
        .map(|i| {
            let rx = rx.clone();
            thread::Builder::new()
                .name(format!("dis-echo-{}", i))
                .spawn(move || {
                    for stream in rx.iter() {
                        if let Err(e) = stream.set_nonblocking(true) {
                            warn!(worker = i, error = %e, "cannot make socket non-blocking");
                            continue;
                        }
                        match serve_conn(stack, &stream) {
                            Ok(bytes) => debug!(worker = i, bytes, "connection done"),
                            Err(e) => warn!(worker = i, error = %e, "connection failed"),
                        }
                    }
                })
                .unwrap_or_else(|e| panic!("failed to spawn echo worker {}: {}", i, e))
        })
        .collect()
}

fn handle_of(stream: &TcpStream) -> ConnHandle {
    ConnHandle(stream.as_raw_fd())
}
