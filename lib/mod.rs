// lib: DIS transport library for the framing layer, probes, integration tests, etc.
// Wires the connection registry, control flags and the active transport together

// Re-export core types, channel state and transport abstractions
pub use dis_buffer::*;
pub use dis_core::*;
pub use dis_transport::*;

pub mod config;
pub mod stack;

pub use config::*;
pub use stack::*;

use once_cell::sync::Lazy;

// Process-wide stack, configured from the environment on first use
static DIS: Lazy<DisStack> = Lazy::new(|| DisStack::new(&TransportConfig::from_env()));

/// The process-wide stack. No transport is active until one is registered,
/// e.g. with [`dis_tcp_funcs`].
pub fn dis() -> &'static DisStack {
    &DIS
}

/// Register the TCP transport on the process-wide stack
pub fn dis_tcp_funcs() {
    dis().use_tcp();
}
