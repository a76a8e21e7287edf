// Connection buffer module: per-connection channel state and the handle registry
pub mod chan;
pub mod registry;

pub use chan::*;
pub use registry::*;
