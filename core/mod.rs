// Core module: connection handles, result codes and transport control flags (NO I/O)
pub mod types;
pub mod control;

pub use types::*;
pub use control::*;
