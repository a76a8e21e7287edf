// Transport module: bounded socket I/O behind a swappable channel transport interface
pub mod error;
pub mod sys;
pub mod traits;
pub mod tcp;

pub use error::*;
pub use sys::*;
pub use traits::*;
pub use tcp::*;
