//! Error types for the vcp-bridge protocol layer.

mod host;
mod page;
mod protocol;

pub use host::*;
pub use page::*;
pub use protocol::*;
