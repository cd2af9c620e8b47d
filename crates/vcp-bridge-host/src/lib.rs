//! # vcp-bridge Host
//!
//! The privileged side of the bridge: owns the single WebSocket to the
//! automation server, routes inbound commands to the host or the active
//! page, and keeps the page observer pointed at whichever page is active.

pub mod connection;
pub mod router;
pub mod supervisor;

pub use connection::{ConnectionError, ConnectionManager, ConnectionSettings, ConnectionState};
pub use router::CommandRouter;
pub use supervisor::{Endpoint, Supervisor, SupervisorOptions};
