//! # vcp-bridge Protocols
//!
//! Wire protocol and interface definitions shared by every vcp-bridge crate.
//! Contains message shapes, the closed command vocabulary, endpoint building
//! and the traits that connect the host context to a browsing context - no
//! implementations.
//!
//! ## Core Types
//!
//! - [`WireMessage`] - Every JSON frame exchanged with the automation server
//! - [`CommandEnvelope`] / [`CommandAction`] - Inbound commands, open and closed forms
//! - [`CommandResult`] - The single result emitted per `requestId`
//! - [`BrowsingContext`] - A page that can be serialized and driven
//! - [`HostPlatform`] - The privileged host (navigation, active page)

pub mod command;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod message;

pub use command::{CommandAction, CommandEnvelope, CommandResult, CommandStatus, PageCommand};
pub use context::{BrowsingContext, HostPlatform, PageEvent, PageOutcome, SharedPage};
pub use endpoint::{endpoint_url, normalize_url, Channel};
pub use error::{HostError, PageError, ProtocolError};
pub use message::{decode, encode, PageInfo, WireMessage};
