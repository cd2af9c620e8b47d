//! # vcp-bridge Page CDP
//!
//! Drives a real Chrome tab through the DevTools Protocol. The page is
//! captured into a [`vcp_bridge_page::MemoryDom`] for each pass, so the same
//! serializer and executor used in tests run against live pages.
//!
//! - [`CdpClient`] / [`PageSession`] - browser socket and per-tab sessions
//! - [`CdpPage`] - a tab as a [`vcp_bridge_protocols::BrowsingContext`]
//! - [`CdpHost`] - Chrome as a [`vcp_bridge_protocols::HostPlatform`]

pub mod cdp;
mod host;
mod page;
mod scripts;

#[cfg(test)]
mod testing;

pub use cdp::{CdpClient, CdpError, PageSession, DEFAULT_TIMEOUT};
pub use host::CdpHost;
pub use page::CdpPage;
pub use scripts::NOTIFY_BINDING;
