//! Chrome DevTools Protocol (CDP) client.
//!
//! Connects to Chrome/Chromium started with remote debugging:
//!
//! ```bash
//! chrome --remote-debugging-port=9222
//! ```
//!
//! ```rust,ignore
//! let client = CdpClient::connect("http://localhost:9222", DEFAULT_TIMEOUT).await?;
//! let target = client.create_target("https://example.com").await?;
//! let session = client.attach(&target).await?;
//! let title = session.evaluate("document.title").await?;
//! ```

mod client;
mod error;
mod protocol;
mod session;

pub use client::{CdpClient, DEFAULT_TIMEOUT};
pub use error::CdpError;
pub use protocol::*;
pub use session::PageSession;
