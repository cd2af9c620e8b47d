//! Cross-context interfaces.
//!
//! The host context (socket owner, router) and browsing contexts (pages) only
//! talk through these traits and asynchronous messages. A page announces
//! changes through [`PageEvent`]s; how fast those are turned into snapshots is
//! the subscriber's policy.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, watch};

use crate::command::PageCommand;
use crate::error::{HostError, PageError};

/// Shared handle to a browsing context.
pub type SharedPage = Arc<dyn BrowsingContext>;

/// Change notifications emitted by a browsing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageEvent {
    /// A batch of DOM mutations (children, attributes, character data).
    Mutation,
    /// The user clicked or moved focus.
    Interaction,
    /// The page finished loading.
    Load,
    /// The page became visible again.
    Visible,
    /// Someone explicitly asked for a fresh snapshot.
    Refresh,
    /// A navigation started; previously transmitted state is stale.
    NavigationStarted,
    /// A command finished executing in the page.
    ActionCompleted,
}

/// Successful page command outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct PageOutcome {
    pub message: String,
    pub result: Option<Value>,
}

impl PageOutcome {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            result: None,
        }
    }
}

/// A page that can be serialized and driven.
#[async_trait]
pub trait BrowsingContext: Send + Sync {
    /// Stable identifier of this context (tab/target id).
    fn id(&self) -> &str;

    /// Run a full serialization pass, re-stamping element references.
    async fn serialize(&self) -> Result<String, PageError>;

    /// Execute an action against the page.
    async fn execute(&self, command: PageCommand) -> Result<PageOutcome, PageError>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<PageEvent>;
}

/// The privileged host: navigation and the currently focused page.
#[async_trait]
pub trait HostPlatform: Send + Sync {
    /// Open a new page at `url` and make it the active page.
    async fn open_url(&self, url: &str) -> Result<(), HostError>;

    /// Watch the active page; `None` while no page is attached.
    fn watch_active_page(&self) -> watch::Receiver<Option<SharedPage>>;

    fn active_page(&self) -> Option<SharedPage> {
        let rx = self.watch_active_page();
        let page = rx.borrow().clone();
        page
    }
}
