//! A live Chrome tab as a [`BrowsingContext`].
//!
//! Each pass captures the page into a [`MemoryDom`], runs the shared
//! serializer or executor against it with the edit journal on, then replays
//! the journal in the page with one script call.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use vcp_bridge_page::{DomEdit, DomSnapshot, InteractionExecutor, MemoryDom, PageSerializer};
use vcp_bridge_protocols::{BrowsingContext, PageCommand, PageError, PageEvent, PageOutcome};

use crate::cdp::{CdpError, CdpEvent, PageSession};
use crate::scripts::{self, NOTIFY_BINDING};

const EVENT_CAPACITY: usize = 64;

pub struct CdpPage {
    session: Arc<PageSession>,
    serializer: PageSerializer,
    executor: InteractionExecutor,
    events: broadcast::Sender<PageEvent>,
    /// One capture/replay pass at a time; `__vcpNodes` belongs to the
    /// latest capture.
    pass: Mutex<()>,
    pump: Option<JoinHandle<()>>,
}

impl CdpPage {
    /// Install change detection on the session and start forwarding events.
    pub async fn attach(session: PageSession) -> Result<Self, CdpError> {
        session.add_binding(NOTIFY_BINDING).await?;
        session.add_script_on_new_document(scripts::OBSERVER).await?;
        if let Err(e) = session.evaluate(scripts::OBSERVER).await {
            // The next document still gets it.
            warn!("Could not install observer in current document: {}", e);
        }

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let pump = session
            .take_events()
            .map(|rx| tokio::spawn(forward_events(rx, events.clone())));

        debug!("Attached to page {}", session.target_id());
        Ok(Self {
            session: Arc::new(session),
            serializer: PageSerializer::new(),
            executor: InteractionExecutor::new(),
            events,
            pass: Mutex::new(()),
            pump,
        })
    }

    pub fn session(&self) -> &PageSession {
        &self.session
    }

    /// Stop forwarding events and release the target.
    pub async fn detach(&self) {
        if let Some(pump) = &self.pump {
            pump.abort();
        }
        self.session.detach().await;
    }

    async fn capture(&self) -> Result<MemoryDom, CdpError> {
        let value = self.session.evaluate(scripts::SNAPSHOT).await?;
        let snapshot: DomSnapshot = serde_json::from_value(value)?;
        let mut dom = MemoryDom::from_snapshot(&snapshot)
            .map_err(|e| CdpError::InvalidResponse(format!("snapshot: {}", e)))?;
        dom.record_edits();
        Ok(dom)
    }

    async fn replay(&self, edits: Vec<DomEdit>) -> Result<(), CdpError> {
        if edits.is_empty() {
            return Ok(());
        }
        let expression = scripts::replay_expression(&edits)?;
        let applied = self.session.evaluate(&expression).await?;
        debug!(
            "Replayed {} edits on {} ({} applied)",
            edits.len(),
            self.session.target_id(),
            applied
        );
        Ok(())
    }
}

impl Drop for CdpPage {
    fn drop(&mut self) {
        if let Some(pump) = &self.pump {
            pump.abort();
        }
    }
}

#[async_trait]
impl BrowsingContext for CdpPage {
    fn id(&self) -> &str {
        self.session.target_id()
    }

    async fn serialize(&self) -> Result<String, PageError> {
        let _pass = self.pass.lock().await;
        let mut dom = self.capture().await?;
        let markdown = self.serializer.serialize(&mut dom);
        self.replay(dom.take_edits()).await?;
        Ok(markdown)
    }

    async fn execute(&self, command: PageCommand) -> Result<PageOutcome, PageError> {
        let outcome = {
            let _pass = self.pass.lock().await;
            match self.capture().await {
                Ok(mut dom) => {
                    let result = self.executor.execute(&mut dom, &command);
                    let edits = dom.take_edits();
                    match result {
                        Ok(outcome) => self.replay(edits).await.map(|_| outcome).map_err(PageError::from),
                        Err(e) => Err(PageError::from(e)),
                    }
                }
                Err(e) => Err(PageError::from(e)),
            }
        };

        let _ = self.events.send(PageEvent::ActionCompleted);
        outcome
    }

    fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.events.subscribe()
    }
}

async fn forward_events(mut rx: mpsc::UnboundedReceiver<CdpEvent>, tx: broadcast::Sender<PageEvent>) {
    while let Some(event) = rx.recv().await {
        if let Some(page_event) = page_event(&event) {
            let _ = tx.send(page_event);
        }
    }
    debug!("Page event stream ended");
}

/// Translate a session event into a page event, if it is one.
pub(crate) fn page_event(event: &CdpEvent) -> Option<PageEvent> {
    match event.method.as_str() {
        "Runtime.bindingCalled" if event.params["name"] == NOTIFY_BINDING => {
            match event.params["payload"].as_str()? {
                "mutation" => Some(PageEvent::Mutation),
                "interaction" => Some(PageEvent::Interaction),
                "load" => Some(PageEvent::Load),
                "visible" => Some(PageEvent::Visible),
                _ => None,
            }
        }
        "Page.loadEventFired" => Some(PageEvent::Load),
        "Page.frameNavigated" if is_main_frame(&event.params["frame"]) => {
            Some(PageEvent::NavigationStarted)
        }
        _ => None,
    }
}

fn is_main_frame(frame: &Value) -> bool {
    frame.is_object() && frame.get("parentId").map_or(true, Value::is_null)
}

#[cfg(test)]
#[path = "page_tests.rs"]
mod tests;
