//! In-process browsing context over a [`MemoryDom`].

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;
use vcp_bridge_protocols::{BrowsingContext, PageCommand, PageError, PageEvent, PageOutcome};

use crate::executor::InteractionExecutor;
use crate::serializer::PageSerializer;
use crate::tree::MemoryDom;

const EVENT_CAPACITY: usize = 64;

/// A page living entirely in memory. Used for tests, demos and offline
/// snapshots of captured DOMs.
pub struct LocalPage {
    id: String,
    dom: Mutex<MemoryDom>,
    serializer: PageSerializer,
    executor: InteractionExecutor,
    events: broadcast::Sender<PageEvent>,
}

impl LocalPage {
    pub fn new(id: impl Into<String>, dom: MemoryDom) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            id: id.into(),
            dom: Mutex::new(dom),
            serializer: PageSerializer::new(),
            executor: InteractionExecutor::new(),
            events,
        }
    }

    /// Change the DOM and announce a mutation batch.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut MemoryDom) -> R) -> R {
        let result = f(&mut self.dom.lock());
        self.emit(PageEvent::Mutation);
        result
    }

    /// Read the DOM without announcing anything.
    pub fn with_dom<R>(&self, f: impl FnOnce(&MemoryDom) -> R) -> R {
        f(&self.dom.lock())
    }

    pub fn emit(&self, event: PageEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl BrowsingContext for LocalPage {
    fn id(&self) -> &str {
        &self.id
    }

    async fn serialize(&self) -> Result<String, PageError> {
        let mut dom = self.dom.lock();
        Ok(self.serializer.serialize(&mut *dom))
    }

    async fn execute(&self, command: PageCommand) -> Result<PageOutcome, PageError> {
        let outcome = {
            let mut dom = self.dom.lock();
            self.executor.execute(&mut *dom, &command)
        };
        debug!("Executed {} on {}: ok={}", command.name(), self.id, outcome.is_ok());
        self.emit(PageEvent::ActionCompleted);
        outcome.map_err(PageError::from)
    }

    fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.events.subscribe()
    }
}
