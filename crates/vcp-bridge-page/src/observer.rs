//! Change-driven snapshot scheduling.
//!
//! A [`PageObserver`] subscribes to a page's [`PageEvent`]s and decides when
//! to run a serialization pass. Mutation storms are coalesced by a trailing
//! debounce, some events force an immediate pass, and a slow poll catches
//! anything the events missed. A snapshot is only forwarded when it differs
//! from the last one forwarded.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vcp_bridge_protocols::{PageEvent, PageInfo, SharedPage};

/// Timing knobs for the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverPolicy {
    /// Quiet period after the last mutation/interaction.
    pub debounce: Duration,
    /// Safety-net interval.
    pub poll_interval: Duration,
    /// Delay between a completed action and its follow-up pass.
    pub post_action_delay: Duration,
}

impl Default for ObserverPolicy {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            poll_interval: Duration::from_secs(5),
            post_action_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Control {
    /// Forget the last forwarded snapshot and push now.
    Reset,
    /// Push now if changed.
    Refresh,
}

/// Handle to a running observer. Dropping it stops the observer.
#[derive(Debug)]
pub struct ObserverHandle {
    control: mpsc::UnboundedSender<Control>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ObserverHandle {
    /// Force the next snapshot to be forwarded even if unchanged.
    pub fn reset(&self) {
        let _ = self.control.send(Control::Reset);
    }

    pub fn refresh(&self) {
        let _ = self.control.send(Control::Refresh);
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the observer and wait for it to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub struct PageObserver {
    page: SharedPage,
    policy: ObserverPolicy,
    output: mpsc::Sender<PageInfo>,
    last_sent: Option<String>,
}

impl PageObserver {
    pub fn new(page: SharedPage, policy: ObserverPolicy, output: mpsc::Sender<PageInfo>) -> Self {
        Self {
            page,
            policy,
            output,
            last_sent: None,
        }
    }

    /// Start observing on the current runtime.
    pub fn spawn(self) -> ObserverHandle {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let events = self.page.subscribe();
        let task = tokio::spawn(self.run(events, control_rx, cancel.clone()));
        ObserverHandle {
            control: control_tx,
            cancel,
            task: Some(task),
        }
    }

    async fn run(
        mut self,
        mut events: broadcast::Receiver<PageEvent>,
        mut control: mpsc::UnboundedReceiver<Control>,
        cancel: CancellationToken,
    ) {
        info!("Observing page {}", self.page.id());

        let mut poll = time::interval_at(
            Instant::now() + self.policy.poll_interval,
            self.policy.poll_interval,
        );
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut debounce_at: Option<Instant> = None;
        let mut action_at: Option<Instant> = None;

        if !self.push().await {
            return;
        }

        loop {
            let keep_going = tokio::select! {
                _ = cancel.cancelled() => break,
                ctrl = control.recv() => match ctrl {
                    Some(Control::Reset) => {
                        self.last_sent = None;
                        self.push().await
                    }
                    Some(Control::Refresh) => self.push().await,
                    None => break,
                },
                event = events.recv() => match event {
                    Ok(PageEvent::Mutation) | Ok(PageEvent::Interaction) => {
                        debounce_at = Some(Instant::now() + self.policy.debounce);
                        true
                    }
                    Ok(PageEvent::Load) | Ok(PageEvent::Visible) | Ok(PageEvent::Refresh) => {
                        self.push().await
                    }
                    Ok(PageEvent::ActionCompleted) => {
                        action_at = Some(Instant::now() + self.policy.post_action_delay);
                        true
                    }
                    Ok(PageEvent::NavigationStarted) => {
                        debug!("Navigation started on {}, clearing last snapshot", self.page.id());
                        self.last_sent = None;
                        debounce_at = None;
                        true
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        debug!("Observer lagged by {} events", missed);
                        debounce_at = Some(Instant::now() + self.policy.debounce);
                        true
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = wait_until(debounce_at) => {
                    debounce_at = None;
                    self.push().await
                }
                _ = wait_until(action_at) => {
                    action_at = None;
                    self.push().await
                }
                _ = poll.tick() => self.push().await,
            };

            if !keep_going {
                break;
            }
        }

        info!("Stopped observing page {}", self.page.id());
    }

    /// Serialize and forward if changed. Returns `false` once the receiver
    /// is gone.
    async fn push(&mut self) -> bool {
        let markdown = match self.page.serialize().await {
            Ok(markdown) => markdown,
            Err(e) => {
                warn!("Snapshot of {} failed: {}", self.page.id(), e);
                return true;
            }
        };

        if markdown.is_empty() || self.last_sent.as_deref() == Some(markdown.as_str()) {
            return true;
        }

        debug!("Page {} changed ({} chars)", self.page.id(), markdown.len());
        self.last_sent = Some(markdown.clone());
        self.output.send(PageInfo { markdown }).await.is_ok()
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;
