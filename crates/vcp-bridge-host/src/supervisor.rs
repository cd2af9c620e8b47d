//! Long-lived owner of the connection, router and observer.
//!
//! The [`Supervisor`] is the only place that decides *when* to connect. It
//! applies the reconnect policy around [`ConnectionManager`], pumps inbound
//! commands through the [`CommandRouter`], and keeps a [`PageObserver`]
//! attached to whatever page the host reports as active.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vcp_bridge_config::{
    Config, ReconnectConfig, ServerConfig, SettingsStore, DEFAULT_SERVER_URL, DEFAULT_VCP_KEY,
    KEY_SERVER_URL, KEY_VCP_KEY,
};
use vcp_bridge_page::{ObserverHandle, ObserverPolicy, PageObserver};
use vcp_bridge_protocols::{
    endpoint_url, Channel, CommandEnvelope, HostPlatform, PageInfo, SharedPage, WireMessage,
};

use crate::connection::{ConnectionError, ConnectionManager, ConnectionSettings, ConnectionState};
use crate::router::CommandRouter;

const SNAPSHOT_BUFFER: usize = 16;

/// Where to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub server_url: String,
    pub key: String,
}

impl Endpoint {
    pub fn new(server_url: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            key: key.into(),
        }
    }

    /// Pick each field from the first source that has it: command line,
    /// settings store, config file, built-in default.
    pub fn resolve(
        cli_url: Option<&str>,
        cli_key: Option<&str>,
        settings: &dyn SettingsStore,
        config: &ServerConfig,
    ) -> Self {
        let server_url = first_non_empty([
            cli_url.map(str::to_string),
            settings.get(KEY_SERVER_URL),
            config.url.clone(),
        ])
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

        // An empty key is a valid (if unwise) choice, so only absence falls through.
        let key = cli_key
            .map(str::to_string)
            .or_else(|| settings.get(KEY_VCP_KEY))
            .or_else(|| config.key.clone())
            .unwrap_or_else(|| DEFAULT_VCP_KEY.to_string());

        Self { server_url, key }
    }
}

fn first_non_empty<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

/// Everything the supervisor needs besides the host.
#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    pub endpoint: Endpoint,
    pub connection: ConnectionSettings,
    pub reconnect: ReconnectConfig,
    pub observer: ObserverPolicy,
}

impl SupervisorOptions {
    pub fn from_config(config: &Config, endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            connection: ConnectionSettings::from(&config.connection),
            reconnect: config.reconnect.clone(),
            observer: ObserverPolicy {
                debounce: config.observer.debounce(),
                poll_interval: config.observer.poll_interval(),
                post_action_delay: config.observer.post_action_delay(),
            },
        }
    }
}

pub struct Supervisor {
    host: Arc<dyn HostPlatform>,
    manager: ConnectionManager,
    router: Arc<CommandRouter>,
    options: SupervisorOptions,
}

impl Supervisor {
    pub fn new(host: Arc<dyn HostPlatform>, options: SupervisorOptions) -> Self {
        let manager = ConnectionManager::new(options.connection);
        let router = Arc::new(CommandRouter::new(host.clone()));
        Self {
            host,
            manager,
            router,
            options,
        }
    }

    /// Handle to the managed connection (state, manual toggling).
    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Run until `cancel` fires. Fails only when the endpoint itself is
    /// unusable.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ConnectionError> {
        let endpoint = &self.options.endpoint;
        endpoint_url(&endpoint.server_url, Channel::Observer, &endpoint.key)
            .map_err(ConnectionError::Endpoint)?;

        let pumps = cancel.child_token();

        match self.manager.take_commands() {
            Some(commands) => {
                tokio::spawn(command_pump(
                    self.router.clone(),
                    self.manager.clone(),
                    commands,
                    pumps.clone(),
                ));
            }
            None => warn!("Command receiver already taken; commands will not be routed"),
        }

        let page_pump = tokio::spawn(page_pump(
            self.host.watch_active_page(),
            self.manager.clone(),
            self.options.observer,
            pumps.clone(),
        ));

        self.connection_loop(&cancel).await;

        pumps.cancel();
        self.manager.disconnect();
        let _ = page_pump.await;
        info!("Supervisor stopped");
        Ok(())
    }

    async fn connection_loop(&self, cancel: &CancellationToken) {
        let endpoint = &self.options.endpoint;
        let reconnect = &self.options.reconnect;
        let mut state = self.manager.subscribe_state();
        let mut attempt: u32 = 0;

        loop {
            let connected = tokio::select! {
                _ = cancel.cancelled() => return,
                result = self.manager.connect(&endpoint.server_url, &endpoint.key) => result,
            };

            match connected {
                Ok(()) => {
                    attempt = 0;
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        _ = state.wait_for(|s| *s == ConnectionState::Disconnected) => {}
                    }
                    info!("Connection to {} lost", endpoint.server_url);
                }
                Err(e) => warn!("Connect attempt {} failed: {}", attempt + 1, e),
            }

            if !reconnect.enabled {
                info!("Automatic reconnect disabled; waiting for shutdown");
                cancel.cancelled().await;
                return;
            }

            let delay = reconnect.delay_for_attempt(attempt);
            attempt = attempt.saturating_add(1);
            debug!("Reconnecting in {:?}", delay);
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = time::sleep(delay) => {}
            }
        }
    }
}

async fn command_pump(
    router: Arc<CommandRouter>,
    manager: ConnectionManager,
    mut commands: mpsc::UnboundedReceiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        let envelope = tokio::select! {
            _ = cancel.cancelled() => break,
            envelope = commands.recv() => match envelope {
                Some(envelope) => envelope,
                None => break,
            },
        };

        let router = router.clone();
        let manager = manager.clone();
        tokio::spawn(async move {
            let result = router.dispatch(&envelope).await;
            if let Err(e) = manager.send(&WireMessage::command_result(result)).await {
                warn!("Dropping result for {}: {}", envelope.request_id, e);
            }
        });
    }
    debug!("Command pump stopped");
}

async fn page_pump(
    mut active: watch::Receiver<Option<SharedPage>>,
    manager: ConnectionManager,
    policy: ObserverPolicy,
    cancel: CancellationToken,
) {
    let mut state = manager.subscribe_state();
    let (tx, mut snapshots) = mpsc::channel::<PageInfo>(SNAPSHOT_BUFFER);

    let initial = active.borrow_and_update().clone();
    let mut observer = initial.map(|page| observe(page, policy, &tx));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            changed = active.changed() => {
                if changed.is_err() {
                    debug!("Host dropped its active page channel");
                    break;
                }
                let page = active.borrow_and_update().clone();
                // Dropping the previous handle stops its task.
                observer = page.map(|page| observe(page, policy, &tx));
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let connected = state.borrow_and_update().is_connected();
                if connected {
                    if let Some(observer) = &observer {
                        observer.reset();
                    }
                }
            }
            Some(info) = snapshots.recv() => {
                if !manager.is_connected() {
                    debug!("Not connected, dropping snapshot");
                    continue;
                }
                if let Err(e) = manager.send(&WireMessage::PageInfoUpdate { data: info }).await {
                    warn!("Failed to push page snapshot: {}", e);
                }
            }
        }
    }

    if let Some(observer) = observer {
        observer.shutdown().await;
    }
    debug!("Page pump stopped");
}

fn observe(page: SharedPage, policy: ObserverPolicy, tx: &mpsc::Sender<PageInfo>) -> ObserverHandle {
    info!("Active page is now {}", page.id());
    PageObserver::new(page, policy, tx.clone()).spawn()
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
