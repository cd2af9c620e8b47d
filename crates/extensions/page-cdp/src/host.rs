//! Chrome as the [`HostPlatform`]: one attached tab at a time.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};
use vcp_bridge_protocols::{HostError, HostPlatform, SharedPage};

use crate::cdp::{CdpClient, CdpError};
use crate::page::CdpPage;

pub struct CdpHost {
    client: CdpClient,
    active: watch::Sender<Option<SharedPage>>,
    current: Mutex<Option<Arc<CdpPage>>>,
}

impl CdpHost {
    /// Connect to Chrome's debugging endpoint and attach to its first tab.
    pub async fn connect(endpoint: &str, timeout: Duration) -> Result<Self, CdpError> {
        let client = CdpClient::connect(endpoint, timeout).await?;
        Self::with_client(client).await
    }

    pub async fn with_client(client: CdpClient) -> Result<Self, CdpError> {
        let host = Self {
            client,
            active: watch::Sender::new(None),
            current: Mutex::new(None),
        };

        let targets = host.client.get_targets().await?;
        match targets.iter().find(|t| t.is_page()) {
            Some(target) => {
                info!("Attaching to existing tab {} ({})", target.target_id, target.url);
                host.switch_to(&target.target_id).await?;
            }
            None => warn!("No open tab to attach to; waiting for open_url"),
        }

        Ok(host)
    }

    pub fn client(&self) -> &CdpClient {
        &self.client
    }

    async fn switch_to(&self, target_id: &str) -> Result<(), CdpError> {
        let session = self.client.attach(target_id).await?;
        let page = Arc::new(CdpPage::attach(session).await?);

        let previous = self.current.lock().await.replace(page.clone());
        self.active.send_replace(Some(page));
        if let Some(previous) = previous {
            previous.detach().await;
        }
        Ok(())
    }
}

#[async_trait]
impl HostPlatform for CdpHost {
    async fn open_url(&self, url: &str) -> Result<(), HostError> {
        let target_id = self.client.create_target(url).await?;
        self.client.activate_target(&target_id).await?;
        self.switch_to(&target_id).await?;
        info!("Opened {} in tab {}", url, target_id);
        Ok(())
    }

    fn watch_active_page(&self) -> watch::Receiver<Option<SharedPage>> {
        self.active.subscribe()
    }
}
