//! `run` and `snapshot` subcommand handlers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use vcp_bridge_config::{Config, SettingsStore};
use vcp_bridge_host::{Endpoint, Supervisor, SupervisorOptions};
use vcp_bridge_page_cdp::CdpHost;
use vcp_bridge_protocols::{normalize_url, BrowsingContext, HostPlatform, PageEvent};

use crate::cli::RunArgs;

const LOAD_WAIT: Duration = Duration::from_secs(10);

/// Attach to Chrome and keep the bridge up until Ctrl-C.
pub(crate) async fn run(config: &Config, settings: &dyn SettingsStore, args: RunArgs) -> Result<()> {
    let endpoint = Endpoint::resolve(
        args.server_url.as_deref(),
        args.key.as_deref(),
        settings,
        &config.server,
    );
    let host = connect_host(config, args.cdp_endpoint.as_deref()).await?;

    let options = SupervisorOptions::from_config(config, endpoint);
    let supervisor = Supervisor::new(Arc::new(host), options);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl-C, shutting down"),
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
        on_signal.cancel();
    });

    supervisor
        .run(cancel)
        .await
        .context("Bridge stopped")?;
    info!("Bridge stopped");
    Ok(())
}

/// Print one serialization of the active page.
pub(crate) async fn snapshot(
    config: &Config,
    url: Option<String>,
    cdp_endpoint: Option<String>,
) -> Result<()> {
    let host = connect_host(config, cdp_endpoint.as_deref()).await?;

    if let Some(url) = url {
        let url = normalize_url(&url);
        host.open_url(&url)
            .await
            .with_context(|| format!("Failed to open {}", url))?;
        wait_for_load(&host).await;
    }

    let page = host
        .active_page()
        .context("Chrome has no open tab; pass --url to open one")?;
    let markdown = page.serialize().await.context("Failed to serialize page")?;
    println!("{}", markdown);
    Ok(())
}

async fn connect_host(config: &Config, cdp_endpoint: Option<&str>) -> Result<CdpHost> {
    let endpoint = cdp_endpoint.unwrap_or(&config.browser.cdp_endpoint);
    let timeout = Duration::from_millis(config.browser.command_timeout_ms);
    info!("Connecting to Chrome at {}", endpoint);
    CdpHost::connect(endpoint, timeout)
        .await
        .with_context(|| format!("Failed to attach to Chrome at {}", endpoint))
}

async fn wait_for_load(host: &CdpHost) {
    let Some(page) = host.active_page() else {
        return;
    };
    let mut events = page.subscribe();
    let loaded = tokio::time::timeout(LOAD_WAIT, async {
        loop {
            match events.recv().await {
                Ok(PageEvent::Load) | Err(_) => break,
                Ok(_) => {}
            }
        }
    })
    .await;
    if loaded.is_err() {
        warn!("Page did not finish loading within {:?}", LOAD_WAIT);
    }
}
