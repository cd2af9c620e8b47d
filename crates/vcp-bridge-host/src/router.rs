//! Command dispatch.
//!
//! Every envelope handed to [`CommandRouter::dispatch`] yields exactly one
//! [`CommandResult`] carrying the same `requestId`, whether the command was
//! unknown, the host call failed, or the page task panicked.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use vcp_bridge_protocols::{
    normalize_url, CommandAction, CommandEnvelope, CommandResult, HostError, HostPlatform,
    PageCommand,
};

pub struct CommandRouter {
    host: Arc<dyn HostPlatform>,
}

impl CommandRouter {
    pub fn new(host: Arc<dyn HostPlatform>) -> Self {
        Self { host }
    }

    pub async fn dispatch(&self, envelope: &CommandEnvelope) -> CommandResult {
        debug!(
            "Dispatching {} (requestId={})",
            envelope.command, envelope.request_id
        );

        let action = match envelope.action() {
            Ok(action) => action,
            Err(e) => {
                warn!("Rejected command {}: {}", envelope.request_id, e);
                return CommandResult::failure(envelope, e.to_string());
            }
        };

        let result = match action {
            CommandAction::OpenUrl { url } => self.open_url(envelope, url).await,
            CommandAction::Page(command) => self.forward(envelope, command).await,
        };

        if result.is_success() {
            info!("Command {} succeeded", envelope.request_id);
        } else {
            warn!(
                "Command {} failed: {}",
                envelope.request_id,
                result.error.as_deref().unwrap_or_default()
            );
        }
        result
    }

    async fn open_url(&self, envelope: &CommandEnvelope, url: String) -> CommandResult {
        let url = normalize_url(&url);
        let host = self.host.clone();
        let target = url.clone();

        match tokio::spawn(async move { host.open_url(&target).await }).await {
            Ok(Ok(())) => CommandResult::success(envelope, format!("成功打开URL: {}", url), None),
            Ok(Err(e)) => CommandResult::failure(envelope, e.to_string()),
            Err(join) => {
                error!("open_url task failed: {}", join);
                CommandResult::failure(envelope, format!("内部错误: {}", join))
            }
        }
    }

    async fn forward(&self, envelope: &CommandEnvelope, command: PageCommand) -> CommandResult {
        let Some(page) = self.host.active_page() else {
            return CommandResult::failure(envelope, HostError::NoActivePage.to_string());
        };

        debug!("Forwarding {} to page {}", command.name(), page.id());
        match tokio::spawn(async move { page.execute(command).await }).await {
            Ok(Ok(outcome)) => CommandResult::success(envelope, outcome.message, outcome.result),
            Ok(Err(e)) => CommandResult::failure(envelope, e.to_string()),
            Err(join) => {
                error!("Page task failed: {}", join);
                CommandResult::failure(envelope, format!("内部错误: {}", join))
            }
        }
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
