//! Resolve element references and perform actions.

use tracing::debug;
use vcp_bridge_protocols::{PageCommand, PageOutcome};

use crate::error::ExecuteError;
use crate::label::display_label;
use crate::tree::{DomWrite, MouseEventInit, NodeId, RenderTree};
use crate::VCP_ID_ATTR;

/// Executes page commands against a tree stamped by the serializer.
#[derive(Debug, Clone, Default)]
pub struct InteractionExecutor;

impl InteractionExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Find the element a command targets.
    ///
    /// A live `vcp-id` wins; otherwise the first stamped element whose
    /// display label equals `target` exactly.
    pub fn resolve<T: RenderTree + ?Sized>(&self, tree: &T, target: &str) -> Result<NodeId, ExecuteError> {
        if let Some(node) = tree.find_by_attribute(VCP_ID_ATTR, target) {
            return Ok(node);
        }

        tree.elements_with_attribute(VCP_ID_ATTR)
            .into_iter()
            .find(|&node| display_label(tree, node) == target)
            .ok_or_else(|| ExecuteError::TargetNotFound(target.to_string()))
    }

    pub fn execute<T: RenderTree + DomWrite>(
        &self,
        dom: &mut T,
        command: &PageCommand,
    ) -> Result<PageOutcome, ExecuteError> {
        let target = command.target();
        let node = self.resolve(&*dom, target)?;
        debug!("Resolved '{}' to {} for {}", target, node, command.name());

        match command {
            PageCommand::Click { .. } => {
                dom.focus(node)?;
                dom.dispatch_mouse_event(node, &MouseEventInit::click())?;
                Ok(PageOutcome::message(format!(
                    "成功点击了ID为 '{}' 的元素。",
                    target
                )))
            }
            PageCommand::Type { text, .. } => {
                if !matches!(dom.tag(node), Some("input") | Some("textarea")) {
                    return Err(ExecuteError::NotEditable(target.to_string()));
                }
                dom.set_value(node, text)?;
                Ok(PageOutcome::message(format!(
                    "成功在ID为 '{}' 的元素中输入文本。",
                    target
                )))
            }
        }
    }
}
