//! Scripts evaluated inside the page.
//!
//! The snapshot script and the edit replayer share `window.__vcpNodes`: the
//! snapshot pins every captured node at its snapshot index, and the replayer
//! resolves `DomEdit.node` through the same array.

use vcp_bridge_page::DomEdit;

/// Name of the binding page scripts call to announce changes.
pub const NOTIFY_BINDING: &str = "__vcpNotify";

/// Capture the composed DOM as a `DomSnapshot`.
pub const SNAPSHOT: &str = r#"(() => {
  const nodes = [];
  const handles = [];
  const add = (entry, handle) => {
    nodes.push(entry);
    handles.push(handle);
    return nodes.length - 1;
  };
  const styleOf = (el) => {
    try {
      const cs = getComputedStyle(el);
      const rect = el.getBoundingClientRect();
      const boxless = cs.display === 'contents';
      return {
        display: cs.display,
        visibility: cs.visibility,
        opacity: cs.opacity,
        cursor: cs.cursor,
        width: boxless ? null : rect.width,
        height: boxless ? null : rect.height,
      };
    } catch (e) {
      return null;
    }
  };
  const walk = (node, parent) => {
    if (node.nodeType === Node.TEXT_NODE) {
      add({ kind: 'text', parent, text: node.data }, node);
      return;
    }
    if (node.nodeType !== Node.ELEMENT_NODE) return;
    const attrs = [];
    for (const a of node.attributes) attrs.push([a.name, a.value]);
    const entry = { kind: 'element', parent, tag: node.localName, attrs, style: styleOf(node) };
    if (['input', 'textarea', 'select'].includes(node.localName)) entry.value = String(node.value ?? '');
    const index = add(entry, node);
    if (node.shadowRoot) {
      const root = add({ kind: 'shadow-root', parent: index }, node.shadowRoot);
      for (const child of node.shadowRoot.childNodes) walk(child, root);
    }
    for (const child of node.childNodes) walk(child, index);
  };
  add({ kind: 'document' }, document);
  if (document.documentElement) walk(document.documentElement, 0);
  window.__vcpNodes = handles;
  return { title: document.title, nodes };
})()"#;

/// Apply a JSON array of `DomEdit`s; returns how many were applied.
const REPLAY: &str = r#"((edits) => {
  const nodes = window.__vcpNodes || [];
  let applied = 0;
  for (const edit of edits) {
    const node = nodes[edit.node];
    if (!node) continue;
    switch (edit.op) {
      case 'setAttribute': node.setAttribute(edit.name, edit.value); break;
      case 'removeAttribute': node.removeAttribute(edit.name); break;
      case 'setValue': node.value = edit.value; break;
      case 'focus': if (typeof node.focus === 'function') node.focus(); break;
      case 'dispatchMouseEvent':
        node.dispatchEvent(new MouseEvent(edit.init.eventType, {
          bubbles: edit.init.bubbles,
          cancelable: edit.init.cancelable,
          view: window,
        }));
        break;
      default: continue;
    }
    applied++;
  }
  return applied;
})"#;

/// Change detection: mutations, clicks, focus, load and visibility are
/// reported through the notify binding. Safe to run more than once.
pub const OBSERVER: &str = r#"(() => {
  if (window.__vcpObserverInstalled) return;
  window.__vcpObserverInstalled = true;
  const notify = (kind) => {
    try { window.__vcpNotify(kind); } catch (e) {}
  };
  const start = () => {
    const observer = new MutationObserver((records) => {
      if (records.every((r) => r.type === 'attributes' && r.attributeName === 'vcp-id')) return;
      notify('mutation');
    });
    observer.observe(document.documentElement || document, {
      childList: true,
      subtree: true,
      attributes: true,
      characterData: true,
    });
  };
  if (document.documentElement) start();
  else document.addEventListener('DOMContentLoaded', start, { once: true });
  document.addEventListener('click', () => notify('interaction'), true);
  document.addEventListener('focusin', () => notify('interaction'), true);
  window.addEventListener('load', () => notify('load'));
  document.addEventListener('visibilitychange', () => {
    if (document.visibilityState === 'visible') notify('visible');
  });
})()"#;

/// Expression replaying `edits` against the last snapshot's nodes.
pub fn replay_expression(edits: &[DomEdit]) -> Result<String, serde_json::Error> {
    Ok(format!("{}({})", REPLAY, serde_json::to_string(edits)?))
}
