//! # vcp-bridge Page
//!
//! Everything that runs "inside" a browsing context: the render-tree
//! abstraction, the Markdown serializer that stamps element references, the
//! interaction executor that resolves them again, and the observer that
//! decides when a fresh snapshot is worth sending.

pub mod classify;
pub mod error;
pub mod executor;
pub mod label;
pub mod local;
pub mod observer;
pub mod serializer;
pub mod tree;

pub use error::{ExecuteError, SerializeError, TreeError};
pub use executor::InteractionExecutor;
pub use label::ElementKind;
pub use local::LocalPage;
pub use observer::{ObserverHandle, ObserverPolicy, PageObserver};
pub use serializer::PageSerializer;
pub use tree::{
    el, ComputedStyle, Display, DomEdit, DomSnapshot, DomWrite, ElementSpec, MemoryDom,
    MouseEventInit, NodeId, NodeKind, RenderTree, Visibility,
};

/// Attribute carrying the pass-local element reference.
pub const VCP_ID_ATTR: &str = "vcp-id";
