//! Host - The surface fibers are realized on.
//!
//! The core never touches host nodes directly. Everything goes through the
//! [`HostSurface`] trait: node creation, attribute and listener patching,
//! style merging and child-list edits.
//!
//! - [`create_host_node`] builds the node for a fiber
//! - [`update_host_node`] patches an existing node from old to new props
//! - [`MemoryHost`] is a complete in-memory surface with a mutation journal

mod memory;
mod patch;

pub use memory::*;
pub use patch::*;

use crate::error::HostError;
use crate::types::{ElementKind, HostNode, Listener, Props};

/// What `create_node` should build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
    /// Element with the given tag.
    Element(&'a str),
    /// Text node; its text arrives as the `nodeValue` attribute.
    Text,
}

/// Mutation primitives the core needs from its environment.
///
/// Every call either succeeds or fails the whole render cycle; the core does
/// not retry.
pub trait HostSurface {
    fn create_node(&mut self, kind: NodeKind<'_>) -> Result<HostNode, HostError>;

    fn set_attribute(&mut self, node: HostNode, name: &str, value: &str) -> Result<(), HostError>;

    fn remove_attribute(&mut self, node: HostNode, name: &str) -> Result<(), HostError>;

    /// `event` is the bare event type ("click", not "onClick").
    fn add_listener(&mut self, node: HostNode, event: &str, listener: Listener) -> Result<(), HostError>;

    /// Removes the listener registered with the same identity.
    fn remove_listener(&mut self, node: HostNode, event: &str, listener: &Listener) -> Result<(), HostError>;

    fn set_style_property(&mut self, node: HostNode, property: &str, value: &str) -> Result<(), HostError>;

    /// Append `child` as the last child of `parent`, detaching it first if
    /// it already has a parent.
    fn append_child(&mut self, parent: HostNode, child: HostNode) -> Result<(), HostError>;

    fn remove_child(&mut self, parent: HostNode, child: HostNode) -> Result<(), HostError>;

    /// Put `new_child` where `old_child` sits under `parent`.
    fn replace_child(&mut self, parent: HostNode, new_child: HostNode, old_child: HostNode) -> Result<(), HostError>;
}

/// Create the host node for an element kind.
///
/// Text and host tags get their props applied from an empty set. Components
/// get a bare wrapping element named after them.
pub fn create_host_node(
    host: &mut dyn HostSurface,
    kind: &ElementKind,
    props: &Props,
) -> Result<HostNode, HostError> {
    let node = match kind {
        ElementKind::Text => host.create_node(NodeKind::Text)?,
        ElementKind::Host(tag) => host.create_node(NodeKind::Element(tag))?,
        ElementKind::Component(component) => {
            return host.create_node(NodeKind::Element(&component.host_tag()));
        }
    };
    update_host_node(host, node, &Props::new(), props)?;
    Ok(node)
}

// =============================================================================
// Tests
// =============================================================================
