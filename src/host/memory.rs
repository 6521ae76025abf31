//! In-memory host surface.
//!
//! `MemoryHost` keeps a node table and journals every mutation it is asked
//! to perform. Handles are cheap clones of one shared document, so a driver
//! can install one clone into the runtime and inspect the same document
//! through another.
//!
//! # Example
//!
//! ```ignore
//! let host = MemoryHost::new();
//! let container = host.create_container("main");
//! install_host(host.clone());
//! render(app, container)?;
//! queue.run_until_idle(&Unbounded, 16);
//! assert_eq!(host.to_markup(container), "<main><p>hi</p></main>");
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write as _;
use std::rc::Rc;

use super::{HostSurface, NodeKind};
use crate::error::HostError;
use crate::types::{Event, HostNode, Listener, Style, NODE_VALUE};

/// One recorded host call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// `tag` is `None` for text nodes.
    Create { node: HostNode, tag: Option<String> },
    SetAttribute { node: HostNode, name: String, value: String },
    RemoveAttribute { node: HostNode, name: String },
    AddListener { node: HostNode, event: String },
    RemoveListener { node: HostNode, event: String },
    SetStyle { node: HostNode, property: String, value: String },
    Append { parent: HostNode, child: HostNode },
    Remove { parent: HostNode, child: HostNode },
    Replace { parent: HostNode, new_child: HostNode, old_child: HostNode },
}

impl Mutation {
    /// Whether this call changed a node's attributes, listeners or style.
    pub fn is_prop_change(&self) -> bool {
        matches!(
            self,
            Self::SetAttribute { .. }
                | Self::RemoveAttribute { .. }
                | Self::AddListener { .. }
                | Self::RemoveListener { .. }
                | Self::SetStyle { .. }
        )
    }
}

#[derive(Default)]
struct NodeData {
    /// `None` for text nodes.
    tag: Option<String>,
    text: String,
    attributes: BTreeMap<String, String>,
    style: Style,
    listeners: Vec<(String, Listener)>,
    children: Vec<HostNode>,
    parent: Option<HostNode>,
}

#[derive(Default)]
struct Document {
    nodes: HashMap<HostNode, NodeData>,
    next_id: u64,
    journal: Vec<Mutation>,
    rejected: HashSet<String>,
}

impl Document {
    fn node(&self, node: HostNode) -> Result<&NodeData, HostError> {
        self.nodes.get(&node).ok_or(HostError::UnknownNode(node))
    }

    fn node_mut(&mut self, node: HostNode) -> Result<&mut NodeData, HostError> {
        self.nodes.get_mut(&node).ok_or(HostError::UnknownNode(node))
    }

    fn allocate(&mut self, tag: Option<String>) -> HostNode {
        self.next_id += 1;
        let node = HostNode::from_raw(self.next_id);
        self.nodes.insert(
            node,
            NodeData {
                tag,
                ..NodeData::default()
            },
        );
        node
    }

    /// Unlink `child` from whatever parent it has.
    fn detach(&mut self, child: HostNode) -> Result<(), HostError> {
        if let Some(parent) = self.node_mut(child)?.parent.take() {
            self.node_mut(parent)?.children.retain(|c| *c != child);
        }
        Ok(())
    }
}

/// Shared in-memory document implementing [`HostSurface`].
#[derive(Clone, Default)]
pub struct MemoryHost {
    doc: Rc<RefCell<Document>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root container node. Not journaled.
    pub fn create_container(&self, tag: &str) -> HostNode {
        self.doc.borrow_mut().allocate(Some(tag.to_string()))
    }

    /// Make every later `create_node` for `tag` fail.
    pub fn reject_tag(&self, tag: &str) {
        self.doc.borrow_mut().rejected.insert(tag.to_string());
    }

    pub fn accept_tag(&self, tag: &str) {
        self.doc.borrow_mut().rejected.remove(tag);
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    pub fn journal(&self) -> Vec<Mutation> {
        self.doc.borrow().journal.clone()
    }

    /// Return and clear the journal.
    pub fn take_journal(&self) -> Vec<Mutation> {
        std::mem::take(&mut self.doc.borrow_mut().journal)
    }

    pub fn node_count(&self) -> usize {
        self.doc.borrow().nodes.len()
    }

    pub fn contains(&self, node: HostNode) -> bool {
        self.doc.borrow().nodes.contains_key(&node)
    }

    /// Tag of an element node, `None` for text nodes and unknown nodes.
    pub fn tag(&self, node: HostNode) -> Option<String> {
        self.doc.borrow().nodes.get(&node).and_then(|n| n.tag.clone())
    }

    pub fn children(&self, node: HostNode) -> Vec<HostNode> {
        self.doc
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, node: HostNode) -> Option<HostNode> {
        self.doc.borrow().nodes.get(&node).and_then(|n| n.parent)
    }

    pub fn attribute(&self, node: HostNode, name: &str) -> Option<String> {
        self.doc
            .borrow()
            .nodes
            .get(&node)
            .and_then(|n| n.attributes.get(name).cloned())
    }

    pub fn style_property(&self, node: HostNode, property: &str) -> Option<String> {
        self.doc
            .borrow()
            .nodes
            .get(&node)
            .and_then(|n| n.style.get(property).cloned())
    }

    pub fn listener_count(&self, node: HostNode, event: &str) -> usize {
        self.doc
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.listeners.iter().filter(|(e, _)| e == event).count())
            .unwrap_or(0)
    }

    /// Concatenated text of `node` and its descendants.
    pub fn text_content(&self, node: HostNode) -> String {
        let doc = self.doc.borrow();
        let mut out = String::new();
        collect_text(&doc, node, &mut out);
        out
    }

    /// Serialize the subtree under `node`.
    ///
    /// Attributes are written in name order, style as one `style` attribute.
    pub fn to_markup(&self, node: HostNode) -> String {
        let doc = self.doc.borrow();
        let mut out = String::new();
        write_markup(&doc, node, &mut out);
        out
    }

    /// Invoke every `kind` listener registered on `node`.
    ///
    /// Listeners run without the document borrowed, so they may freely
    /// write state. Returns how many listeners ran.
    pub fn dispatch_event(&self, node: HostNode, kind: &str) -> usize {
        let listeners: Vec<Listener> = match self.doc.borrow().nodes.get(&node) {
            Some(data) => data
                .listeners
                .iter()
                .filter(|(event, _)| event == kind)
                .map(|(_, listener)| listener.clone())
                .collect(),
            None => return 0,
        };

        let event = Event::new(kind, node);
        for listener in &listeners {
            listener(&event);
        }
        listeners.len()
    }
}

fn collect_text(doc: &Document, node: HostNode, out: &mut String) {
    let Some(data) = doc.nodes.get(&node) else {
        return;
    };
    if data.tag.is_none() {
        out.push_str(&data.text);
    }
    for child in &data.children {
        collect_text(doc, *child, out);
    }
}

fn write_markup(doc: &Document, node: HostNode, out: &mut String) {
    let Some(data) = doc.nodes.get(&node) else {
        return;
    };
    let Some(tag) = &data.tag else {
        out.push_str(&data.text);
        return;
    };

    let _ = write!(out, "<{tag}");
    for (name, value) in &data.attributes {
        let _ = write!(out, " {name}=\"{value}\"");
    }
    if !data.style.is_empty() {
        let style: Vec<String> = data.style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        let _ = write!(out, " style=\"{}\"", style.join("; "));
    }
    out.push('>');
    for child in &data.children {
        write_markup(doc, *child, out);
    }
    let _ = write!(out, "</{tag}>");
}

// =============================================================================
// HostSurface
// =============================================================================

impl HostSurface for MemoryHost {
    fn create_node(&mut self, kind: NodeKind<'_>) -> Result<HostNode, HostError> {
        let mut doc = self.doc.borrow_mut();
        let tag = match kind {
            NodeKind::Element(tag) => {
                if doc.rejected.contains(tag) {
                    return Err(HostError::CreateRejected(tag.to_string()));
                }
                Some(tag.to_string())
            }
            NodeKind::Text => None,
        };
        let node = doc.allocate(tag.clone());
        doc.journal.push(Mutation::Create { node, tag });
        Ok(node)
    }

    fn set_attribute(&mut self, node: HostNode, name: &str, value: &str) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        let data = doc.node_mut(node)?;
        if data.tag.is_none() && name == NODE_VALUE {
            data.text = value.to_string();
        } else {
            data.attributes.insert(name.to_string(), value.to_string());
        }
        doc.journal.push(Mutation::SetAttribute {
            node,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn remove_attribute(&mut self, node: HostNode, name: &str) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        let data = doc.node_mut(node)?;
        if data.tag.is_none() && name == NODE_VALUE {
            data.text.clear();
        } else {
            data.attributes.remove(name);
        }
        doc.journal.push(Mutation::RemoveAttribute {
            node,
            name: name.to_string(),
        });
        Ok(())
    }

    fn add_listener(&mut self, node: HostNode, event: &str, listener: Listener) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        let data = doc.node_mut(node)?;
        let duplicate = data
            .listeners
            .iter()
            .any(|(e, l)| e == event && Rc::ptr_eq(l, &listener));
        if !duplicate {
            data.listeners.push((event.to_string(), listener));
        }
        doc.journal.push(Mutation::AddListener {
            node,
            event: event.to_string(),
        });
        Ok(())
    }

    fn remove_listener(&mut self, node: HostNode, event: &str, listener: &Listener) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        let data = doc.node_mut(node)?;
        data.listeners
            .retain(|(e, l)| !(e == event && Rc::ptr_eq(l, listener)));
        doc.journal.push(Mutation::RemoveListener {
            node,
            event: event.to_string(),
        });
        Ok(())
    }

    fn set_style_property(&mut self, node: HostNode, property: &str, value: &str) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        doc.node_mut(node)?
            .style
            .insert(property.to_string(), value.to_string());
        doc.journal.push(Mutation::SetStyle {
            node,
            property: property.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: HostNode, child: HostNode) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        doc.node(parent)?;
        doc.detach(child)?;
        doc.node_mut(child)?.parent = Some(parent);
        doc.node_mut(parent)?.children.push(child);
        doc.journal.push(Mutation::Append { parent, child });
        Ok(())
    }

    fn remove_child(&mut self, parent: HostNode, child: HostNode) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        doc.node(child)?;
        if doc.node(parent)?.children.contains(&child) {
            doc.detach(child)?;
            doc.journal.push(Mutation::Remove { parent, child });
            Ok(())
        } else {
            Err(HostError::NotAChild { parent, child })
        }
    }

    fn replace_child(&mut self, parent: HostNode, new_child: HostNode, old_child: HostNode) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        doc.node(new_child)?;
        doc.node(old_child)?;
        if !doc.node(parent)?.children.contains(&old_child) {
            return Err(HostError::NotAChild {
                parent,
                child: old_child,
            });
        }

        doc.detach(new_child)?;
        let siblings = &mut doc.node_mut(parent)?.children;
        if let Some(slot) = siblings.iter_mut().find(|c| **c == old_child) {
            *slot = new_child;
        }
        doc.node_mut(old_child)?.parent = None;
        doc.node_mut(new_child)?.parent = Some(parent);
        doc.journal.push(Mutation::Replace {
            parent,
            new_child,
            old_child,
        });
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
