//! Fiber - Mutable realization of an element.
//!
//! Fibers live in an arena (`FiberTree`) and refer to each other by
//! `FiberId`. `child` is the forward link the walk follows; `parent`,
//! `sibling` and `alternate` are plain back-references. The committed tree
//! and the work-in-progress tree share the arena: a pending fiber's
//! `alternate` points at its committed counterpart, never the reverse.
//!
//! ```text
//! root ──child──▶ A ──sibling──▶ B
//!                 │
//!               child
//!                 ▼
//!                 C
//! ```

use std::collections::HashSet;
use std::ops::{Index, IndexMut};
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use crate::primitives::Component;
use crate::state::{Context, ControllerRef};
use crate::types::{Element, ElementKind, HostNode, Props};

new_key_type! {
    /// Handle to a fiber in a `FiberTree`.
    pub struct FiberId;
}

// =============================================================================
// Effect Tag
// =============================================================================

/// Mutation a fiber needs at commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectTag {
    /// New host node, appended under the nearest host ancestor.
    Create,
    /// Same type as before; patch props on the existing node.
    Update,
    /// No element at this position any more; remove the node.
    Deletion,
    /// Different type at this position; swap the old node for a new one.
    Replace,
}

// =============================================================================
// Fiber
// =============================================================================

/// One realized element at one point in time.
#[derive(Debug)]
pub struct Fiber {
    /// `None` only for the root container fiber.
    pub kind: Option<ElementKind>,
    pub props: Rc<Props>,
    pub dom: Option<HostNode>,
    pub parent: Option<FiberId>,
    pub child: Option<FiberId>,
    pub sibling: Option<FiberId>,
    /// Same position in the last committed tree.
    pub alternate: Option<FiberId>,
    /// Absent on a root fiber.
    pub effect_tag: Option<EffectTag>,
    pub controller: Option<ControllerRef>,
    pub context: Option<Context>,
    /// Host node being supplanted; set only with `EffectTag::Replace`.
    pub replace_node: Option<HostNode>,
}

impl Fiber {
    /// Root fiber wrapping an existing host container.
    pub(crate) fn root(dom: HostNode, props: Rc<Props>, alternate: Option<FiberId>) -> Self {
        Self {
            kind: None,
            props,
            dom: Some(dom),
            parent: None,
            child: None,
            sibling: None,
            alternate,
            effect_tag: None,
            controller: None,
            context: None,
            replace_node: None,
        }
    }

    /// Fresh fiber for `element` under `parent`, no host node yet.
    pub(crate) fn from_element(element: &Element, parent: FiberId, effect_tag: EffectTag) -> Self {
        Self {
            kind: Some(element.kind().clone()),
            props: element.shared_props(),
            dom: None,
            parent: Some(parent),
            child: None,
            sibling: None,
            alternate: None,
            effect_tag: Some(effect_tag),
            controller: None,
            context: None,
            replace_node: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.kind.is_none()
    }

    pub fn component(&self) -> Option<&Component> {
        self.kind.as_ref().and_then(ElementKind::as_component)
    }

    pub fn is_component(&self) -> bool {
        self.component().is_some()
    }
}

// =============================================================================
// Fiber Tree
// =============================================================================

/// Arena holding every live fiber of the committed and pending trees.
#[derive(Debug, Default)]
pub struct FiberTree {
    fibers: SlotMap<FiberId, Fiber>,
}

impl FiberTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, fiber: Fiber) -> FiberId {
        self.fibers.insert(fiber)
    }

    pub fn get(&self, id: FiberId) -> Option<&Fiber> {
        self.fibers.get(id)
    }

    pub fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber> {
        self.fibers.get_mut(id)
    }

    pub fn contains(&self, id: FiberId) -> bool {
        self.fibers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    pub fn clear(&mut self) {
        self.fibers.clear();
    }

    /// Direct children, left to right.
    pub fn children(&self, id: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut next = self.get(id).and_then(|f| f.child);
        while let Some(child) = next {
            out.push(child);
            next = self.get(child).and_then(|f| f.sibling);
        }
        out
    }

    /// Depth-first successor: the child, else the nearest sibling on the
    /// way up, else `None` once the walk is exhausted.
    pub fn next_unit(&self, id: FiberId) -> Option<FiberId> {
        let fiber = self.get(id)?;
        if let Some(child) = fiber.child {
            return Some(child);
        }
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let fiber = self.get(current)?;
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Host node of the nearest ancestor that owns one.
    pub fn host_parent(&self, id: FiberId) -> Option<HostNode> {
        let mut cursor = self.get(id).and_then(|f| f.parent);
        while let Some(current) = cursor {
            let fiber = self.get(current)?;
            if fiber.dom.is_some() {
                return fiber.dom;
            }
            cursor = fiber.parent;
        }
        None
    }

    /// `id` and its descendants, children before parents, left to right.
    pub fn subtree_post_order(&self, id: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut stack = vec![(id, false)];
        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                out.push(current);
                continue;
            }
            stack.push((current, true));
            for child in self.children(current).into_iter().rev() {
                stack.push((child, false));
            }
        }
        out
    }

    /// Drop every fiber not reachable from `root` and clear the surviving
    /// fibers' `alternate` links. Returns how many fibers were freed.
    pub(crate) fn retain_reachable(&mut self, root: FiberId) -> usize {
        let mut keep = HashSet::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if !keep.insert(current) {
                continue;
            }
            stack.extend(self.children(current));
        }

        let before = self.fibers.len();
        self.fibers.retain(|id, fiber| {
            let reachable = keep.contains(&id);
            if reachable {
                fiber.alternate = None;
            }
            reachable
        });
        before - self.fibers.len()
    }
}

impl Index<FiberId> for FiberTree {
    type Output = Fiber;

    fn index(&self, id: FiberId) -> &Fiber {
        &self.fibers[id]
    }
}

impl IndexMut<FiberId> for FiberTree {
    fn index_mut(&mut self, id: FiberId) -> &mut Fiber {
        &mut self.fibers[id]
    }
}

// =============================================================================
// Tests
// =============================================================================
