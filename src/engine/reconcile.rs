//! Reconciler - Positional diff of a fiber's children.
//!
//! Walks the previous child chain (`alternate.child` and its siblings) and
//! the new element list in lock-step by index. Declared keys are never
//! consulted: position plus type equality decides every match.
//!
//! | old fiber | new element | same type | outcome |
//! |-----------|-------------|-----------|---------|
//! | yes | yes | yes | UPDATE: reuse node, controller, context |
//! | no  | yes | -   | CREATE: new fiber, new controller |
//! | yes | yes | no  | REPLACE: like CREATE, remembers the old node |
//! | yes | no  | -   | DELETION: old fiber goes on the deletion list |

use super::fiber::{EffectTag, Fiber, FiberId, FiberTree};
use super::registry::get_state_controller;
use crate::types::Element;

/// Side effects of one reconcile pass that commit has to act on.
#[derive(Debug, Default)]
pub struct Removals {
    /// Old fibers with no element at their position any more.
    pub deletions: Vec<FiberId>,
    /// Old fibers supplanted by a REPLACE (their node is swapped, not removed).
    pub superseded: Vec<FiberId>,
}

impl Removals {
    pub fn clear(&mut self) {
        self.deletions.clear();
        self.superseded.clear();
    }
}

/// Diff `elements` against the previous children of `wip` and attach the
/// resulting fibers under it.
pub fn reconcile_children(tree: &mut FiberTree, removals: &mut Removals, wip: FiberId, elements: &[Element]) {
    let mut old = tree[wip].alternate.and_then(|alternate| tree[alternate].child);
    let parent_context = tree[wip].context.clone();
    let mut previous: Option<FiberId> = None;
    let mut index = 0;

    tree[wip].child = None;

    while index < elements.len() || old.is_some() {
        let element = elements.get(index);
        let same_type = match (old, element) {
            (Some(old_id), Some(element)) => tree[old_id].kind.as_ref() == Some(element.kind()),
            _ => false,
        };

        let produced = match (old, element) {
            (Some(old_id), Some(element)) if same_type => {
                let old_fiber = &tree[old_id];
                let mut fiber = Fiber::from_element(element, wip, EffectTag::Update);
                fiber.dom = old_fiber.dom;
                fiber.controller = old_fiber.controller.clone();
                fiber.context = old_fiber.context.clone();
                fiber.alternate = Some(old_id);
                Some(fiber)
            }
            (None, Some(element)) => {
                let context = element
                    .props()
                    .context_override()
                    .cloned()
                    .or_else(|| parent_context.clone());
                let mut fiber = Fiber::from_element(element, wip, EffectTag::Create);
                fiber.controller = get_state_controller(element, context.as_ref());
                fiber.context = context;
                Some(fiber)
            }
            (Some(old_id), Some(element)) => {
                let context = tree[old_id].context.clone();
                let mut fiber = Fiber::from_element(element, wip, EffectTag::Replace);
                fiber.controller = get_state_controller(element, context.as_ref());
                fiber.context = context;
                fiber.replace_node = tree[old_id].dom;
                removals.superseded.push(old_id);
                Some(fiber)
            }
            (Some(old_id), None) => {
                tree[old_id].effect_tag = Some(EffectTag::Deletion);
                removals.deletions.push(old_id);
                None
            }
            (None, None) => None,
        };

        if let Some(old_id) = old {
            old = tree[old_id].sibling;
        }

        if let Some(fiber) = produced {
            log::trace!("reconcile[{index}] {:?} {:?}", fiber.effect_tag, fiber.kind);
            let id = tree.insert(fiber);
            match previous {
                None => tree[wip].child = Some(id),
                Some(prev) => tree[prev].sibling = Some(id),
            }
            previous = Some(id);
        }

        index += 1;
    }
}

// =============================================================================
// Tests
// =============================================================================
