//! Prop patching - Update an existing host node from old props to new props.
//!
//! # Algorithm
//!
//! 1. Remove listeners that changed or disappeared
//! 2. Remove plain attributes that disappeared
//! 3. Set plain attributes that are new or changed
//! 4. Add listeners that are new or changed
//! 5. Merge style entries whose value changed
//!
//! Listener values compare by identity, so re-creating a closure on every
//! render shows up as a remove plus an add. `ref` never reaches the host.

use super::HostSurface;
use crate::error::HostError;
use crate::types::{HostNode, PropValue, Props, REF, STYLE};

bitflags::bitflags! {
    /// What an `update_host_node` call touched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PatchFlags: u8 {
        const NONE = 0;
        const LISTENERS_REMOVED = 1 << 0;
        const ATTRIBUTES_REMOVED = 1 << 1;
        const ATTRIBUTES_SET = 1 << 2;
        const LISTENERS_ADDED = 1 << 3;
        const STYLE_MERGED = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropClass {
    Listener,
    Style,
    Ref,
    Attribute,
}

fn classify(name: &str, value: &PropValue) -> PropClass {
    match value {
        PropValue::Listener(_) => PropClass::Listener,
        PropValue::Style(_) if name == STYLE => PropClass::Style,
        PropValue::Ref(_) if name == REF => PropClass::Ref,
        _ => PropClass::Attribute,
    }
}

fn class_of(props: &Props, name: &str) -> Option<PropClass> {
    props.get(name).map(|value| classify(name, value))
}

/// Event type for a listener prop: `onClick` -> `click`.
pub fn event_type(name: &str) -> String {
    name.strip_prefix("on").unwrap_or(name).to_lowercase()
}

/// Patch `node` so it reflects `next` instead of `prev`.
///
/// Unchanged props produce no host calls.
pub fn update_host_node(
    host: &mut dyn HostSurface,
    node: HostNode,
    prev: &Props,
    next: &Props,
) -> Result<PatchFlags, HostError> {
    let mut flags = PatchFlags::NONE;

    for (name, old) in prev.iter() {
        if let PropValue::Listener(listener) = old {
            if next.get(name) != Some(old) {
                host.remove_listener(node, &event_type(name), listener)?;
                flags |= PatchFlags::LISTENERS_REMOVED;
            }
        }
    }

    for (name, old) in prev.iter() {
        if classify(name, old) == PropClass::Attribute && class_of(next, name) != Some(PropClass::Attribute) {
            host.remove_attribute(node, name)?;
            flags |= PatchFlags::ATTRIBUTES_REMOVED;
        }
    }

    for (name, new) in next.iter() {
        if classify(name, new) == PropClass::Attribute && prev.get(name) != Some(new) {
            host.set_attribute(node, name, &new.to_attribute_string())?;
            flags |= PatchFlags::ATTRIBUTES_SET;
        }
    }

    for (name, new) in next.iter() {
        if let PropValue::Listener(listener) = new {
            if prev.get(name) != Some(new) {
                host.add_listener(node, &event_type(name), listener.clone())?;
                flags |= PatchFlags::LISTENERS_ADDED;
            }
        }
    }

    if let Some(style) = next.style() {
        let previous = prev.style();
        for (property, value) in style {
            if previous.and_then(|p| p.get(property)) != Some(value) {
                host.set_style_property(node, property, value)?;
                flags |= PatchFlags::STYLE_MERGED;
            }
        }
    }

    if !flags.is_empty() {
        log::trace!("patched {node}: {flags:?}");
    }
    Ok(flags)
}

// =============================================================================
// Tests
// =============================================================================
