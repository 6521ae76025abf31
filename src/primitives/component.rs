//! Component Primitive - Named render functions.
//!
//! A component is a shared handle to a render function. Two element kinds
//! are the same component only if they point at the same handle, which is
//! what lets the reconciler keep a component's controller across renders.
//!
//! Components are not invisible: each one owns a wrapping host element
//! whose tag is the kebab-cased component name (`TodoList` -> `todo-list`).
//!
//! # Example
//!
//! ```ignore
//! use luna::primitives::{component, create_element};
//! use luna::children;
//!
//! let greeting = component("Greeting", |props| {
//!     let name = props.get("name").and_then(|v| v.as_text()).unwrap_or("world");
//!     create_element("p", None, children![format!("Hello, {name}!")])
//! });
//! ```

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::state::{Context, Controller, ControllerRef, Observable};
use crate::types::{Element, Props, PropValue};

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique component identity (controller registry key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

/// Render function signature.
pub type RenderFn = dyn Fn(&RenderProps<'_>) -> Element;

struct ComponentDef {
    id: ComponentId,
    name: String,
    render: Box<RenderFn>,
}

/// Shared handle to a component definition.
#[derive(Clone)]
pub struct Component(Rc<ComponentDef>);

impl Component {
    pub fn new(name: impl Into<String>, render: impl Fn(&RenderProps<'_>) -> Element + 'static) -> Self {
        Self(Rc::new(ComponentDef {
            id: ComponentId(NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            render: Box::new(render),
        }))
    }

    pub fn id(&self) -> ComponentId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Tag of the wrapping host element.
    pub fn host_tag(&self) -> String {
        to_kebab_case(&self.0.name)
    }

    /// Run the render function.
    pub fn render(&self, props: &RenderProps<'_>) -> Element {
        (self.0.render)(props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .finish()
    }
}

/// Define a component.
pub fn component(
    name: impl Into<String>,
    render: impl Fn(&RenderProps<'_>) -> Element + 'static,
) -> Component {
    Component::new(name, render)
}

// =============================================================================
// Render Props
// =============================================================================

/// What a render function receives: the element's props plus the fiber's
/// controller and context.
pub struct RenderProps<'a> {
    props: &'a Props,
    controller: Option<&'a ControllerRef>,
    context: Option<&'a Context>,
}

impl<'a> RenderProps<'a> {
    pub fn new(
        props: &'a Props,
        controller: Option<&'a ControllerRef>,
        context: Option<&'a Context>,
    ) -> Self {
        Self {
            props,
            controller,
            context,
        }
    }

    pub fn props(&self) -> &Props {
        self.props
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.props.get(name)
    }

    pub fn children(&self) -> &[Element] {
        self.props.children()
    }

    /// The fiber's controller, type-erased.
    pub fn controller_ref(&self) -> Option<&ControllerRef> {
        self.controller
    }

    /// The fiber's controller as its concrete type.
    pub fn controller<T: Controller>(&self) -> Option<Observable<T>> {
        self.controller.and_then(ControllerRef::downcast::<T>)
    }

    pub fn context(&self) -> Option<&Context> {
        self.context
    }
}

// =============================================================================
// Kebab Case
// =============================================================================

/// `TodoListItem` -> `todo-list-item`.
///
/// Each capitalized word (an ASCII capital plus the lower-case letters after
/// it) is lower-cased and followed by `-` unless it ends the name. Anything
/// else passes through, so `myWidget` -> `mywidget` and `Item2List` ->
/// `item-2list`.
pub fn to_kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut chars = name.char_indices().peekable();
    while let Some((_, ch)) = chars.next() {
        if !ch.is_ascii_uppercase() {
            out.push(ch);
            continue;
        }
        out.push(ch.to_ascii_lowercase());
        while let Some(&(_, next)) = chars.peek() {
            if !next.is_ascii_lowercase() {
                break;
            }
            out.push(next);
            chars.next();
        }
        if chars.peek().is_some() {
            out.push('-');
        }
    }
    out
}

// =============================================================================
// Tests
// =============================================================================
