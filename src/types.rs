//! Core types for luna.
//!
//! These types define the foundation that everything builds on.
//! Elements describe what the UI should look like, props carry the values a
//! host node is patched with, and `HostNode` is the opaque handle a host
//! surface hands back for every node it creates.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::primitives::Component;
use crate::state::Context;

/// Prop name under which a text element stores its text.
pub const NODE_VALUE: &str = "nodeValue";

/// Prop name for the style map.
pub const STYLE: &str = "style";

/// Prop name for the ref callback.
pub const REF: &str = "ref";

// =============================================================================
// Host Node
// =============================================================================

/// Opaque handle to a node owned by the host surface.
///
/// The core never looks inside; it only passes handles back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostNode(u64);

impl HostNode {
    /// Wrap a raw host identifier.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw host identifier.
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HostNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Callbacks
// =============================================================================

/// Event delivered to a listener by the host surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event type without the `on` prefix (e.g. "click").
    pub kind: String,
    /// Node the event was dispatched on.
    pub target: HostNode,
}

impl Event {
    pub fn new(kind: impl Into<String>, target: HostNode) -> Self {
        Self {
            kind: kind.into(),
            target,
        }
    }
}

/// Event listener callback.
///
/// Rc so the same listener can sit in several prop maps; identity decides
/// whether a listener "changed" between renders.
pub type Listener = Rc<dyn Fn(&Event)>;

/// Ref callback, invoked once with the host node of a freshly created fiber.
pub type RefCallback = Rc<dyn Fn(HostNode)>;

/// Style declarations (`property -> value`).
pub type Style = BTreeMap<String, String>;

// =============================================================================
// Prop Value
// =============================================================================

/// A single prop value.
#[derive(Clone)]
pub enum PropValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Event listener. The prop name decides the event type.
    Listener(Listener),
    /// Style map, merged entry by entry into the host node.
    Style(Style),
    /// Ref callback. Never forwarded to the host.
    Ref(RefCallback),
}

impl PropValue {
    /// Build a listener value from a closure.
    pub fn listener(f: impl Fn(&Event) + 'static) -> Self {
        Self::Listener(Rc::new(f))
    }

    /// Build a ref value from a closure.
    pub fn node_ref(f: impl Fn(HostNode) + 'static) -> Self {
        Self::Ref(Rc::new(f))
    }

    /// Build a style value from `(property, value)` pairs.
    pub fn style<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Style(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_listener(&self) -> bool {
        matches!(self, Self::Listener(_))
    }

    /// Render the value the way a host attribute would hold it.
    pub fn to_attribute_string(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Listener(_) => "[listener]".to_string(),
            Self::Ref(_) => "[ref]".to_string(),
            Self::Style(style) => style
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect::<Vec<_>>()
                .join("; "),
        }
    }
}

/// Callbacks compare by identity, data by value.
impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Listener(a), Self::Listener(b)) => Rc::ptr_eq(a, b),
            (Self::Style(a), Self::Style(b)) => a == b,
            (Self::Ref(a), Self::Ref(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Listener(l) => write!(f, "Listener({:p})", Rc::as_ptr(l)),
            Self::Style(s) => f.debug_tuple("Style").field(s).finish(),
            Self::Ref(r) => write!(f, "Ref({:p})", Rc::as_ptr(r)),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Style> for PropValue {
    fn from(value: Style) -> Self {
        Self::Style(value)
    }
}

// =============================================================================
// Props
// =============================================================================

/// Properties of an element.
///
/// `children` is always present (possibly empty). `key` is carried along
/// for callers that want it but matching is positional, so nothing in the
/// reconciler reads it. `context` overrides the inherited context for the
/// element's subtree.
#[derive(Clone, Default)]
pub struct Props {
    values: BTreeMap<String, PropValue>,
    children: Vec<Element>,
    key: Option<String>,
    context: Option<Context>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Attach a listener under `name` (e.g. "onClick").
    pub fn on(self, name: impl Into<String>, f: impl Fn(&Event) + 'static) -> Self {
        self.with(name, PropValue::listener(f))
    }

    /// Attach a ref callback.
    pub fn node_ref(self, f: impl Fn(HostNode) + 'static) -> Self {
        self.with(REF, PropValue::node_ref(f))
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<PropValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub(crate) fn set_children(&mut self, children: Vec<Element>) {
        self.children = children;
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// All named values in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn key_value(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn context_override(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub fn style(&self) -> Option<&Style> {
        match self.values.get(STYLE) {
            Some(PropValue::Style(style)) => Some(style),
            _ => None,
        }
    }

    pub fn ref_callback(&self) -> Option<&RefCallback> {
        match self.values.get(REF) {
            Some(PropValue::Ref(callback)) => Some(callback),
            _ => None,
        }
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("values", &self.values)
            .field("children", &self.children)
            .field("key", &self.key)
            .field("context", &self.context.is_some())
            .finish()
    }
}

// =============================================================================
// Element
// =============================================================================

/// What an element renders as.
#[derive(Clone, PartialEq)]
pub enum ElementKind {
    /// Host tag such as "div".
    Host(String),
    /// Text leaf; the text itself lives in props under `nodeValue`.
    Text,
    /// User component, matched by identity.
    Component(Component),
}

impl ElementKind {
    pub fn is_component(&self) -> bool {
        matches!(self, Self::Component(_))
    }

    pub fn as_component(&self) -> Option<&Component> {
        match self {
            Self::Component(component) => Some(component),
            _ => None,
        }
    }
}

impl fmt::Debug for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host(tag) => write!(f, "Host({tag})"),
            Self::Text => write!(f, "Text"),
            Self::Component(component) => write!(f, "Component({})", component.name()),
        }
    }
}

impl From<&str> for ElementKind {
    fn from(tag: &str) -> Self {
        Self::Host(tag.to_string())
    }
}

impl From<String> for ElementKind {
    fn from(tag: String) -> Self {
        Self::Host(tag)
    }
}

impl From<Component> for ElementKind {
    fn from(component: Component) -> Self {
        Self::Component(component)
    }
}

impl From<&Component> for ElementKind {
    fn from(component: &Component) -> Self {
        Self::Component(component.clone())
    }
}

/// Immutable description of the UI at one tree position.
///
/// Created fresh on every render; cloning shares the props.
#[derive(Clone)]
pub struct Element {
    kind: ElementKind,
    props: Rc<Props>,
}

impl Element {
    pub(crate) fn new(kind: ElementKind, props: Props) -> Self {
        Self {
            kind,
            props: Rc::new(props),
        }
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub(crate) fn shared_props(&self) -> Rc<Props> {
        self.props.clone()
    }

    pub fn children(&self) -> &[Element] {
        self.props.children()
    }

    /// Text of a text element.
    pub fn text(&self) -> Option<&str> {
        match self.kind {
            ElementKind::Text => self.props.get(NODE_VALUE).and_then(PropValue::as_text),
            _ => None,
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("kind", &self.kind)
            .field("props", &self.props)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
