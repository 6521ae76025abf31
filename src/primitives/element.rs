//! Element Builder - Pure construction of element descriptions.
//!
//! `create_element` never touches the runtime or the host. It normalizes
//! the children list: nested lists are flattened, `false`/`None` entries
//! are dropped and anything that is not already an element becomes a text
//! element. Empty strings and zero survive as text.

use super::text::create_text_element;
use super::types::Child;
use crate::types::{Element, ElementKind, Props};

/// Create an element from a kind, optional props and children.
///
/// # Example
///
/// ```ignore
/// use luna::{children, create_element, Props};
///
/// let list = create_element(
///     "ul",
///     Props::new().with("id", "todos"),
///     children![
///         create_element("li", None, children!["write docs"]),
///         create_element("li", None, children!["ship it"]),
///     ],
/// );
/// ```
pub fn create_element(
    kind: impl Into<ElementKind>,
    props: impl Into<Option<Props>>,
    children: impl IntoIterator<Item = Child>,
) -> Element {
    let mut props = props.into().unwrap_or_default();

    let mut flat = Vec::new();
    for child in children {
        child.flatten_into(&mut flat);
    }

    let elements = flat
        .into_iter()
        .filter_map(|child| match child {
            Child::Element(element) => Some(element),
            Child::Text(text) => Some(create_text_element(text)),
            Child::Many(_) | Child::Skip => None,
        })
        .collect();

    props.set_children(elements);
    Element::new(kind.into(), props)
}

// =============================================================================
// Tests
// =============================================================================
