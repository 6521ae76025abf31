//! Text Primitive - Leaf elements carrying a string.
//!
//! Text elements have no children. Their text sits in props under
//! `nodeValue`, so a host patches it like any other attribute and two text
//! elements at the same position always match as the same type.
//!
//! # Example
//!
//! ```ignore
//! use luna::primitives::create_text_element;
//!
//! let hello = create_text_element("Hello, World!");
//! assert_eq!(hello.text(), Some("Hello, World!"));
//! ```

use crate::types::{Element, ElementKind, Props, NODE_VALUE};

// =============================================================================
// Text Element
// =============================================================================

/// Create a text element.
pub fn create_text_element(text: impl Into<String>) -> Element {
    let props = Props::new().with(NODE_VALUE, text.into());
    Element::new(ElementKind::Text, props)
}

// =============================================================================
// Tests
// =============================================================================
