//! Primitive types - Children accepted by the element builder.
//!
//! `Child` is what `create_element` takes for each child slot. It exists so
//! callers can mix elements, strings, numbers, conditionals and nested lists
//! in one children list and have them normalized in one place.

use crate::types::Element;

// =============================================================================
// Child
// =============================================================================

/// One entry of a children list before normalization.
#[derive(Debug, Clone)]
pub enum Child {
    /// Already an element.
    Element(Element),
    /// Becomes a text element.
    Text(String),
    /// Flattened into the parent list.
    Many(Vec<Child>),
    /// Dropped (`false`, `None`).
    Skip,
}

impl Child {
    /// Flatten into `out`, dropping skips at every nesting level.
    pub(crate) fn flatten_into(self, out: &mut Vec<Child>) {
        match self {
            Child::Skip => {}
            Child::Many(children) => {
                for child in children {
                    child.flatten_into(out);
                }
            }
            leaf => out.push(leaf),
        }
    }
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Child::Element(element)
    }
}

impl From<&Element> for Child {
    fn from(element: &Element) -> Self {
        Child::Element(element.clone())
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.to_string())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

impl From<&String> for Child {
    fn from(text: &String) -> Self {
        Child::Text(text.clone())
    }
}

macro_rules! child_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Child {
                fn from(value: $ty) -> Self {
                    Child::Text(value.to_string())
                }
            }
        )*
    };
}

child_from_number!(i32, i64, u32, u64, usize, f64);

/// `false` is the conditional-rendering idiom and is dropped; `true` is text.
impl From<bool> for Child {
    fn from(value: bool) -> Self {
        if value {
            Child::Text("true".to_string())
        } else {
            Child::Skip
        }
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(value: Option<T>) -> Self {
        value.map_or(Child::Skip, Into::into)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(values: Vec<T>) -> Self {
        Child::Many(values.into_iter().map(Into::into).collect())
    }
}

/// Build a `Vec<Child>` from heterogeneous values.
///
/// ```ignore
/// create_element("ul", None, children![header, "plain text", 42, show.then(|| footer)]);
/// ```
#[macro_export]
macro_rules! children {
    () => {
        ::std::vec::Vec::<$crate::primitives::Child>::new()
    };
    ($($child:expr),+ $(,)?) => {
        ::std::vec![$($crate::primitives::Child::from($child)),+]
    };
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_drops_skips_at_every_level() {
        let nested = Child::from(vec![
            Child::from("a"),
            Child::from(false),
            Child::from(vec![Child::from(false), Child::from("b")]),
            Child::from(None::<&str>),
        ]);
        let mut out = Vec::new();
        nested.flatten_into(&mut out);

        let texts: Vec<_> = out
            .iter()
            .map(|c| match c {
                Child::Text(t) => t.as_str(),
                _ => "?",
            })
            .collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_numbers_become_text() {
        assert!(matches!(Child::from(0), Child::Text(ref t) if t == "0"));
        assert!(matches!(Child::from(2.5), Child::Text(ref t) if t == "2.5"));
        assert!(matches!(Child::from(true), Child::Text(ref t) if t == "true"));
    }
}
