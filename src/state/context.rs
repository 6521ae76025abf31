//! Context - Named observables inherited down the fiber tree.
//!
//! A fiber inherits the context of its parent unless its element sets one
//! through `Props::context`. Every entry is an independent [`Observable`],
//! so writing to any of them re-renders like a controller write does.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::observable::Observable;

/// One context entry.
#[derive(Clone)]
pub struct ContextValue {
    value: Rc<dyn Any>,
}

impl ContextValue {
    /// Wrap a plain value into a fresh observable.
    pub fn new<T: 'static>(value: T) -> Self {
        Self::from_observable(Observable::new(value))
    }

    /// Share an existing observable.
    pub fn from_observable<T: 'static>(state: Observable<T>) -> Self {
        Self {
            value: Rc::new(state),
        }
    }

    pub fn downcast<T: 'static>(&self) -> Option<Observable<T>> {
        self.value.downcast_ref::<Observable<T>>().cloned()
    }
}

/// Inherited mapping from name to observable.
#[derive(Clone, Default)]
pub struct Context {
    entries: Rc<HashMap<String, ContextValue>>,
}

impl Context {
    /// Entry `name` as an observable of `T`.
    ///
    /// `None` if the name is missing or holds another type.
    pub fn get<T: 'static>(&self, name: &str) -> Option<Observable<T>> {
        self.entries.get(name).and_then(ContextValue::downcast)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Whether both handles share the same entry table.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("Context").field("entries", &names).finish()
    }
}

/// Build a context. Each entry is wrapped independently.
///
/// # Example
///
/// ```ignore
/// use luna::state::{create_context, ContextValue};
///
/// let context = create_context([
///     ("theme", ContextValue::new(Theme::dark())),
///     ("user", ContextValue::new(User::anonymous())),
/// ]);
/// let theme = context.get::<Theme>("theme").unwrap();
/// ```
pub fn create_context<K: Into<String>>(entries: impl IntoIterator<Item = (K, ContextValue)>) -> Context {
    Context {
        entries: Rc::new(entries.into_iter().map(|(k, v)| (k.into(), v)).collect()),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::observable::write_count;

    #[derive(Debug, Clone, PartialEq)]
    struct Theme {
        accent: &'static str,
    }

    #[test]
    fn test_entries_are_typed() {
        let context = create_context([
            ("theme", ContextValue::new(Theme { accent: "blue" })),
            ("count", ContextValue::new(3_i32)),
        ]);

        assert_eq!(context.len(), 2);
        assert_eq!(context.get::<Theme>("theme").map(|t| t.get().accent), Some("blue"));
        assert_eq!(context.get::<i32>("count").map(|c| c.get()), Some(3));
        assert!(context.get::<i32>("theme").is_none());
        assert!(context.get::<i32>("missing").is_none());
    }

    #[test]
    fn test_entry_writes_invalidate() {
        let context = create_context([("count", ContextValue::new(0_i32))]);
        let before = write_count();

        if let Some(count) = context.get::<i32>("count") {
            count.update(|c| *c += 1);
        }

        assert_eq!(write_count(), before + 1);
        assert_eq!(context.get::<i32>("count").map(|c| c.get()), Some(1));
    }

    #[test]
    fn test_shared_observable_entry() {
        let shared = Observable::new(Theme { accent: "red" });
        let context = create_context([("theme", ContextValue::from_observable(shared.clone()))]);
        shared.set(Theme { accent: "green" });
        assert_eq!(context.get::<Theme>("theme").map(|t| t.get().accent), Some("green"));
    }
}
