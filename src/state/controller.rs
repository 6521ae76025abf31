//! Controllers - Stateful objects behind component fibers.
//!
//! A controller is created once, when its component fiber is first built,
//! and then carried forward by reference on every UPDATE. It lives inside an
//! [`Observable`], so writes to it trigger a re-render.
//!
//! Lifecycle hooks are associated functions that receive the controller's
//! own observable. A hook that wants a re-render writes through it; a hook
//! that only reads does not cause one.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use super::observable::Observable;

// =============================================================================
// Controller Trait
// =============================================================================

/// State backing a component. Every hook is optional.
pub trait Controller: 'static {
    /// After the component's host node is attached (CREATE or REPLACE).
    fn on_mount(_this: &Observable<Self>)
    where
        Self: Sized,
    {
    }

    /// After the component was re-rendered and its node patched.
    fn after_update(_this: &Observable<Self>)
    where
        Self: Sized,
    {
    }

    /// After the component's host node was removed.
    fn on_destroy(_this: &Observable<Self>)
    where
        Self: Sized,
    {
    }
}

/// Object-safe view of the hooks.
trait Lifecycle {
    fn mount(&self);
    fn updated(&self);
    fn destroy(&self);
}

impl<T: Controller> Lifecycle for Observable<T> {
    fn mount(&self) {
        T::on_mount(self);
    }

    fn updated(&self) {
        T::after_update(self);
    }

    fn destroy(&self) {
        T::on_destroy(self);
    }
}

// =============================================================================
// ControllerRef
// =============================================================================

/// Type-erased controller handle carried by fibers.
#[derive(Clone)]
pub struct ControllerRef {
    any: Rc<dyn Any>,
    lifecycle: Rc<dyn Lifecycle>,
    type_name: &'static str,
}

impl ControllerRef {
    pub fn new<T: Controller>(state: Observable<T>) -> Self {
        let shared = Rc::new(state);
        Self {
            any: shared.clone(),
            lifecycle: shared,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The controller as its concrete type.
    pub fn downcast<T: Controller>(&self) -> Option<Observable<T>> {
        self.any.downcast_ref::<Observable<T>>().cloned()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether both handles point at the same controller instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.any, &other.any)
    }

    pub(crate) fn on_mount(&self) {
        self.lifecycle.mount();
    }

    pub(crate) fn after_update(&self) {
        self.lifecycle.updated();
    }

    pub(crate) fn on_destroy(&self) {
        self.lifecycle.destroy();
    }
}

impl fmt::Debug for ControllerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ControllerRef<{}>({:p})", self.type_name, Rc::as_ptr(&self.any))
    }
}

// =============================================================================
// Tests
// =============================================================================
