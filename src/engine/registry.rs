//! Controller Registry - Component identity to controller constructor.
//!
//! `connect` registers how to build the controller for a component.
//! `get_state_controller` is called by the reconciler whenever it builds a
//! component fiber from scratch (CREATE or REPLACE); UPDATE fibers reuse
//! the controller of the fiber they were matched with.
//!
//! A component without a registered constructor is fine: its fibers carry
//! no controller and its lifecycle hooks are skipped.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::primitives::{Component, ComponentId};
use crate::state::{Context, Controller, ControllerRef, Observable};
use crate::types::Element;

/// Builds a wrapped controller from the fiber's context.
type ControllerFactory = Rc<dyn Fn(Option<&Context>) -> ControllerRef>;

// =============================================================================
// Registry State
// =============================================================================

thread_local! {
    /// Map component identity to controller constructor.
    static CONTROLLERS: RefCell<HashMap<ComponentId, ControllerFactory>> = RefCell::new(HashMap::new());
}

// =============================================================================
// Registration
// =============================================================================

/// Register `constructor` as the controller of `component`.
///
/// The constructor receives the context the fiber inherits (or overrides).
/// Registering again replaces the previous constructor. Returns the
/// component so definitions can be written in one expression.
///
/// # Example
///
/// ```ignore
/// let counter = connect(
///     &component("Counter", render_counter),
///     |_context| CounterState { count: 0 },
/// );
/// ```
pub fn connect<T, F>(component: &Component, constructor: F) -> Component
where
    T: Controller,
    F: Fn(Option<&Context>) -> T + 'static,
{
    let factory: ControllerFactory =
        Rc::new(move |context: Option<&Context>| ControllerRef::new(Observable::new(constructor(context))));
    CONTROLLERS.with(|controllers| {
        controllers.borrow_mut().insert(component.id(), factory);
    });
    log::debug!("connected controller {} to <{}>", std::any::type_name::<T>(), component.name());
    component.clone()
}

/// Remove the constructor registered for `component`.
pub fn disconnect(component: &Component) -> bool {
    CONTROLLERS.with(|controllers| controllers.borrow_mut().remove(&component.id()).is_some())
}

/// Check if `component` has a registered constructor.
pub fn is_connected(component: &Component) -> bool {
    CONTROLLERS.with(|controllers| controllers.borrow().contains_key(&component.id()))
}

// =============================================================================
// Lookup
// =============================================================================

/// Build a fresh controller for `element`, if its kind is a connected
/// component.
pub fn get_state_controller(element: &Element, context: Option<&Context>) -> Option<ControllerRef> {
    let component = element.kind().as_component()?;

    // Clone the factory out so the constructor runs without the borrow held.
    let factory = CONTROLLERS.with(|controllers| controllers.borrow().get(&component.id()).cloned());
    match factory {
        Some(factory) => Some(factory(context)),
        None => {
            log::trace!("<{}> has no controller", component.name());
            None
        }
    }
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Forget every registration (for testing).
pub fn reset_registry() {
    CONTROLLERS.with(|controllers| controllers.borrow_mut().clear());
}
