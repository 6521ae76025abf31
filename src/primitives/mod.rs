//! Primitives - Element building blocks.
//!
//! This module provides what callers describe a UI with:
//! - [`create_element`] - Host tag or component element with props and children
//! - [`create_text_element`] - Text leaf
//! - [`component`] - Named render function (with optional controller via `connect`)
//!
//! Elements are immutable descriptions. They are created fresh on every
//! render and consumed by the reconciler, which turns them into fibers.

mod component;
mod element;
mod text;
mod types;

pub use component::{component, to_kebab_case, Component, ComponentId, RenderFn, RenderProps};
pub use element::create_element;
pub use text::create_text_element;
pub use types::Child;
