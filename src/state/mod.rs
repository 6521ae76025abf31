//! State Module - Reactive state behind components.
//!
//! - **Observable** - Shared state; every write invalidates the rendered tree
//! - **Controller** - Per-component state with optional lifecycle hooks
//! - **Context** - Named observables inherited down the tree
//!
//! Reactivity is deliberately coarse: any write anywhere schedules one
//! full render from the committed root. There are no per-field
//! subscriptions.

mod context;
mod controller;
mod observable;

pub use context::{create_context, Context, ContextValue};
pub use controller::{Controller, ControllerRef};
pub use observable::{invalidation_signal, observable, write_count, Observable};
