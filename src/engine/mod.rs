//! Engine - Fiber tree, controller registry and reconciler.
//!
//! The engine owns the data the scheduler works on:
//! - Fiber: arena of fibers for the committed and pending trees
//! - Registry: component identity to controller constructor
//! - Reconcile: positional diff producing effect-tagged fibers
//!
//! # Architecture
//!
//! Fibers are NOT owned by their parents. They are slots in one arena,
//! linked by `FiberId`:
//!
//! ```text
//! committed:  root ─▶ div ─▶ "count: 0"
//!              ▲       ▲        ▲
//!          alternate alternate alternate
//!              │       │        │
//! pending:    root ─▶ div ─▶ "count: 1"   (UPDATE, UPDATE)
//! ```
//!
//! After a commit the pending tree becomes the committed tree and every
//! fiber no longer reachable from it is freed.

mod fiber;
mod reconcile;
mod registry;

pub use fiber::*;
pub use reconcile::*;
pub use registry::*;
