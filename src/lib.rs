//! # luna
//!
//! Fiber-based declarative UI reconciler for Rust.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) for the
//! invalidation trigger.
//!
//! ## Architecture
//!
//! luna turns immutable element trees into a mutable fiber tree, diffs that
//! tree against the last committed one position by position, and commits the
//! resulting host mutations in one uninterrupted pass. The walk that builds
//! the pending tree is an explicit cursor, so it runs in slices between other
//! work:
//! ```text
//! Element tree → reconcile (sliced, resumable) → commit → HostSurface
//!       ▲                                                    │
//!       └────────── Observable write → dispatch ◀────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Core types (Element, Props, PropValue, HostNode, etc.)
//! - [`primitives`] - Element builder and components
//! - [`state`] - Observables, controllers, context
//! - [`engine`] - Fiber arena, controller registry, reconciler
//! - [`host`] - Host surface contract, prop patching, in-memory host
//! - [`pipeline`] - Render cycles, work loop, commit, scheduler
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use luna::*;
//!
//! struct Counter { count: i64 }
//! impl Controller for Counter {}
//!
//! let counter = connect(
//!     &component("Counter", |props| {
//!         let state = props.controller::<Counter>().unwrap();
//!         let count = state.with(|c| c.count);
//!         create_element("p", None, children![format!("count: {count}")])
//!     }),
//!     |_| Counter { count: 0 },
//! );
//!
//! let host = MemoryHost::new();
//! let container = host.create_container("main");
//! let queue = IdleQueue::new();
//! install_host(host.clone())?;
//! render(create_element(&counter, None, children![]), container)?;
//! start(Rc::new(queue.clone()));
//! queue.run_until_idle(&Unbounded, 16);
//! ```

pub mod engine;
pub mod error;
pub mod host;
pub mod pipeline;
pub mod primitives;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{HostError, RenderError};

pub use engine::{
    connect, disconnect, get_state_controller, is_connected, reconcile_children, reset_registry,
    EffectTag, Fiber, FiberId, FiberTree, Removals,
};

pub use host::{
    create_host_node, event_type, update_host_node, HostSurface, MemoryHost, Mutation, NodeKind,
    PatchFlags,
};

pub use pipeline::{
    config, dispatch, install_host, is_idle, render, render_stats, reset_config, reset_runtime,
    set_config, start, with_committed_tree, with_pending_tree, work_loop, Deadline, FrameBudget,
    IdleCallback, IdleQueue, IdleScheduler, RenderStats, RuntimeConfig, SliceReport, Unbounded,
};

pub use primitives::{
    component, create_element, create_text_element, to_kebab_case, Child, Component, ComponentId,
    RenderFn, RenderProps,
};

pub use state::{
    create_context, invalidation_signal, observable, write_count, Context, ContextValue, Controller,
    ControllerRef, Observable,
};
