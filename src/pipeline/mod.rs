//! Render Pipeline
//!
//! This module drives render cycles from seeding to commit.
//!
//! # Pipeline Architecture
//!
//! ```text
//! render / dispatch → pending root → work_loop (sliced) → commit → hooks
//!        ▲                                                          │
//!        └──────────────── observable write ◀───────────────────────┘
//! ```
//!
//! ## Data Flow
//!
//! 1. **runtime** - Seeds cycles, holds the committed and pending roots
//! 2. **work_loop** - One unit of work per fiber, yields on the deadline
//! 3. **commit** - Applies every effect at once, then runs lifecycle hooks
//! 4. **scheduler** - Keeps the work loop registered with an idle scheduler
//!
//! ## Key Design Principles
//!
//! - **All or nothing**: the host sees nothing of a cycle until it commits
//! - **One cycle in flight**: a new seed abandons the walk in progress
//! - **Global invalidation**: any observable write re-renders from the root

pub mod config;
mod commit;
mod runtime;
mod scheduler;
mod work_loop;

pub use config::{config, reset_config, set_config, RuntimeConfig};
pub use runtime::{
    dispatch, install_host, is_idle, render, render_stats, reset_runtime, with_committed_tree,
    with_pending_tree, RenderStats,
};
pub use scheduler::{start, Deadline, FrameBudget, IdleCallback, IdleQueue, IdleScheduler, Unbounded};
pub use work_loop::{work_loop, SliceReport};
