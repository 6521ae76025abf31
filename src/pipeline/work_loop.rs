//! Work Loop - Resumable depth-first walk over the pending tree.
//!
//! # Architecture
//!
//! The walk is a cursor (`next_unit`), not recursion, so it can stop after
//! any unit and pick up again in a later idle slot:
//!
//! ```text
//! slice 1:  root ─▶ app ─▶ div          (deadline hit, yield)
//! slice 2:  "count: 1" ─▶ button        (cursor exhausted)
//!           commit                      (all or nothing)
//! ```
//!
//! A unit of work for a fiber:
//! - component: run its render function, create the wrapping host node if
//!   missing, reconcile the single rendered element
//! - host tag or text: create the host node if missing, reconcile
//!   `props.children`
//!
//! Host nodes made here stay detached until commit attaches them.

use std::rc::Rc;

use super::commit::commit_root;
use super::config::config;
use super::runtime::{flush_pending_dispatch, with_runtime, Runtime};
use super::scheduler::Deadline;
use crate::engine::reconcile_children;
use crate::error::RenderError;
use crate::host::create_host_node;
use crate::primitives::RenderProps;
use crate::types::Element;

/// What one slice of the work loop did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SliceReport {
    pub units_performed: usize,
    /// The cycle finished and was committed in this slice.
    pub committed: bool,
    /// Work remains for a later slice.
    pub yielded: bool,
}

/// Run units of work until the deadline runs low, then commit if the walk
/// is complete.
///
/// At least one unit runs per slice when work is pending. On error the
/// cycle in flight is dropped, the committed tree stays as it was and the
/// error is returned.
pub fn work_loop(deadline: &dyn Deadline) -> Result<SliceReport, RenderError> {
    flush_pending_dispatch();
    let config = config();
    let mut report = SliceReport::default();

    while with_runtime(|runtime| runtime.next_unit.is_some())? {
        with_runtime(|runtime| {
            let result = runtime.perform_next_unit();
            if let Err(err) = &result {
                runtime.abort(err);
            }
            result
        })??;
        report.units_performed += 1;
        flush_pending_dispatch();

        let out_of_time = deadline.time_remaining() < config.yield_threshold_ms;
        let out_of_units = config
            .max_units_per_slice
            .is_some_and(|max| report.units_performed >= max);
        if out_of_time || out_of_units {
            report.yielded = with_runtime(|runtime| runtime.next_unit.is_some())?;
            break;
        }
    }

    if with_runtime(|runtime| runtime.next_unit.is_none() && runtime.wip_root.is_some())? {
        commit_root()?;
        report.committed = true;
    }

    if report.units_performed > 0 {
        log::trace!("work slice: {report:?}");
    }
    Ok(report)
}

impl Runtime {
    /// Process the fiber under the cursor and advance the cursor.
    pub(crate) fn perform_next_unit(&mut self) -> Result<(), RenderError> {
        let Some(id) = self.next_unit else {
            return Ok(());
        };
        let Runtime {
            host,
            tree,
            removals,
            next_unit,
            ..
        } = self;
        let host = host.as_deref_mut().ok_or(RenderError::HostNotInstalled)?;

        let fiber = &tree[id];
        let rendered: Option<Element> = fiber.component().map(|component| {
            let props = RenderProps::new(&fiber.props, fiber.controller.as_ref(), fiber.context.as_ref());
            component.render(&props)
        });

        if tree[id].dom.is_none() {
            let node = {
                let fiber = &tree[id];
                let kind = fiber
                    .kind
                    .as_ref()
                    .ok_or_else(|| RenderError::MalformedTree("root fiber without a host node".into()))?;
                create_host_node(host, kind, &fiber.props)?
            };
            tree[id].dom = Some(node);
        }

        match rendered {
            Some(element) => reconcile_children(tree, removals, id, std::slice::from_ref(&element)),
            None => {
                let props = Rc::clone(&tree[id].props);
                reconcile_children(tree, removals, id, props.children());
            }
        }

        *next_unit = tree.next_unit(id);
        log::trace!("unit {id:?} done, next {:?}", *next_unit);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
