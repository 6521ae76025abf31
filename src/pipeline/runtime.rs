//! Runtime - Render cycle state and the entry points that seed cycles.
//!
//! One runtime per thread holds the committed root, the work-in-progress
//! root, the resumable cursor and the removal lists. At most one cycle is in
//! flight: seeding a new one (through [`render`] or [`dispatch`]) abandons
//! whatever walk was in progress.
//!
//! User code runs in the middle of a unit of work (render functions,
//! controller constructors). An observable write from there cannot seed a
//! cycle while the runtime is borrowed, so it is parked in a pending flag
//! and seeded as soon as the runtime is released.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use spark_signals::effect;

use crate::engine::{Fiber, FiberId, FiberTree, Removals};
use crate::error::RenderError;
use crate::host::HostSurface;
use crate::state::invalidation_signal;
use crate::types::{Element, HostNode, Props};

// =============================================================================
// Runtime State
// =============================================================================

/// Counters over the lifetime of a runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Cycles seeded by `render` or `dispatch`.
    pub cycles_started: u64,
    pub commits: u64,
    /// Cycles dropped because of an error.
    pub aborted: u64,
}

pub(crate) struct Runtime {
    pub(crate) host: Option<Box<dyn HostSurface>>,
    pub(crate) tree: FiberTree,
    pub(crate) current_root: Option<FiberId>,
    pub(crate) wip_root: Option<FiberId>,
    pub(crate) next_unit: Option<FiberId>,
    pub(crate) removals: Removals,
    pub(crate) stats: RenderStats,
}

impl Runtime {
    fn new() -> Self {
        Self {
            host: None,
            tree: FiberTree::new(),
            current_root: None,
            wip_root: None,
            next_unit: None,
            removals: Removals::default(),
            stats: RenderStats::default(),
        }
    }

    /// Make `root` the cycle in flight, dropping any previous one.
    fn begin_cycle(&mut self, root: FiberId) {
        if self.wip_root.is_some() {
            log::debug!("abandoning unfinished render cycle");
        }
        self.wip_root = Some(root);
        self.next_unit = Some(root);
        self.removals.clear();
        self.stats.cycles_started += 1;
    }

    /// New cycle rooted at the committed tree. No-op before the first commit.
    fn seed_from_current(&mut self) -> bool {
        let Some(current) = self.current_root else {
            return false;
        };
        let committed = &self.tree[current];
        let Some(dom) = committed.dom else {
            return false;
        };

        let mut root = Fiber::root(dom, committed.props.clone(), Some(current));
        root.kind = committed.kind.clone();
        root.controller = committed.controller.clone();
        let root = self.tree.insert(root);

        self.begin_cycle(root);
        log::debug!("render cycle {} seeded from committed root", self.stats.cycles_started);
        true
    }

    /// Drop the cycle in flight after `err`; the committed tree stays.
    pub(crate) fn abort(&mut self, err: &RenderError) {
        log::debug!("dropping render cycle: {err}");
        self.wip_root = None;
        self.next_unit = None;
        self.removals.clear();
        self.stats.aborted += 1;
        match self.current_root {
            Some(root) => {
                self.tree.retain_reachable(root);
            }
            None => self.tree.clear(),
        }
    }
}

thread_local! {
    static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new());

    /// A dispatch arrived while the runtime was borrowed.
    static DISPATCH_PENDING: Cell<bool> = const { Cell::new(false) };

    /// Stop function of the render-trigger effect.
    static TRIGGER: RefCell<Option<Box<dyn FnOnce()>>> = const { RefCell::new(None) };
}

/// Run `f` with exclusive access to the runtime.
pub(crate) fn with_runtime<R>(f: impl FnOnce(&mut Runtime) -> R) -> Result<R, RenderError> {
    RUNTIME.with(|runtime| {
        let mut runtime = runtime.try_borrow_mut().map_err(|_| RenderError::Reentrant)?;
        Ok(f(&mut runtime))
    })
}

// =============================================================================
// Entry Points
// =============================================================================

/// Install the host surface every later cycle renders to.
pub fn install_host(host: impl HostSurface + 'static) -> Result<(), RenderError> {
    with_runtime(|runtime| runtime.host = Some(Box::new(host)))
}

/// Seed the first cycle: render `element` into `container`.
///
/// Nothing reaches the host until the scheduler has walked the whole tree
/// and committed it. Calling `render` again starts over from the committed
/// tree, abandoning any cycle in flight.
///
/// # Example
///
/// ```ignore
/// let host = MemoryHost::new();
/// let container = host.create_container("main");
/// install_host(host.clone())?;
/// render(create_element("div", None, children!["hi"]), container)?;
/// start(Rc::new(queue.clone()));
/// ```
pub fn render(element: Element, container: HostNode) -> Result<(), RenderError> {
    with_runtime(|runtime| {
        if runtime.host.is_none() {
            return Err(RenderError::HostNotInstalled);
        }
        let mut props = Props::new();
        props.set_children(vec![element]);
        let root = runtime
            .tree
            .insert(Fiber::root(container, Rc::new(props), runtime.current_root));
        runtime.begin_cycle(root);
        log::debug!("render cycle {} seeded into {container}", runtime.stats.cycles_started);
        Ok(())
    })??;

    install_trigger();
    Ok(())
}

/// Seed a new cycle from the committed root.
///
/// Called by the render trigger on every observable write. If the runtime
/// is busy the request is parked and replayed once it is released; several
/// parked requests collapse into one cycle.
pub fn dispatch() {
    let seeded = RUNTIME.with(|runtime| match runtime.try_borrow_mut() {
        Ok(mut runtime) => Some(runtime.seed_from_current()),
        Err(_) => None,
    });
    if seeded.is_none() {
        if !DISPATCH_PENDING.with(|pending| pending.replace(true)) {
            log::warn!("state written during a unit of work; re-render deferred");
        }
    }
}

/// Replay a parked dispatch, if any.
pub(crate) fn flush_pending_dispatch() {
    if DISPATCH_PENDING.with(|pending| pending.replace(false)) {
        dispatch();
    }
}

/// Subscribe `dispatch` to the invalidation signal, once per thread.
fn install_trigger() {
    TRIGGER.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let invalidation = invalidation_signal();
        let mut primed = false;
        let stop = effect(move || {
            invalidation.get();
            // The first run only registers the dependency.
            if primed {
                dispatch();
            }
            primed = true;
        });
        *slot.borrow_mut() = Some(Box::new(stop));
    });
}

// =============================================================================
// Inspection
// =============================================================================

/// Counters of the thread's runtime.
pub fn render_stats() -> RenderStats {
    RUNTIME.with(|runtime| {
        runtime
            .try_borrow()
            .map(|runtime| runtime.stats)
            .unwrap_or_default()
    })
}

/// No cycle in flight and none parked.
pub fn is_idle() -> bool {
    let pending = DISPATCH_PENDING.with(Cell::get);
    let quiet = RUNTIME.with(|runtime| {
        runtime
            .try_borrow()
            .is_ok_and(|runtime| runtime.wip_root.is_none())
    });
    quiet && !pending
}

/// Read the committed tree. `None` before the first commit.
pub fn with_committed_tree<R>(f: impl FnOnce(&FiberTree, FiberId) -> R) -> Option<R> {
    RUNTIME.with(|runtime| {
        let runtime = runtime.try_borrow().ok()?;
        let root = runtime.current_root?;
        Some(f(&runtime.tree, root))
    })
}

/// Read the tree of the cycle in flight, if there is one.
pub fn with_pending_tree<R>(f: impl FnOnce(&FiberTree, FiberId) -> R) -> Option<R> {
    RUNTIME.with(|runtime| {
        let runtime = runtime.try_borrow().ok()?;
        let root = runtime.wip_root?;
        Some(f(&runtime.tree, root))
    })
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Drop all runtime state, the host and the render trigger (for testing).
pub fn reset_runtime() {
    if let Some(stop) = TRIGGER.with(|slot| slot.borrow_mut().take()) {
        stop();
    }
    DISPATCH_PENDING.with(|pending| pending.set(false));
    RUNTIME.with(|runtime| *runtime.borrow_mut() = Runtime::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::children;
    use crate::host::MemoryHost;
    use crate::primitives::create_element;
    use crate::state::Observable;

    fn setup() -> (MemoryHost, HostNode) {
        reset_runtime();
        let host = MemoryHost::new();
        let container = host.create_container("main");
        install_host(host.clone()).unwrap();
        (host, container)
    }

    #[test]
    fn test_render_requires_host() {
        reset_runtime();
        let err = render(create_element("div", None, children![]), HostNode::from_raw(1)).unwrap_err();
        assert!(matches!(err, RenderError::HostNotInstalled));
    }

    #[test]
    fn test_render_seeds_cycle() {
        let (host, container) = setup();
        assert!(is_idle());

        render(create_element("div", None, children!["hi"]), container).unwrap();

        assert!(!is_idle());
        assert_eq!(render_stats().cycles_started, 1);
        assert!(with_committed_tree(|_, _| ()).is_none());
        let root_dom = with_pending_tree(|tree, root| tree[root].dom);
        assert_eq!(root_dom, Some(Some(container)));
        // Nothing touches the host before the walk.
        assert!(host.journal().is_empty());
    }

    #[test]
    fn test_dispatch_without_committed_root_is_noop() {
        let _ = setup();
        dispatch();
        assert!(is_idle());
        assert_eq!(render_stats().cycles_started, 0);
    }

    #[test]
    fn test_busy_dispatch_is_parked_once() {
        let _ = setup();
        RUNTIME.with(|runtime| {
            let _busy = runtime.borrow_mut();
            dispatch();
            dispatch();
        });
        assert!(DISPATCH_PENDING.with(Cell::get));
        assert!(!is_idle());

        flush_pending_dispatch();
        assert!(!DISPATCH_PENDING.with(Cell::get));
    }

    #[test]
    fn test_entry_points_reject_reentry() {
        let (_, container) = setup();
        let result = RUNTIME.with(|runtime| {
            let _busy = runtime.borrow_mut();
            render(create_element("div", None, children![]), container)
        });
        assert!(matches!(result, Err(RenderError::Reentrant)));
    }

    #[test]
    fn test_writes_before_first_commit_do_not_seed() {
        let (_, container) = setup();
        render(create_element("div", None, children![]), container).unwrap();
        let started = render_stats().cycles_started;

        Observable::new(0).set(1);

        // No committed root yet: the trigger fires but has nothing to seed from.
        assert_eq!(render_stats().cycles_started, started);
    }
}
