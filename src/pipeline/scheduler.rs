//! Scheduler - Idle-time driving of the work loop.
//!
//! The core never decides when to run. A host scheduler offers idle slots,
//! each with a [`Deadline`], and [`start`] keeps one work-loop callback
//! registered with it at all times.
//!
//! [`IdleQueue`] is a scheduler that a driver pumps by hand: an event loop
//! calls `run_next` when it has spare time, tests call `run_until_idle`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

use super::runtime::is_idle;
use super::work_loop::work_loop;

// =============================================================================
// Deadline
// =============================================================================

/// Time left in the current idle slot.
pub trait Deadline {
    /// Milliseconds remaining.
    fn time_remaining(&self) -> f64;
}

/// Wall-clock budget starting at construction.
#[derive(Debug, Clone, Copy)]
pub struct FrameBudget {
    started: Instant,
    budget_ms: f64,
}

impl FrameBudget {
    pub fn new(budget_ms: f64) -> Self {
        Self {
            started: Instant::now(),
            budget_ms,
        }
    }
}

impl Deadline for FrameBudget {
    fn time_remaining(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64() * 1000.0;
        (self.budget_ms - elapsed).max(0.0)
    }
}

/// A slot that never runs out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> f64 {
        f64::INFINITY
    }
}

// =============================================================================
// Idle Scheduler
// =============================================================================

/// Work to run in an idle slot.
pub type IdleCallback = Box<dyn FnOnce(&dyn Deadline)>;

/// Source of idle slots.
pub trait IdleScheduler {
    /// Run `callback` once, the next time the host is idle.
    fn request_idle_callback(&self, callback: IdleCallback);
}

/// Register the work loop with `scheduler`, forever.
///
/// Every invocation runs one slice and registers the next one, whatever
/// the slice returned. Aborted cycles are logged here.
pub fn start(scheduler: Rc<dyn IdleScheduler>) {
    let next = scheduler.clone();
    scheduler.request_idle_callback(Box::new(move |deadline: &dyn Deadline| {
        if let Err(err) = work_loop(deadline) {
            log::error!("render cycle aborted: {err}");
        }
        start(next);
    }));
}

/// FIFO scheduler pumped by its owner.
#[derive(Clone, Default)]
pub struct IdleQueue {
    pending: Rc<RefCell<VecDeque<IdleCallback>>>,
}

impl IdleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Run the oldest callback. Returns `false` if none was queued.
    pub fn run_next(&self, deadline: &dyn Deadline) -> bool {
        // Popped before running: the callback re-registers itself.
        let next = self.pending.borrow_mut().pop_front();
        match next {
            Some(callback) => {
                callback(deadline);
                true
            }
            None => false,
        }
    }

    /// Run callbacks until the runtime has no cycle in flight, at most
    /// `limit` of them. Returns how many ran.
    pub fn run_until_idle(&self, deadline: &dyn Deadline, limit: usize) -> usize {
        let mut ran = 0;
        while ran < limit && !is_idle() {
            if !self.run_next(deadline) {
                break;
            }
            ran += 1;
        }
        ran
    }
}

impl IdleScheduler for IdleQueue {
    fn request_idle_callback(&self, callback: IdleCallback) {
        self.pending.borrow_mut().push_back(callback);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_frame_budget_counts_down() {
        let budget = FrameBudget::new(50.0);
        let remaining = budget.time_remaining();
        assert!(remaining <= 50.0 && remaining >= 0.0);
        assert_eq!(FrameBudget::new(0.0).time_remaining(), 0.0);
        assert!(Unbounded.time_remaining().is_infinite());
    }

    #[test]
    fn test_idle_queue_is_fifo() {
        let queue = IdleQueue::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let order = order.clone();
            queue.request_idle_callback(Box::new(move |_: &dyn Deadline| order.borrow_mut().push(i)));
        }

        assert_eq!(queue.len(), 3);
        while queue.run_next(&Unbounded) {}
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_callback_sees_deadline() {
        let queue = IdleQueue::new();
        let seen = Rc::new(Cell::new(-1.0));
        let slot = seen.clone();
        queue.request_idle_callback(Box::new(move |deadline: &dyn Deadline| slot.set(deadline.time_remaining())));

        queue.run_next(&FrameBudget::new(0.0));
        assert_eq!(seen.get(), 0.0);
    }

    #[test]
    fn test_start_keeps_one_callback_registered() {
        let queue = IdleQueue::new();
        start(Rc::new(queue.clone()));
        assert_eq!(queue.len(), 1);

        for _ in 0..3 {
            assert!(queue.run_next(&Unbounded));
            assert_eq!(queue.len(), 1);
        }
    }
}
