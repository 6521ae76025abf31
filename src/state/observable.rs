//! Observable - Mutable state whose writes invalidate the rendered tree.
//!
//! An `Observable<T>` is a shared, interior-mutable cell. Reads go through
//! [`Observable::with`] or [`Observable::get`]; writes go through
//! [`Observable::update`] or [`Observable::set`], and every write bumps the
//! thread's invalidation signal.
//!
//! Invalidation is global: nothing tracks which fields a component read.
//! The render trigger (installed by the pipeline) observes the signal and
//! schedules a full render from the committed root. The reconciler's diff
//! is what keeps the resulting host mutations small.
//!
//! # Example
//!
//! ```ignore
//! use luna::state::Observable;
//!
//! struct Counter { count: i64 }
//! impl Counter {
//!     fn increment(&mut self) { self.count += 1; }
//!     fn label(&self) -> String { format!("count: {}", self.count) }
//! }
//!
//! let counter = Observable::new(Counter { count: 0 });
//! counter.update(Counter::increment);            // one write, one invalidation
//! assert_eq!(counter.with(Counter::label), "count: 1");
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use spark_signals::{signal, Signal};

// =============================================================================
// Invalidation Signal
// =============================================================================

thread_local! {
    /// Total writes seen on this thread.
    static WRITE_COUNT: Cell<u64> = const { Cell::new(0) };

    /// Root signal the render trigger subscribes to.
    static INVALIDATION: Signal<u64> = signal(0);
}

/// Record a write and notify subscribers of the invalidation signal.
pub(crate) fn notify_write() {
    let generation = WRITE_COUNT.with(|count| {
        let next = count.get() + 1;
        count.set(next);
        next
    });
    INVALIDATION.with(|s| s.set(generation));
}

/// Number of observable writes on this thread so far.
pub fn write_count() -> u64 {
    WRITE_COUNT.with(Cell::get)
}

/// The invalidation signal, for reactive tracking.
pub fn invalidation_signal() -> Signal<u64> {
    INVALIDATION.with(|s| s.clone())
}

// =============================================================================
// Observable
// =============================================================================

/// Shared state whose writes trigger a re-render.
///
/// Borrowing rules are the `RefCell` ones: reading the same observable from
/// inside its own `update` closure panics.
pub struct Observable<T> {
    inner: Rc<RefCell<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(value)),
        }
    }

    /// Run `f` against the current value. Method calls made this way get
    /// the real receiver and their result is returned untouched.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow())
    }

    /// Clone out the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.borrow().clone()
    }

    /// Mutate the value. Always counts as one write, whatever `f` does.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let mut value = self.inner.borrow_mut();
            f(&mut value)
        };
        notify_write();
        result
    }

    /// Replace the value.
    pub fn set(&self, value: T) {
        self.update(|current| *current = value);
    }

    /// Whether both handles share the same state.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(value) => f.debug_tuple("Observable").field(&*value).finish(),
            Err(_) => f.write_str("Observable(<borrowed>)"),
        }
    }
}

/// Wrap a bare constructor so every instance it builds is observable.
///
/// For state that does not need a context (and so does not go through
/// `connect`).
pub fn observable<T: 'static>(constructor: impl Fn() -> T) -> impl Fn() -> Observable<T> {
    move || Observable::new(constructor())
}

// =============================================================================
// Tests
// =============================================================================
