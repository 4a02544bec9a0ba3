//! Commit scheduler - deferred native mutations around commit boundaries.
//!
//! The driving framework brackets every reconciliation pass with
//! [`CommitScheduler::begin_commit`] / [`CommitScheduler::end_commit`].
//! Native mutations raised inside the bracket are not executed on the spot;
//! they are queued and flushed once the outermost `end_commit` closes the
//! pass. Destructive callbacks (detaches) run at [`Priority::High`] so that a
//! widget being moved is fully released before any constructive callback
//! could hand it to a second parent - many native containers reject that
//! transient double-parent state.
//!
//! Everything is single-threaded; "deferred" means reordered within one
//! thread, never parallel. The queue is drained synchronously when the
//! outermost commit ends: High before Normal, registration order within a
//! class, and flush N completes before flush N+1 begins.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

// =============================================================================
// Scheduled Callback
// =============================================================================

/// A callback handed to the scheduler.
///
/// Identity is the underlying allocation: cloning the handle and scheduling
/// it twice within one commit collapses to a single execution. Nodes that
/// want that collapsing keep one handle alive and re-schedule it; ad-hoc
/// closures get a fresh identity each time.
#[derive(Clone)]
pub struct ScheduledCallback(Rc<dyn Fn()>);

impl ScheduledCallback {
    /// Wrap a closure.
    pub fn new(callback: impl Fn() + 'static) -> Self {
        Self(Rc::new(callback))
    }

    /// Identity key for dedup.
    fn key(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Execute the callback.
    fn run(&self) {
        (self.0)();
    }
}

/// Priority class of a scheduled callback.
///
/// Within one flush every `High` callback completes before any `Normal`
/// callback runs; registration order is kept inside each class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    High,
    #[default]
    Normal,
}

// =============================================================================
// Scheduler
// =============================================================================

#[derive(Default)]
struct State {
    depth: usize,
    high: Vec<ScheduledCallback>,
    normal: Vec<ScheduledCallback>,
    seen: HashSet<usize>,
}

/// The commit-depth counter and its two pending queues.
///
/// # Example
///
/// ```
/// use graft::scheduler::{CommitScheduler, Priority, ScheduledCallback};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let scheduler = CommitScheduler::new();
/// let log = Rc::new(RefCell::new(Vec::new()));
///
/// scheduler.begin_commit();
/// let log_attach = log.clone();
/// scheduler.schedule_after_commit(
///     ScheduledCallback::new(move || log_attach.borrow_mut().push("attach")),
///     Priority::Normal,
/// );
/// let log_detach = log.clone();
/// scheduler.schedule_after_commit(
///     ScheduledCallback::new(move || log_detach.borrow_mut().push("detach")),
///     Priority::High,
/// );
/// scheduler.end_commit();
///
/// // The detach ran first even though it was scheduled second.
/// assert_eq!(*log.borrow(), vec!["detach", "attach"]);
/// ```
#[derive(Default)]
pub struct CommitScheduler {
    state: RefCell<State>,
}

impl CommitScheduler {
    /// Create a scheduler at depth 0 with empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter one level of commit. Nests.
    pub fn begin_commit(&self) {
        self.state.borrow_mut().depth += 1;
    }

    /// Leave one level of commit; the outermost level flushes the queues.
    ///
    /// An `end_commit` with no matching `begin_commit` resets the depth to 0
    /// instead of going negative - this only happens in harness reset paths
    /// and is deliberately not an error.
    pub fn end_commit(&self) {
        let flush = {
            let mut state = self.state.borrow_mut();
            if state.depth == 0 {
                tracing::debug!("end_commit without begin_commit, depth reset");
                false
            } else {
                state.depth -= 1;
                state.depth == 0
            }
        };

        if flush {
            self.flush();
        }
    }

    /// Current nesting depth. Zero means mutations run immediately.
    pub fn depth(&self) -> usize {
        self.state.borrow().depth
    }

    /// Run a callback after the current commit, or immediately when no
    /// commit is open.
    ///
    /// Scheduling the same [`ScheduledCallback`] handle twice within one
    /// commit queues it once; the first registration fixes both its priority
    /// class and its position.
    pub fn schedule_after_commit(&self, callback: ScheduledCallback, priority: Priority) {
        let run_now = {
            let mut state = self.state.borrow_mut();
            if state.depth == 0 {
                true
            } else {
                if state.seen.insert(callback.key()) {
                    match priority {
                        Priority::High => state.high.push(callback.clone()),
                        Priority::Normal => state.normal.push(callback.clone()),
                    }
                }
                false
            }
        };

        if run_now {
            callback.run();
        }
    }

    /// Drain both queues: High first, then Normal, registration order within
    /// each class. Runs with no borrow held so callbacks may re-enter the
    /// scheduler; at depth 0 anything they schedule executes immediately,
    /// inside this flush, before the next one can begin.
    fn flush(&self) {
        let (high, normal) = {
            let mut state = self.state.borrow_mut();
            state.seen.clear();
            (
                std::mem::take(&mut state.high),
                std::mem::take(&mut state.normal),
            )
        };

        let count = high.len() + normal.len();
        if count > 0 {
            tracing::trace!(callbacks = count, "flushing commit queue");
        }

        for callback in high.iter().chain(normal.iter()) {
            callback.run();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
