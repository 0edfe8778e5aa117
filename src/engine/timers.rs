//! Timer Source - Cooperative one-shot timers.
//!
//! Controllers never sleep. They hand a callback to a [`TimerSource`] and
//! return; the host drives time forward and due callbacks run in order.
//!
//! [`TimerQueue`] is the in-crate source:
//! - Virtual time via [`TimerQueue::advance`] (tests, frame-stepped hosts)
//! - Wall-clock time via [`TimerQueue::poll`] (event loops)
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use folio_motion::engine::{TimerQueue, TimerSource};
//!
//! let timers = TimerQueue::new();
//! let id = timers.schedule(Duration::from_millis(100), Box::new(|| println!("tick")));
//!
//! timers.advance(Duration::from_millis(99));  // nothing yet
//! timers.advance(Duration::from_millis(1));   // prints "tick"
//! assert!(!timers.cancel(id));                // already fired
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::{Duration, Instant};

// =============================================================================
// Timer Source Contract
// =============================================================================

/// Handle to a scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Schedule-after-delay and cancel.
///
/// Implementations must run callbacks in (deadline, schedule order) and must
/// never run a callback whose id was cancelled.
pub trait TimerSource {
    /// Run `callback` once, `delay` from now.
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId;

    /// Cancel a scheduled callback.
    ///
    /// Returns `false` if it already ran or was already cancelled.
    fn cancel(&self, id: TimerId) -> bool;
}

// =============================================================================
// Timer Queue
// =============================================================================

type Callback = Box<dyn FnOnce()>;

struct QueueState {
    /// Current time, measured from queue creation.
    now: Duration,
    next_id: u64,
    /// Ordered by deadline, ties broken by schedule order.
    pending: BTreeMap<(Duration, u64), Callback>,
    /// Id to deadline, for cancellation.
    deadlines: HashMap<u64, Duration>,
    origin: Instant,
}

/// Single-threaded timer queue.
///
/// Cheap to clone; clones share the same queue.
#[derive(Clone)]
pub struct TimerQueue {
    state: Rc<RefCell<QueueState>>,
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerQueue {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(QueueState {
                now: Duration::ZERO,
                next_id: 0,
                pending: BTreeMap::new(),
                deadlines: HashMap::new(),
                origin: Instant::now(),
            })),
        }
    }

    /// Current queue time.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Number of callbacks waiting to run.
    pub fn pending_count(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Deadline of the earliest pending callback.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.state
            .borrow()
            .pending
            .keys()
            .next()
            .map(|(deadline, _)| *deadline)
    }

    /// Time left until the earliest pending callback, if any.
    ///
    /// Useful as an event-loop poll timeout.
    pub fn time_until_next(&self) -> Option<Duration> {
        let state = self.state.borrow();
        let now = state.now;
        state
            .pending
            .keys()
            .next()
            .map(|(deadline, _)| deadline.saturating_sub(now))
    }

    /// Move time forward by `by`, running every callback that falls due.
    ///
    /// Returns the number of callbacks run. Saturates at `Duration::MAX`.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now().saturating_add(by);
        self.advance_to(target)
    }

    /// Move time forward to `target`, running every callback that falls due.
    ///
    /// Callbacks scheduled while advancing run too if their deadline is not
    /// past `target`. Targets in the past are a no-op.
    pub fn advance_to(&self, target: Duration) -> usize {
        let mut fired = 0;

        loop {
            // Pop under the borrow, run outside it: callbacks re-enter the queue.
            let next = {
                let mut state = self.state.borrow_mut();
                let due = state
                    .pending
                    .keys()
                    .next()
                    .copied()
                    .filter(|(deadline, _)| *deadline <= target);

                match due {
                    Some(key) => {
                        state.now = state.now.max(key.0);
                        state.deadlines.remove(&key.1);
                        state.pending.remove(&key)
                    }
                    None => None,
                }
            };

            match next {
                Some(callback) => {
                    callback();
                    fired += 1;
                }
                None => break,
            }
        }

        let mut state = self.state.borrow_mut();
        state.now = state.now.max(target);
        fired
    }

    /// Advance to the wall-clock time elapsed since the queue was created.
    pub fn poll(&self) -> usize {
        let target = self.state.borrow().origin.elapsed();
        self.advance_to(target)
    }

    /// Drop every pending callback without running it.
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.pending.clear();
        state.deadlines.clear();
    }
}

impl TimerSource for TimerQueue {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;

        let deadline = state.now.saturating_add(delay);
        state.pending.insert((deadline, id), callback);
        state.deadlines.insert(id, deadline);

        TimerId(id)
    }

    fn cancel(&self, id: TimerId) -> bool {
        let mut state = self.state.borrow_mut();
        match state.deadlines.remove(&id.0) {
            Some(deadline) => state.pending.remove(&(deadline, id.0)).is_some(),
            None => false,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
