//! Single-threaded timer loop
//!
//! Owns every scheduled callback and fires them in deadline order.
//! Time is virtual: it only moves when the loop is advanced, either explicitly
//! with [`TimerLoop::advance`] (tests, offline rendering) or by
//! [`TimerLoop::run_until_idle`], which sleeps in real time between deadlines.
//!
//! Callbacks run one at a time on the thread that advances the loop, and may
//! freely set or clear timers through a [`TimerHandle`].

use crate::timer::{IntervalCallback, TimeoutCallback, TimerHost, TimerId};
use slotmap::SlotMap;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::thread;
use std::time::{Duration, Instant};

/// Shortest period a repeating timer may have
const MIN_PERIOD: Duration = Duration::from_millis(1);

enum Callback {
    /// `None` while the callback is being invoked
    Interval(Option<IntervalCallback>),
    Timeout(Option<TimeoutCallback>),
}

struct TimerEntry {
    deadline: Duration,
    /// Registration order, breaks ties between equal deadlines.
    /// Kept across reschedules so repeating timers stay in registration order.
    seq: u64,
    period: Duration,
    callback: Callback,
}

/// Internal state of the timer loop
struct LoopInner {
    timers: SlotMap<TimerId, TimerEntry>,
    now: Duration,
    next_seq: u64,
    dispatching: bool,
}

impl LoopInner {
    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn insert(&mut self, delay: Duration, period: Duration, callback: Callback) -> TimerId {
        let seq = self.next_seq();
        let deadline = self.now.saturating_add(delay);
        self.timers.insert(TimerEntry {
            deadline,
            seq,
            period,
            callback,
        })
    }

    /// Earliest timer due at or before `limit`
    fn earliest_due(&self, limit: Duration) -> Option<TimerId> {
        self.timers
            .iter()
            .filter(|(_, entry)| entry.deadline <= limit)
            .min_by_key(|(_, entry)| (entry.deadline, entry.seq))
            .map(|(id, _)| id)
    }
}

/// A callback taken out of the loop for invocation
enum Due {
    Interval(TimerId, IntervalCallback),
    Timeout(TimerId, TimeoutCallback),
}

/// Resets the dispatching flag, also when a callback panics
struct DispatchGuard<'a> {
    inner: &'a RefCell<LoopInner>,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.inner.borrow_mut().dispatching = false;
    }
}

/// Cooperative single-threaded timer loop
///
/// ```ignore
/// let timers = TimerLoop::new();
/// let handle = timers.handle();
/// handle.set_timeout(Duration::from_millis(50), Box::new(|| println!("later")));
/// timers.advance(Duration::from_millis(50));
/// ```
pub struct TimerLoop {
    inner: Rc<RefCell<LoopInner>>,
}

impl TimerLoop {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(LoopInner {
                timers: SlotMap::with_key(),
                now: Duration::ZERO,
                next_seq: 0,
                dispatching: false,
            })),
        }
    }

    /// Get a handle for scheduling callbacks on this loop
    ///
    /// The handle is weak: it won't keep the loop (or its callbacks) alive.
    pub fn handle(&self) -> TimerHandle {
        TimerHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Virtual time elapsed since the loop was created
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Number of timers still scheduled
    pub fn pending_count(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    pub fn is_idle(&self) -> bool {
        self.inner.borrow().timers.is_empty()
    }

    /// Virtual time at which the next callback is due
    pub fn next_deadline(&self) -> Option<Duration> {
        self.inner
            .borrow()
            .timers
            .values()
            .map(|entry| entry.deadline)
            .min()
    }

    /// Move virtual time forward by `dt`, firing every callback that falls due
    ///
    /// Callbacks fire in deadline order (registration order for ties), with
    /// [`now`](Self::now) set to each callback's deadline while it runs.
    /// Returns the number of callbacks fired.
    ///
    /// Calling this from inside a callback is refused and returns 0.
    pub fn advance(&self, dt: Duration) -> usize {
        let limit = {
            let mut inner = self.inner.borrow_mut();
            if inner.dispatching {
                tracing::warn!(
                    "TimerLoop: advance() called from inside a timer callback, ignored"
                );
                return 0;
            }
            inner.dispatching = true;
            inner.now.saturating_add(dt)
        };
        let _guard = DispatchGuard { inner: &self.inner };

        let mut fired = 0;
        while let Some(due) = self.take_due(limit) {
            match due {
                Due::Timeout(id, callback) => {
                    tracing::trace!("TimerLoop: timeout {:?} fired", id);
                    callback();
                }
                Due::Interval(id, mut callback) => {
                    tracing::trace!("TimerLoop: interval {:?} fired", id);
                    callback();
                    self.reschedule(id, callback);
                }
            }
            fired += 1;
        }

        self.inner.borrow_mut().now = limit;
        fired
    }

    /// Advance virtual time only as far as the last callback due within `limit`
    ///
    /// Unlike [`advance`](Self::advance), `now` ends at the last deadline that
    /// fired rather than at `now + limit`. Returns the number of callbacks fired.
    pub fn advance_until_idle(&self, limit: Duration) -> usize {
        let end = self.now().saturating_add(limit);
        let mut fired = 0;
        while let Some(deadline) = self.next_deadline() {
            if deadline > end {
                break;
            }
            let now = self.now();
            let step = self.advance(deadline.saturating_sub(now));
            if step == 0 && self.now() == now {
                // Refused (reentrant call); bail out instead of spinning
                break;
            }
            fired += step;
        }
        fired
    }

    /// Run in real time until no timers remain
    ///
    /// Sleeps until each next deadline, then fires it. Virtual time stays
    /// aligned with the wall clock measured from the moment this was called.
    pub fn run_until_idle(&self) {
        if self.inner.borrow().dispatching {
            tracing::warn!(
                "TimerLoop: run_until_idle() called from inside a timer callback, ignored"
            );
            return;
        }

        let origin = Instant::now();
        let base = self.now();

        while let Some(deadline) = self.next_deadline() {
            let wake_at = origin + deadline.saturating_sub(base);
            let now = Instant::now();
            if wake_at > now {
                thread::sleep(wake_at - now);
            }
            self.advance(deadline.saturating_sub(self.now()));
        }

        tracing::debug!("TimerLoop: idle after {:?}", origin.elapsed());
    }

    fn take_due(&self, limit: Duration) -> Option<Due> {
        let mut inner = self.inner.borrow_mut();
        loop {
            let id = inner.earliest_due(limit)?;
            let deadline = inner.timers[id].deadline;
            inner.now = deadline;

            let taken = match &mut inner.timers[id].callback {
                Callback::Interval(callback) => {
                    callback.take().map(|cb| Due::Interval(id, cb))
                }
                Callback::Timeout(callback) => callback.take().map(|cb| Due::Timeout(id, cb)),
            };

            match taken {
                Some(Due::Timeout(id, cb)) => {
                    inner.timers.remove(id);
                    return Some(Due::Timeout(id, cb));
                }
                Some(due) => return Some(due),
                None => {
                    // Left behind by a callback that panicked
                    tracing::warn!("TimerLoop: dropping timer {:?} orphaned by a panic", id);
                    inner.timers.remove(id);
                }
            }
        }
    }

    fn reschedule(&self, id: TimerId, callback: IntervalCallback) {
        let mut inner = self.inner.borrow_mut();
        if let Some(entry) = inner.timers.get_mut(id) {
            entry.deadline = entry.deadline.saturating_add(entry.period);
            entry.callback = Callback::Interval(Some(callback));
            return;
        }

        // Cleared from inside its own callback
        drop(inner);
        drop(callback);
    }
}

impl Default for TimerLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// A weak handle to a [`TimerLoop`]
///
/// This is what animators hold on to. Operations on a handle whose loop has
/// been dropped are no-ops: scheduling returns a null [`TimerId`] and
/// `clear` returns `false`.
#[derive(Clone)]
pub struct TimerHandle {
    inner: Weak<RefCell<LoopInner>>,
}

impl TimerHandle {
    /// Check if the timer loop is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    fn schedule(&self, delay: Duration, period: Duration, callback: Callback) -> TimerId {
        let Some(inner) = self.inner.upgrade() else {
            tracing::debug!("TimerHandle: loop dropped, callback not scheduled");
            return TimerId::default();
        };
        let mut inner = inner.borrow_mut();
        inner.insert(delay, period, callback)
    }
}

impl TimerHost for TimerHandle {
    fn set_interval(&self, period: Duration, callback: IntervalCallback) -> TimerId {
        let period = period.max(MIN_PERIOD);
        let id = self.schedule(period, period, Callback::Interval(Some(callback)));
        tracing::debug!("TimerHandle: interval {:?} every {:?}", id, period);
        id
    }

    fn set_timeout(&self, delay: Duration, callback: TimeoutCallback) -> TimerId {
        let id = self.schedule(delay, Duration::ZERO, Callback::Timeout(Some(callback)));
        tracing::debug!("TimerHandle: timeout {:?} in {:?}", id, delay);
        id
    }

    fn clear(&self, id: TimerId) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        // Drop the callback after releasing the borrow, it may own handles
        let removed = inner.borrow_mut().timers.remove(id);
        let cleared = removed.is_some();
        drop(removed);
        if cleared {
            tracing::debug!("TimerHandle: cleared {:?}", id);
        }
        cleared
    }
}
