//! Timer host abstraction
//!
//! The animator never sleeps or spawns on its own. It asks a [`TimerHost`] to
//! call it back later, once or repeatedly, and to forget a callback when the
//! run ends. [`TimerLoop`](crate::TimerLoop) is the built-in host.

use slotmap::new_key_type;
use std::time::Duration;

new_key_type! {
    /// Handle to a scheduled callback
    pub struct TimerId;
}

/// Repeating timer callback
pub type IntervalCallback = Box<dyn FnMut()>;

/// Single-shot timer callback
pub type TimeoutCallback = Box<dyn FnOnce()>;

/// Scheduling primitive consumed by the animator
///
/// Implementations must never invoke a callback synchronously from
/// `set_interval` or `set_timeout`, and must never run two callbacks at once.
/// Callbacks are allowed to call back into the host (including `clear` on
/// their own id).
pub trait TimerHost {
    /// Invoke `callback` every `period`, starting one `period` from now, until cleared
    fn set_interval(&self, period: Duration, callback: IntervalCallback) -> TimerId;

    /// Invoke `callback` once after `delay`
    fn set_timeout(&self, delay: Duration, callback: TimeoutCallback) -> TimerId;

    /// Cancel a pending callback
    ///
    /// Returns `false` if the id is unknown or the timer already finished.
    fn clear(&self, id: TimerId) -> bool;
}
