//! Tokio timer host
//!
//! Runs animator callbacks as local tasks on a tokio [`LocalSet`]. Callbacks
//! are not `Send`, so every method must be called from inside
//! `LocalSet::run_until` (or a task spawned on it).
//!
//! [`LocalSet`]: tokio::task::LocalSet

use crate::timer::{IntervalCallback, TimeoutCallback, TimerHost, TimerId};
use slotmap::SlotMap;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};

/// [`TimerHost`] backed by tokio local tasks
#[derive(Clone, Default)]
pub struct LocalTokioHost {
    tasks: Rc<RefCell<SlotMap<TimerId, JoinHandle<()>>>>,
}

impl LocalTokioHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers still scheduled
    pub fn pending_count(&self) -> usize {
        self.tasks.borrow().len()
    }
}

impl TimerHost for LocalTokioHost {
    fn set_interval(&self, period: Duration, mut callback: IntervalCallback) -> TimerId {
        let period = period.max(Duration::from_millis(1));
        let id = self.tasks.borrow_mut().insert_with_key(|_| {
            task::spawn_local(async move {
                let mut ticks = time::interval_at(Instant::now() + period, period);
                // A late tick is not replayed
                ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticks.tick().await;
                    callback();
                }
            })
        });
        tracing::debug!("LocalTokioHost: interval {:?} every {:?}", id, period);
        id
    }

    fn set_timeout(&self, delay: Duration, callback: TimeoutCallback) -> TimerId {
        let tasks = Rc::downgrade(&self.tasks);
        let id = self.tasks.borrow_mut().insert_with_key(|id| {
            task::spawn_local(async move {
                time::sleep(delay).await;
                if let Some(tasks) = tasks.upgrade() {
                    let finished = tasks.borrow_mut().remove(id);
                    drop(finished);
                }
                callback();
            })
        });
        tracing::debug!("LocalTokioHost: timeout {:?} in {:?}", id, delay);
        id
    }

    fn clear(&self, id: TimerId) -> bool {
        let removed = self.tasks.borrow_mut().remove(id);
        match removed {
            Some(task) => {
                task.abort();
                tracing::debug!("LocalTokioHost: cleared {:?}", id);
                true
            }
            None => false,
        }
    }
}
