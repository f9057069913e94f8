//! Bounded timer-driven animator
//!
//! An [`Animator`] counts from `initial` towards `bound` in fixed `step`s, one
//! step per timer tick. Every tick maps the counter to a visual value with the
//! caller's `on_tick` function and hands that value to an optional `apply`
//! sink. Once the counter reaches or passes `bound` the repeating timer is
//! cleared and `on_complete` runs exactly once.
//!
//! ```text
//! Pending ──▶ Running ──▶ Completed
//!    │           │
//!    └───────────┴──────▶ Cancelled
//! ```
//!
//! The final counter may overshoot `bound` by up to `step - 1`; that value is
//! still passed to `on_tick`. Clamp inside `on_tick` when an exact final value
//! matters.

use crate::error::{AnimationError, ConfigViolation, Result};
use crate::timer::{TimerHost, TimerId};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

/// Configuration for a single animation run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimatorConfig {
    /// Counter value before the first tick
    #[serde(default)]
    pub initial: i64,
    /// Counter value at or beyond which the run completes
    pub bound: i64,
    /// Counter increment per tick
    #[serde(default = "default_step")]
    pub step: i64,
    /// Delay between ticks in milliseconds
    pub interval_ms: i64,
    /// Delay before the repeating timer is registered
    #[serde(default)]
    pub start_delay_ms: i64,
}

fn default_step() -> i64 {
    1
}

impl AnimatorConfig {
    /// Create a config counting from `initial` to `bound` in steps of 1
    pub fn new(initial: i64, bound: i64, interval_ms: i64) -> Self {
        Self {
            initial,
            bound,
            step: default_step(),
            interval_ms,
            start_delay_ms: 0,
        }
    }

    /// Create a config whose ticks together span `total`
    ///
    /// The interval is `total / expected_ticks` rounded down (at least 1 ms),
    /// so animators built from the same `total` finish together.
    pub fn spanning(total: Duration, initial: i64, bound: i64, step: i64) -> Self {
        let ticks = tick_count(initial, bound, step).max(1);
        let total_ms = i64::try_from(total.as_millis()).unwrap_or(i64::MAX);
        let interval_ms = (total_ms / i64::try_from(ticks).unwrap_or(i64::MAX)).max(1);

        Self {
            initial,
            bound,
            step,
            interval_ms,
            start_delay_ms: 0,
        }
    }

    pub fn with_step(mut self, step: i64) -> Self {
        self.step = step;
        self
    }

    pub fn with_start_delay(mut self, start_delay_ms: i64) -> Self {
        self.start_delay_ms = start_delay_ms;
        self
    }

    /// Check the config constraints
    pub fn validate(&self) -> Result<()> {
        let violation = if self.bound < self.initial {
            Some(ConfigViolation::BoundBelowInitial {
                initial: self.initial,
                bound: self.bound,
            })
        } else if self.step <= 0 {
            Some(ConfigViolation::NonPositiveStep(self.step))
        } else if self.interval_ms <= 0 {
            Some(ConfigViolation::NonPositiveInterval(self.interval_ms))
        } else if self.start_delay_ms < 0 {
            Some(ConfigViolation::NegativeStartDelay(self.start_delay_ms))
        } else {
            None
        };

        match violation {
            Some(violation) => Err(AnimationError::InvalidConfig(violation)),
            None => Ok(()),
        }
    }

    /// Number of ticks a valid run takes: `ceil((bound - initial) / step)`
    pub fn expected_ticks(&self) -> u64 {
        tick_count(self.initial, self.bound, self.step)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(0) as u64)
    }

    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms.max(0) as u64)
    }

    /// Total time from start to completion, saturating at `Duration::MAX`
    pub fn duration(&self) -> Duration {
        let ticks = u32::try_from(self.expected_ticks()).unwrap_or(u32::MAX);
        self.interval()
            .checked_mul(ticks)
            .map_or(Duration::MAX, |ticking| ticking.saturating_add(self.start_delay()))
    }
}

fn tick_count(initial: i64, bound: i64, step: i64) -> u64 {
    if step <= 0 || bound <= initial {
        return 0;
    }
    let span = (bound as i128 - initial as i128) as u128;
    let step = step as u128;
    span.div_ceil(step) as u64
}

/// Lifecycle of an animation run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationState {
    /// Started, waiting for the first scheduled callback
    Pending,
    /// Ticking
    Running,
    /// Reached the bound; `on_complete` has run
    Completed,
    /// Stopped by `cancel()`, by dropping the handle, or by a panicking `on_tick`
    Cancelled,
}

impl AnimationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, AnimationState::Completed | AnimationState::Cancelled)
    }
}

type TickFn<V> = Box<dyn FnMut(i64) -> V>;
type ApplyFn<V> = Box<dyn FnMut(&V)>;
type CompleteFn = Box<dyn FnOnce()>;

/// Builder for an animation run
pub struct Animator<V> {
    config: AnimatorConfig,
    on_tick: TickFn<V>,
    apply: Option<ApplyFn<V>>,
    on_complete: Option<CompleteFn>,
}

impl<V: 'static> Animator<V> {
    /// Create an animator mapping each counter value to a visual value
    pub fn new<F>(config: AnimatorConfig, on_tick: F) -> Self
    where
        F: FnMut(i64) -> V + 'static,
    {
        Self {
            config,
            on_tick: Box::new(on_tick),
            apply: None,
            on_complete: None,
        }
    }

    /// Write each tick's value to the visual target
    pub fn apply<F>(mut self, apply: F) -> Self
    where
        F: FnMut(&V) + 'static,
    {
        self.apply = Some(Box::new(apply));
        self
    }

    /// Run once when the counter reaches the bound
    pub fn on_complete<F>(mut self, on_complete: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        self.on_complete = Some(Box::new(on_complete));
        self
    }

    /// Validate the config and schedule the run on `host`
    ///
    /// Returns immediately; no callback runs before this returns. On error
    /// nothing is scheduled.
    pub fn start<H>(self, host: &H) -> Result<AnimationHandle<V>>
    where
        H: TimerHost + Clone + 'static,
    {
        self.config.validate()?;

        let config = self.config;
        let run = Rc::new(Run {
            config,
            host: Rc::new(host.clone()),
            state: Cell::new(AnimationState::Pending),
            counter: Cell::new(config.initial),
            ticks: Cell::new(0),
            timer: Cell::new(TimerId::default()),
            value: RefCell::new(None),
            on_tick: RefCell::new(self.on_tick),
            apply: RefCell::new(self.apply),
            on_complete: RefCell::new(self.on_complete),
        });

        tracing::debug!(
            "Animator: start {}..{} step {} every {}ms ({} ticks)",
            config.initial,
            config.bound,
            config.step,
            config.interval_ms,
            config.expected_ticks()
        );

        // A run with nothing to count still completes from a scheduled callback
        if config.start_delay_ms > 0 || config.expected_ticks() == 0 {
            let pending = Rc::clone(&run);
            let id = run.host.set_timeout(
                config.start_delay(),
                Box::new(move || {
                    if pending.state.get() == AnimationState::Pending {
                        pending.begin();
                    }
                }),
            );
            run.timer.set(id);
        } else {
            run.begin();
        }

        Ok(AnimationHandle {
            run,
            cancel_on_drop: true,
        })
    }
}

/// State shared between a handle and its scheduled callbacks
struct Run<V> {
    config: AnimatorConfig,
    host: Rc<dyn TimerHost>,
    state: Cell<AnimationState>,
    counter: Cell<i64>,
    ticks: Cell<u64>,
    timer: Cell<TimerId>,
    value: RefCell<Option<V>>,
    on_tick: RefCell<TickFn<V>>,
    apply: RefCell<Option<ApplyFn<V>>>,
    on_complete: RefCell<Option<CompleteFn>>,
}

impl<V: 'static> Run<V> {
    fn begin(self: &Rc<Self>) {
        self.state.set(AnimationState::Running);

        if self.counter.get() >= self.config.bound {
            self.complete();
            return;
        }

        let run = Rc::clone(self);
        let id = self
            .host
            .set_interval(self.config.interval(), Box::new(move || run.tick()));
        self.timer.set(id);
    }
}

impl<V> Run<V> {
    fn tick(&self) {
        // A tick already queued when the run ended
        if self.state.get() != AnimationState::Running {
            return;
        }

        let counter = self.counter.get().saturating_add(self.config.step);
        self.counter.set(counter);
        self.ticks.set(self.ticks.get() + 1);
        tracing::trace!("Animator: tick {} counter={}", self.ticks.get(), counter);

        let guard = CancelOnUnwind { run: self };
        let value = {
            let mut on_tick = self.on_tick.borrow_mut();
            (*on_tick)(counter)
        };
        if let Some(apply) = self.apply.borrow_mut().as_mut() {
            apply(&value);
        }
        drop(guard);
        *self.value.borrow_mut() = Some(value);

        // Cancelled from inside on_tick or apply
        if self.state.get() != AnimationState::Running {
            return;
        }

        if counter >= self.config.bound {
            self.complete();
        }
    }

    fn complete(&self) {
        self.state.set(AnimationState::Completed);
        self.clear_timer();
        tracing::debug!(
            "Animator: completed after {} ticks at {}",
            self.ticks.get(),
            self.counter.get()
        );

        let on_complete = self.on_complete.borrow_mut().take();
        if let Some(on_complete) = on_complete {
            on_complete();
        }
    }

    fn cancel(&self) -> bool {
        if self.state.get().is_terminal() {
            return false;
        }

        self.state.set(AnimationState::Cancelled);
        self.clear_timer();
        let on_complete = self.on_complete.borrow_mut().take();
        drop(on_complete);
        tracing::debug!("Animator: cancelled after {} ticks", self.ticks.get());
        true
    }

    fn clear_timer(&self) {
        let id = self.timer.replace(TimerId::default());
        if id != TimerId::default() {
            self.host.clear(id);
        }
    }
}

/// Cancels the run if `on_tick` or `apply` panics
struct CancelOnUnwind<'a, V> {
    run: &'a Run<V>,
}

impl<V> Drop for CancelOnUnwind<'_, V> {
    fn drop(&mut self) {
        if thread::panicking() {
            tracing::error!(
                "Animator: tick callback panicked at counter {}, cancelling run",
                self.run.counter.get()
            );
            self.run.cancel();
        }
    }
}

/// Handle to a started animation run
///
/// Dropping the handle cancels the run. Use [`detach`](Self::detach) to let a
/// run finish without keeping the handle around.
#[must_use = "dropping the handle cancels the animation"]
pub struct AnimationHandle<V> {
    run: Rc<Run<V>>,
    cancel_on_drop: bool,
}

impl<V> AnimationHandle<V> {
    /// Stop the run immediately
    ///
    /// No further ticks happen and `on_complete` is dropped without running.
    /// Returns `false` if the run had already completed or been cancelled.
    pub fn cancel(&self) -> bool {
        self.run.cancel()
    }

    pub fn state(&self) -> AnimationState {
        self.run.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.state() == AnimationState::Running
    }

    pub fn is_completed(&self) -> bool {
        self.state() == AnimationState::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == AnimationState::Cancelled
    }

    /// Current counter value
    pub fn counter(&self) -> i64 {
        self.run.counter.get()
    }

    /// Number of ticks so far
    pub fn ticks(&self) -> u64 {
        self.run.ticks.get()
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.run.config
    }

    /// Let the run continue without this handle
    pub fn detach(mut self) {
        self.cancel_on_drop = false;
    }
}

impl<V: Clone> AnimationHandle<V> {
    /// Value produced by the most recent tick
    pub fn value(&self) -> Option<V> {
        self.run.value.borrow().clone()
    }
}

impl<V> Drop for AnimationHandle<V> {
    fn drop(&mut self) {
        if self.cancel_on_drop {
            self.run.cancel();
        }
    }
}

impl<V> std::fmt::Debug for AnimationHandle<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationHandle")
            .field("state", &self.state())
            .field("counter", &self.counter())
            .field("ticks", &self.ticks())
            .finish()
    }
}
