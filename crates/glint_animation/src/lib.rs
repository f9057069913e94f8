//! Glint Animation
//!
//! Bounded, timer-driven animators and the timer hosts that drive them.
//!
//! # Features
//!
//! - **Animator**: counts from `initial` to `bound` in fixed steps, one step per tick
//! - **Cancellable handles**: every run returns a handle; dropping it cancels the run
//! - **TimerLoop**: single-threaded cooperative timer loop, in virtual or real time
//! - **Tokio host**: `LocalTokioHost` for apps already running a tokio `LocalSet`
//!   (enable the `tokio` feature)
//!
//! # Example
//!
//! ```ignore
//! use glint_animation::{Animator, AnimatorConfig, TimerLoop};
//!
//! let timers = TimerLoop::new();
//! let config = AnimatorConfig::new(0, 100, 50);
//! let handle = Animator::new(config, |v| 10.0 - v as f32 / 10.0)
//!     .apply(|blur| println!("blur({blur}px)"))
//!     .start(&timers.handle())?;
//!
//! timers.run_until_idle();
//! assert!(handle.is_completed());
//! ```

pub mod animator;
pub mod error;
pub mod event_loop;
pub mod timer;
#[cfg(feature = "tokio")]
pub mod tokio_host;

pub use animator::{AnimationHandle, AnimationState, Animator, AnimatorConfig};
pub use error::{AnimationError, ConfigViolation, Result};
pub use event_loop::{TimerHandle, TimerLoop};
pub use timer::{TimerHost, TimerId};
#[cfg(feature = "tokio")]
pub use tokio_host::LocalTokioHost;
