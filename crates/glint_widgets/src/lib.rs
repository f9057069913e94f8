//! Glint Widgets
//!
//! Small reveal widgets built on [`glint_animation::Animator`]:
//!
//! - **StoryCarousel**: opens a story fullscreen for a fixed time while a
//!   progress bar fills up
//! - **BlurReveal**: sharpens a blurred image while a percentage counts up
//!
//! Widgets never touch a presentation API directly. They write visual values
//! to a caller-supplied surface ([`StorySurface`], [`BlurSurface`]).

pub mod blur;
pub mod error;
pub mod progress;
pub mod story;

pub use blur::{BlurFrame, BlurReveal, BlurRevealConfig, BlurSurface};
pub use error::{Result, WidgetError};
pub use story::{Story, StoryCarousel, StoryConfig, StorySurface};
