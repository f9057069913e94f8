//! Error types for glint_widgets

use glint_animation::AnimationError;
use thiserror::Error;

/// Errors that can occur while driving a widget
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WidgetError {
    /// Story index out of range
    #[error("Unknown story {index} (carousel has {len} stories)")]
    UnknownStory { index: usize, len: usize },

    /// Story display time is zero or negative
    #[error("Story display_ms must be positive, got {0}")]
    InvalidDisplayTime(i64),

    /// The progress bar cannot fit its ticks into the display time
    #[error("Progress bar needs {ticks} ticks, more than display_ms {display_ms} allows")]
    BarOutlastsDisplay { ticks: u64, display_ms: i64 },

    /// The widget's animator config was rejected
    #[error(transparent)]
    Animation(#[from] AnimationError),
}

/// Result type for glint_widgets operations
pub type Result<T> = std::result::Result<T, WidgetError>;
