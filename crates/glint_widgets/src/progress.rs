//! Progress bar adapter

use glint_animation::{Animator, AnimatorConfig};

/// Bar width in percent for `counter` on the way from `initial` to `bound`,
/// clamped to 0..=100
pub fn bar_width(counter: i64, initial: i64, bound: i64) -> u8 {
    let span = bound as i128 - initial as i128;
    if span <= 0 {
        return 100;
    }
    let percent = ((counter as i128 - initial as i128) * 100) / span;
    percent.clamp(0, 100) as u8
}

/// CSS width value, e.g. `"42%"`
pub fn css_width(percent: u8) -> String {
    format!("{}%", percent)
}

/// Animator that fills a bar from `config.initial` to `config.bound`
pub fn bar_animator(config: AnimatorConfig) -> Animator<u8> {
    let (initial, bound) = (config.initial, config.bound);
    Animator::new(config, move |counter| bar_width(counter, initial, bound))
}
