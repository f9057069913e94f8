//! Blur-to-sharp image reveal
//!
//! The image starts fully blurred with a `0%` readout. Every tick lowers the
//! blur radius and raises the percentage, until the image is sharp at `100%`.
//!
//! The reveal counter always starts at 0, so the helpers below only take the
//! `bound` it counts up to.

use crate::error::Result;
use glint_animation::{AnimationHandle, Animator, AnimatorConfig, TimerHost};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Presentation target for a [`BlurReveal`]
pub trait BlurSurface {
    /// Set the image filter, e.g. `"blur(4.5px)"`
    fn set_filter(&mut self, filter: &str);

    /// Set the percentage readout, e.g. `"55%"`
    fn set_percentage(&mut self, text: &str);

    /// Called once when the image is fully sharp
    fn revealed(&mut self) {}
}

/// Configuration for a [`BlurReveal`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlurRevealConfig {
    /// Blur radius before the first tick
    #[serde(default = "default_max_blur")]
    pub max_blur_px: f32,
    /// Counter value at which the image is sharp
    #[serde(default = "default_bound")]
    pub bound: i64,
    #[serde(default = "default_step")]
    pub step: i64,
    #[serde(default = "default_interval")]
    pub interval_ms: i64,
    /// Delay between showing the blurred image and the first tick's timer
    #[serde(default = "default_start_delay")]
    pub start_delay_ms: i64,
}

fn default_max_blur() -> f32 {
    10.0
}

fn default_bound() -> i64 {
    100
}

fn default_step() -> i64 {
    1
}

fn default_interval() -> i64 {
    50
}

fn default_start_delay() -> i64 {
    50
}

impl Default for BlurRevealConfig {
    fn default() -> Self {
        Self {
            max_blur_px: default_max_blur(),
            bound: default_bound(),
            step: default_step(),
            interval_ms: default_interval(),
            start_delay_ms: default_start_delay(),
        }
    }
}

impl BlurRevealConfig {
    pub fn animator_config(&self) -> AnimatorConfig {
        AnimatorConfig::new(0, self.bound, self.interval_ms)
            .with_step(self.step)
            .with_start_delay(self.start_delay_ms)
    }
}

/// Fraction of the reveal done at `counter`, clamped to 0..=1
fn revealed_fraction(counter: i64, bound: i64) -> f32 {
    if bound <= 0 {
        return 1.0;
    }
    (counter as f32 / bound as f32).clamp(0.0, 1.0)
}

/// Blur radius at `counter`: `max_px` at 0, sharp at `bound`
pub fn blur_radius(counter: i64, bound: i64, max_px: f32) -> f32 {
    (max_px - revealed_fraction(counter, bound) * max_px).max(0.0)
}

/// CSS filter value for a blur radius
pub fn css_filter(radius_px: f32) -> String {
    format!("blur({}px)", radius_px)
}

/// Percentage readout at `counter`, e.g. `"55%"`
pub fn percentage_text(counter: i64, bound: i64) -> String {
    let percent = (revealed_fraction(counter, bound) * 100.0).round() as u8;
    format!("{}%", percent)
}

/// One rendered state of the reveal
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlurFrame {
    pub counter: i64,
    pub radius_px: f32,
    pub percent: u8,
}

impl BlurFrame {
    pub fn at(counter: i64, bound: i64, max_px: f32) -> Self {
        Self {
            counter,
            radius_px: blur_radius(counter, bound, max_px),
            percent: (revealed_fraction(counter, bound) * 100.0).round() as u8,
        }
    }

    fn render<S: BlurSurface>(&self, surface: &mut S) {
        surface.set_filter(&css_filter(self.radius_px));
        surface.set_percentage(&format!("{}%", self.percent));
    }
}

/// A running blur reveal
///
/// Dropping it stops the reveal where it is.
pub struct BlurReveal {
    handle: AnimationHandle<BlurFrame>,
}

impl BlurReveal {
    /// Render the blurred first frame and start sharpening
    pub fn start<S, H>(config: &BlurRevealConfig, surface: Rc<RefCell<S>>, host: &H) -> Result<Self>
    where
        S: BlurSurface + 'static,
        H: TimerHost + Clone + 'static,
    {
        let animator_config = config.animator_config();
        animator_config.validate()?;

        let (bound, max_px) = (config.bound, config.max_blur_px);
        BlurFrame::at(0, bound, max_px).render(&mut *surface.borrow_mut());

        let on_tick_surface = Rc::clone(&surface);
        let handle = Animator::new(animator_config, move |counter| {
            BlurFrame::at(counter, bound, max_px)
        })
        .apply(move |frame| frame.render(&mut *on_tick_surface.borrow_mut()))
        .on_complete(move || {
            tracing::debug!("BlurReveal: image revealed");
            surface.borrow_mut().revealed();
        })
        .start(host)?;

        Ok(Self { handle })
    }

    /// Most recently rendered frame, `None` before the first tick
    pub fn frame(&self) -> Option<BlurFrame> {
        self.handle.value()
    }

    pub fn is_revealed(&self) -> bool {
        self.handle.is_completed()
    }

    /// Stop the reveal, leaving the last frame on the surface
    pub fn cancel(&self) -> bool {
        self.handle.cancel()
    }

    pub fn handle(&self) -> &AnimationHandle<BlurFrame> {
        &self.handle
    }

    /// Let the reveal finish without keeping this value around
    pub fn detach(self) {
        self.handle.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_animation::TimerLoop;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSurface {
        filters: Vec<String>,
        percentages: Vec<String>,
        revealed: u32,
    }

    impl BlurSurface for RecordingSurface {
        fn set_filter(&mut self, filter: &str) {
            self.filters.push(filter.to_string());
        }

        fn set_percentage(&mut self, text: &str) {
            self.percentages.push(text.to_string());
        }

        fn revealed(&mut self) {
            self.revealed += 1;
        }
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_blur_radius_curve() {
        assert_eq!(blur_radius(0, 100, 10.0), 10.0);
        assert_eq!(blur_radius(50, 100, 10.0), 5.0);
        assert_eq!(blur_radius(100, 100, 10.0), 0.0);
        assert_eq!(blur_radius(130, 100, 10.0), 0.0);
        assert_eq!(blur_radius(5, 0, 10.0), 0.0);
    }

    #[test]
    fn test_css_strings() {
        assert_eq!(css_filter(10.0), "blur(10px)");
        assert_eq!(css_filter(4.5), "blur(4.5px)");
        assert_eq!(percentage_text(55, 100), "55%");
        assert_eq!(percentage_text(1, 4), "25%");
    }

    #[test]
    fn test_reveal_runs_to_sharp() {
        let timers = TimerLoop::new();
        let surface = Rc::new(RefCell::new(RecordingSurface::default()));

        let reveal =
            BlurReveal::start(&BlurRevealConfig::default(), surface.clone(), &timers.handle())
                .unwrap();

        // First frame is rendered right away
        {
            let s = surface.borrow();
            assert_eq!(s.filters, vec!["blur(10px)"]);
            assert_eq!(s.percentages, vec!["0%"]);
        }
        assert_eq!(reveal.frame(), None);

        // 50ms start delay, then 100 ticks of 50ms
        timers.advance(ms(100));
        assert_eq!(surface.borrow().percentages.last().unwrap(), "1%");

        timers.advance_until_idle(ms(10_000));
        assert_eq!(timers.now(), ms(5050));

        let s = surface.borrow();
        assert_eq!(s.filters.len(), 101);
        assert_eq!(s.filters.last().unwrap(), "blur(0px)");
        assert_eq!(s.percentages.last().unwrap(), "100%");
        assert_eq!(s.revealed, 1);
        assert!(reveal.is_revealed());
        assert_eq!(reveal.frame().unwrap().radius_px, 0.0);
    }

    #[test]
    fn test_reveal_frames_sharpen_monotonically() {
        let timers = TimerLoop::new();
        let surface = Rc::new(RefCell::new(RecordingSurface::default()));
        let config = BlurRevealConfig::default();

        let reveal = BlurReveal::start(&config, surface, &timers.handle()).unwrap();
        let mut last = BlurFrame::at(0, config.bound, config.max_blur_px);
        timers.advance(ms(50));

        for _ in 0..100 {
            timers.advance(ms(50));
            let frame = reveal.frame().unwrap();
            assert!(frame.radius_px < last.radius_px);
            assert!(frame.percent > last.percent);
            last = frame;
        }
        assert_eq!(last.percent, 100);
    }

    #[test]
    fn test_cancel_stops_reveal() {
        let timers = TimerLoop::new();
        let surface = Rc::new(RefCell::new(RecordingSurface::default()));

        let reveal =
            BlurReveal::start(&BlurRevealConfig::default(), surface.clone(), &timers.handle())
                .unwrap();
        timers.advance(ms(550));
        assert!(reveal.cancel());
        timers.advance(ms(10_000));

        let s = surface.borrow();
        assert_eq!(s.percentages.last().unwrap(), "10%");
        assert_eq!(s.revealed, 0);
    }

    #[test]
    fn test_invalid_config_renders_nothing() {
        let timers = TimerLoop::new();
        let surface = Rc::new(RefCell::new(RecordingSurface::default()));
        let config = BlurRevealConfig {
            interval_ms: 0,
            ..BlurRevealConfig::default()
        };

        assert!(BlurReveal::start(&config, surface.clone(), &timers.handle()).is_err());
        assert!(surface.borrow().filters.is_empty());
        assert!(timers.is_idle());
    }

    #[test]
    fn test_config_from_toml() {
        let config: BlurRevealConfig = toml::from_str("interval_ms = 20\nmax_blur_px = 8.0\n").unwrap();
        assert_eq!(config.interval_ms, 20);
        assert_eq!(config.max_blur_px, 8.0);
        assert_eq!(config.bound, 100);
        assert_eq!(config.start_delay_ms, 50);
    }
}
