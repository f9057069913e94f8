//! Story carousel
//!
//! A strip of story thumbnails. Opening a story shows its image fullscreen
//! for `display_ms`, while a progress bar fills from 0 to 100%. The bar and
//! the fullscreen visibility are two separate animators derived from the same
//! duration, so the bar is full no later than the story hides. A bar with
//! more ticks than `display_ms` has milliseconds is rejected.

use crate::error::{Result, WidgetError};
use crate::progress;
use glint_animation::{AnimationHandle, Animator, AnimatorConfig, TimerHost};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// A single story
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    /// Image shown in the thumbnail strip
    pub thumbnail: String,
    /// Image shown fullscreen
    pub image: String,
}

impl Story {
    /// A story using the same image for thumbnail and fullscreen view
    pub fn new(image: impl Into<String>) -> Self {
        let image = image.into();
        Self {
            thumbnail: image.clone(),
            image,
        }
    }
}

/// Configuration for a [`StoryCarousel`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryConfig {
    #[serde(default)]
    pub stories: Vec<Story>,
    /// How long an opened story stays fullscreen
    #[serde(default = "default_display_ms")]
    pub display_ms: i64,
    /// Progress counter value at which the bar is full
    #[serde(default = "default_bound")]
    pub bound: i64,
    /// Progress counter increment per tick
    #[serde(default = "default_step")]
    pub step: i64,
}

fn default_display_ms() -> i64 {
    3000
}

fn default_bound() -> i64 {
    100
}

fn default_step() -> i64 {
    1
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            stories: Vec::new(),
            display_ms: default_display_ms(),
            bound: default_bound(),
            step: default_step(),
        }
    }
}

impl StoryConfig {
    fn display(&self) -> Result<Duration> {
        if self.display_ms <= 0 {
            return Err(WidgetError::InvalidDisplayTime(self.display_ms));
        }
        Ok(Duration::from_millis(self.display_ms as u64))
    }
}

/// Presentation target for a [`StoryCarousel`]
pub trait StorySurface {
    fn show_fullscreen(&mut self, image: &str);
    fn hide_fullscreen(&mut self);
    /// Set the progress bar width in percent
    fn set_progress(&mut self, percent: u8);
}

struct ActiveStory {
    index: usize,
    progress: AnimationHandle<u8>,
    visibility: AnimationHandle<()>,
}

/// Story strip with a timed fullscreen view
pub struct StoryCarousel<S, H> {
    config: StoryConfig,
    surface: Rc<RefCell<S>>,
    host: H,
    active: Option<ActiveStory>,
}

impl<S, H> StoryCarousel<S, H>
where
    S: StorySurface + 'static,
    H: TimerHost + Clone + 'static,
{
    pub fn new(config: StoryConfig, surface: Rc<RefCell<S>>, host: H) -> Self {
        Self {
            config,
            surface,
            host,
            active: None,
        }
    }

    pub fn stories(&self) -> &[Story] {
        &self.config.stories
    }

    /// Thumbnails in strip order
    pub fn thumbnails(&self) -> impl Iterator<Item = (usize, &str)> {
        self.config
            .stories
            .iter()
            .enumerate()
            .map(|(index, story)| (index, story.thumbnail.as_str()))
    }

    /// Show story `index` fullscreen and restart the progress bar
    ///
    /// Any story still open is stopped first, so repeated opens never leave
    /// overlapping timers behind. Fails with
    /// [`WidgetError::BarOutlastsDisplay`] when the bar cannot fit into
    /// `display_ms`.
    pub fn open(&mut self, index: usize) -> Result<()> {
        let story = self
            .config
            .stories
            .get(index)
            .ok_or(WidgetError::UnknownStory {
                index,
                len: self.config.stories.len(),
            })?;

        let display = self.config.display()?;
        let bar_config = AnimatorConfig::spanning(display, 0, self.config.bound, self.config.step);
        bar_config.validate()?;
        if bar_config.duration() > display {
            return Err(WidgetError::BarOutlastsDisplay {
                ticks: bar_config.expected_ticks(),
                display_ms: self.config.display_ms,
            });
        }
        let visibility_config = AnimatorConfig::spanning(display, 0, 1, 1);

        // Stop the previous story before touching the surface
        self.active = None;

        tracing::debug!("StoryCarousel: opening story {} ({})", index, story.image);
        {
            let mut surface = self.surface.borrow_mut();
            surface.show_fullscreen(&story.image);
            surface.set_progress(0);
        }

        let bar_surface = Rc::clone(&self.surface);
        let progress = progress::bar_animator(bar_config)
            .apply(move |percent| bar_surface.borrow_mut().set_progress(*percent))
            .start(&self.host)?;

        let hide_surface = Rc::clone(&self.surface);
        let visibility = Animator::new(visibility_config, |_| ())
            .on_complete(move || {
                tracing::debug!("StoryCarousel: story {} finished", index);
                hide_surface.borrow_mut().hide_fullscreen();
            })
            .start(&self.host)?;

        self.active = Some(ActiveStory {
            index,
            progress,
            visibility,
        });
        Ok(())
    }

    /// Hide the open story immediately
    pub fn close(&mut self) {
        if let Some(active) = self.active.take() {
            let was_visible = !active.visibility.is_completed();
            drop(active);
            if was_visible {
                tracing::debug!("StoryCarousel: closed early");
                self.surface.borrow_mut().hide_fullscreen();
            }
        }
    }

    /// Index of the story currently shown fullscreen
    pub fn active(&self) -> Option<usize> {
        self.active
            .as_ref()
            .filter(|active| !active.visibility.state().is_terminal())
            .map(|active| active.index)
    }

    /// Current bar width, `None` when no story has been opened
    pub fn progress(&self) -> Option<u8> {
        self.active
            .as_ref()
            .map(|active| active.progress.value().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glint_animation::{TimerHandle, TimerLoop};

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Show(String),
        Hide,
        Progress(u8),
    }

    #[derive(Default)]
    struct RecordingSurface {
        events: Vec<Event>,
        visible: bool,
    }

    impl StorySurface for RecordingSurface {
        fn show_fullscreen(&mut self, image: &str) {
            self.visible = true;
            self.events.push(Event::Show(image.to_string()));
        }

        fn hide_fullscreen(&mut self) {
            self.visible = false;
            self.events.push(Event::Hide);
        }

        fn set_progress(&mut self, percent: u8) {
            self.events.push(Event::Progress(percent));
        }
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn profiles() -> StoryConfig {
        StoryConfig {
            stories: (1..=5)
                .map(|i| Story::new(format!("assets/profile/p{}.jpg", i)))
                .collect(),
            ..StoryConfig::default()
        }
    }

    fn carousel(
        timers: &TimerLoop,
    ) -> (
        StoryCarousel<RecordingSurface, TimerHandle>,
        Rc<RefCell<RecordingSurface>>,
    ) {
        let surface = Rc::new(RefCell::new(RecordingSurface::default()));
        let carousel = StoryCarousel::new(profiles(), surface.clone(), timers.handle());
        (carousel, surface)
    }

    #[test]
    fn test_open_runs_bar_then_hides() {
        let timers = TimerLoop::new();
        let (mut carousel, surface) = carousel(&timers);

        carousel.open(2).unwrap();
        assert_eq!(carousel.active(), Some(2));
        assert!(surface.borrow().visible);

        timers.advance(ms(1500));
        assert_eq!(carousel.progress(), Some(50));
        assert!(surface.borrow().visible);

        timers.advance(ms(1500));
        assert_eq!(carousel.progress(), Some(100));
        assert_eq!(carousel.active(), None);

        let s = surface.borrow();
        assert!(!s.visible);
        assert_eq!(s.events.first(), Some(&Event::Show("assets/profile/p3.jpg".into())));
        assert_eq!(s.events[1], Event::Progress(0));
        // The bar reaches 100% before the story hides
        let tail = &s.events[s.events.len() - 2..];
        assert_eq!(tail, &[Event::Progress(100), Event::Hide]);
        assert!(timers.is_idle());
    }

    #[test]
    fn test_reopen_replaces_previous_story() {
        let timers = TimerLoop::new();
        let (mut carousel, surface) = carousel(&timers);

        carousel.open(0).unwrap();
        timers.advance(ms(2000));
        carousel.open(1).unwrap();

        // Only the second story's bar and visibility timers remain
        assert_eq!(timers.pending_count(), 2);
        assert_eq!(carousel.progress(), Some(0));

        timers.advance(ms(1500));
        assert_eq!(carousel.active(), Some(1));
        assert!(surface.borrow().visible);

        timers.advance(ms(1500));
        assert_eq!(carousel.active(), None);
        let hides = surface
            .borrow()
            .events
            .iter()
            .filter(|e| **e == Event::Hide)
            .count();
        assert_eq!(hides, 1);
    }

    #[test]
    fn test_close_hides_immediately() {
        let timers = TimerLoop::new();
        let (mut carousel, surface) = carousel(&timers);

        carousel.open(4).unwrap();
        timers.advance(ms(300));
        carousel.close();

        assert!(!surface.borrow().visible);
        assert_eq!(carousel.active(), None);
        assert_eq!(carousel.progress(), None);
        assert!(timers.is_idle());

        // Closing again does nothing
        carousel.close();
        assert_eq!(surface.borrow().events.last(), Some(&Event::Hide));
    }

    #[test]
    fn test_unknown_story() {
        let timers = TimerLoop::new();
        let (mut carousel, surface) = carousel(&timers);

        assert_eq!(
            carousel.open(5).unwrap_err(),
            WidgetError::UnknownStory { index: 5, len: 5 }
        );
        assert!(surface.borrow().events.is_empty());
        assert!(timers.is_idle());
    }

    #[test]
    fn test_double_step_bar() {
        let timers = TimerLoop::new();
        let surface = Rc::new(RefCell::new(RecordingSurface::default()));
        let config = StoryConfig {
            step: 2,
            ..profiles()
        };
        let mut carousel = StoryCarousel::new(config, surface.clone(), timers.handle());

        carousel.open(0).unwrap();
        timers.advance(ms(3000));

        let widths: Vec<u8> = surface
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Progress(p) => Some(*p),
                _ => None,
            })
            .collect();
        // Initial reset plus 50 ticks of 2%
        assert_eq!(widths.len(), 51);
        assert_eq!(widths[1], 2);
        assert_eq!(*widths.last().unwrap(), 100);
        assert!(!surface.borrow().visible);
    }

    #[test]
    fn test_invalid_display_time() {
        let timers = TimerLoop::new();
        let surface = Rc::new(RefCell::new(RecordingSurface::default()));
        let config = StoryConfig {
            display_ms: 0,
            ..profiles()
        };
        let mut carousel = StoryCarousel::new(config, surface, timers.handle());

        assert_eq!(carousel.open(0), Err(WidgetError::InvalidDisplayTime(0)));
        assert!(timers.is_idle());
    }

    #[test]
    fn test_bar_longer_than_display_is_rejected() {
        let timers = TimerLoop::new();
        let surface = Rc::new(RefCell::new(RecordingSurface::default()));
        let config = StoryConfig {
            display_ms: 3000,
            bound: 10_000,
            ..profiles()
        };
        let mut carousel = StoryCarousel::new(config, surface.clone(), timers.handle());

        assert_eq!(
            carousel.open(0),
            Err(WidgetError::BarOutlastsDisplay {
                ticks: 10_000,
                display_ms: 3000
            })
        );
        assert!(surface.borrow().events.is_empty());
        assert_eq!(carousel.active(), None);
        assert_eq!(carousel.progress(), None);
        assert!(timers.is_idle());
    }

    #[test]
    fn test_bar_and_visibility_finish_together() {
        let timers = TimerLoop::new();
        let surface = Rc::new(RefCell::new(RecordingSurface::default()));
        // One tick per millisecond, the densest bar a display time allows
        let config = StoryConfig {
            display_ms: 3000,
            bound: 3000,
            ..profiles()
        };
        let mut carousel = StoryCarousel::new(config, surface.clone(), timers.handle());

        carousel.open(0).unwrap();
        timers.advance(Duration::from_millis(3000));

        assert_eq!(carousel.active(), None);
        assert_eq!(carousel.progress(), Some(100));
        assert!(timers.is_idle());

        let events_at_hide = surface.borrow().events.len();
        timers.advance(Duration::from_millis(10_000));
        assert_eq!(surface.borrow().events.len(), events_at_hide);
        assert_eq!(surface.borrow().events.last(), Some(&Event::Hide));
    }

    #[test]
    fn test_thumbnails_and_config() {
        let config: StoryConfig = toml::from_str(
            r#"
            display_ms = 2000

            [[stories]]
            thumbnail = "thumbs/a.jpg"
            image = "full/a.jpg"
            "#,
        )
        .unwrap();
        assert_eq!(config.bound, 100);

        let timers = TimerLoop::new();
        let surface = Rc::new(RefCell::new(RecordingSurface::default()));
        let carousel = StoryCarousel::new(config, surface, timers.handle());

        let thumbs: Vec<_> = carousel.thumbnails().collect();
        assert_eq!(thumbs, vec![(0, "thumbs/a.jpg")]);
        assert_eq!(carousel.stories()[0].image, "full/a.jpg");
    }
}
