//! Terminal surfaces
//!
//! Draw widget state on a single, continuously rewritten terminal line.

use glint_widgets::{BlurSurface, StorySurface};
use std::io::{self, Write};

const BAR_WIDTH: usize = 40;

fn redraw(line: &str) {
    let mut stdout = io::stdout().lock();
    // Ignore write errors, e.g. a closed pipe
    let _ = write!(stdout, "\r\x1b[2K{}", line);
    let _ = stdout.flush();
}

fn finish_line() {
    println!();
}

/// Renders a story as `[image] |#####.....| 42%`
#[derive(Default)]
pub struct TerminalStory {
    image: Option<String>,
    percent: u8,
}

impl TerminalStory {
    fn draw(&self) {
        if let Some(image) = &self.image {
            let filled = BAR_WIDTH * self.percent as usize / 100;
            redraw(&format!(
                "[{}] |{}{}| {:>3}%",
                image,
                "#".repeat(filled),
                ".".repeat(BAR_WIDTH - filled),
                self.percent
            ));
        }
    }
}

impl StorySurface for TerminalStory {
    fn show_fullscreen(&mut self, image: &str) {
        self.image = Some(image.to_string());
        self.draw();
    }

    fn hide_fullscreen(&mut self) {
        self.image = None;
        finish_line();
        tracing::info!("Story closed");
    }

    fn set_progress(&mut self, percent: u8) {
        self.percent = percent;
        self.draw();
    }
}

/// Renders a blur reveal as `filter: blur(4.5px)  55%`
#[derive(Default)]
pub struct TerminalBlur {
    filter: String,
    percentage: String,
}

impl TerminalBlur {
    fn draw(&self) {
        redraw(&format!("filter: {:<14} {:>4}", self.filter, self.percentage));
    }
}

impl BlurSurface for TerminalBlur {
    fn set_filter(&mut self, filter: &str) {
        self.filter = filter.to_string();
        self.draw();
    }

    fn set_percentage(&mut self, text: &str) {
        self.percentage = text.to_string();
        self.draw();
    }

    fn revealed(&mut self) {
        finish_line();
        tracing::info!("Image revealed");
    }
}
