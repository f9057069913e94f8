//! Glint CLI
//!
//! Play story and blur reveals in the terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glint_animation::TimerLoop;
use glint_widgets::{BlurReveal, StoryCarousel};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod terminal;

use config::{GlintConfig, DEFAULT_CONFIG_FILE};
use terminal::{TerminalBlur, TerminalStory};

/// Virtual time budget for `--instant` runs
const INSTANT_LIMIT: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Parser)]
#[command(name = "glint")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Timed reveal animations in the terminal", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Run in virtual time instead of waiting for real timers
    #[arg(long, global = true)]
    instant: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sharpen a blurred image while counting up to 100%
    Blur,

    /// Open a story fullscreen while its progress bar fills
    Story {
        /// Story index (0-based)
        #[arg(default_value = "0")]
        index: usize,
    },

    /// List configured stories
    List,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Blur => cmd_blur(&GlintConfig::load(&cli.config)?, cli.instant),

        Commands::Story { index } => {
            cmd_story(&GlintConfig::load(&cli.config)?, index, cli.instant)
        }

        Commands::List => cmd_list(&GlintConfig::load(&cli.config)?),

        Commands::Init { force } => cmd_init(&cli.config, force),
    }
}

fn drive(timers: &TimerLoop, instant: bool) {
    if instant {
        let fired = timers.advance_until_idle(INSTANT_LIMIT);
        tracing::debug!("Fired {} callbacks in {:?} of virtual time", fired, timers.now());
    } else {
        timers.run_until_idle();
    }
}

fn cmd_blur(config: &GlintConfig, instant: bool) -> Result<()> {
    let timers = TimerLoop::new();
    let surface = Rc::new(RefCell::new(TerminalBlur::default()));
    let reveal = BlurReveal::start(&config.blur, surface, &timers.handle())
        .context("Failed to start blur reveal")?;

    info!(
        "Revealing image over {:?}",
        reveal.handle().config().duration()
    );

    drive(&timers, instant);

    if !reveal.is_revealed() {
        anyhow::bail!("Blur reveal stopped before the image was sharp");
    }
    Ok(())
}

fn cmd_story(config: &GlintConfig, index: usize, instant: bool) -> Result<()> {
    let timers = TimerLoop::new();
    let surface = Rc::new(RefCell::new(TerminalStory::default()));
    let mut carousel = StoryCarousel::new(config.story.clone(), surface, timers.handle());

    info!(
        "Opening story {} of {} for {}ms",
        index,
        carousel.stories().len(),
        config.story.display_ms
    );
    carousel
        .open(index)
        .with_context(|| format!("Failed to open story {}", index))?;

    drive(&timers, instant);
    Ok(())
}

fn cmd_list(config: &GlintConfig) -> Result<()> {
    if config.story.stories.is_empty() {
        info!("No stories configured");
        return Ok(());
    }

    for (index, story) in config.story.stories.iter().enumerate() {
        println!("{:>3}  {}  ->  {}", index, story.thumbnail, story.image);
    }
    Ok(())
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        );
    }

    let content = GlintConfig::default().to_toml()?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blur_with_huge_interval_errors_instead_of_panicking() {
        let mut config = GlintConfig::default();
        config.blur.interval_ms = i64::MAX;
        config.blur.bound = 10_000;

        let err = cmd_blur(&config, true).unwrap_err();
        assert!(err.to_string().contains("before the image was sharp"));
    }

    #[test]
    fn test_blur_rejects_invalid_config() {
        let mut config = GlintConfig::default();
        config.blur.step = 0;

        let err = cmd_blur(&config, true).unwrap_err();
        assert!(err.to_string().contains("Failed to start blur reveal"));
    }

    #[test]
    fn test_story_runs_in_virtual_time() {
        assert!(cmd_story(&GlintConfig::default(), 1, true).is_ok());
        assert!(cmd_story(&GlintConfig::default(), 99, true).is_err());
    }
}
