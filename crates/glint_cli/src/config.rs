//! Glint configuration file handling
//!
//! `glint.toml` holds one table per widget:
//!
//! ```toml
//! [blur]
//! interval_ms = 50
//!
//! [story]
//! display_ms = 3000
//!
//! [[story.stories]]
//! thumbnail = "assets/profile/p1.jpg"
//! image = "assets/profile/p1.jpg"
//! ```

use anyhow::{Context, Result};
use glint_widgets::{BlurRevealConfig, Story, StoryConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "glint.toml";

/// Workspace-level Glint configuration (glint.toml)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GlintConfig {
    #[serde(default)]
    pub blur: BlurRevealConfig,
    #[serde(default = "default_story")]
    pub story: StoryConfig,
}

fn default_story() -> StoryConfig {
    StoryConfig {
        stories: (1..=5)
            .map(|i| Story::new(format!("assets/profile/p{}.jpg", i)))
            .collect(),
        ..StoryConfig::default()
    }
}

impl Default for GlintConfig {
    fn default() -> Self {
        Self {
            blur: BlurRevealConfig::default(),
            story: default_story(),
        }
    }
}

impl GlintConfig {
    /// Load configuration from `path`, falling back to defaults if it doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No {} found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: GlintConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize glint config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GlintConfig::load(&dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config, GlintConfig::default());
        assert_eq!(config.story.stories.len(), 5);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "[blur]\ninterval_ms = 20\n").unwrap();

        let config = GlintConfig::load(&path).unwrap();
        assert_eq!(config.blur.interval_ms, 20);
        assert_eq!(config.blur.max_blur_px, 10.0);
        assert_eq!(config.story, default_story());
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, GlintConfig::default().to_toml().unwrap()).unwrap();

        assert_eq!(GlintConfig::load(&path).unwrap(), GlintConfig::default());
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "[blur\n").unwrap();

        let err = GlintConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
