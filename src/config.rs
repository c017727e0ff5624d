//! YAML configuration.
//!
//! ```yaml
//! title: Scratch
//! tempo: 96
//! layout:
//!   margin-x: 16
//!   min-measure-width: 100
//! ```
//! Every key is optional; missing keys take the built-in defaults.

use crate::ast::{Tempo, DEFAULT_TEMPO_BPM, DEFAULT_TITLE};
use crate::error::ScoreError;
use crate::layout::LayoutConfig;
use crate::parser::ParseOptions;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Title given to parsed documents.
    pub title: String,
    /// Tempo given to parsed documents, in quarter-note BPM.
    pub tempo: f64,
    pub layout: LayoutConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            tempo: DEFAULT_TEMPO_BPM,
            layout: LayoutConfig::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(content: &str) -> Result<Self, ScoreError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScoreError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_yaml_str(&content)
    }

    fn validate(&self) -> Result<(), ScoreError> {
        Tempo::new(self.tempo).map_err(|e| ScoreError::Config(e.to_string()))?;
        let layout = &self.layout;
        if layout.min_measure_width <= 0.0 || layout.pixels_per_complexity_unit <= 0.0 {
            return Err(ScoreError::Config(
                "layout widths must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tempo(&self) -> Tempo {
        Tempo::new(self.tempo).unwrap_or_default()
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::new(self.title.clone(), self.tempo())
    }
}
