//! Configuration - Animation constants and reveal defaults.
//!
//! Every field has a default, so an empty or partial TOML file is valid:
//!
//! ```toml
//! reduced_motion = false
//!
//! [reveal]
//! root_margin_px = 50.0
//! direction = "left"
//! delay_ms = 0
//! duration_secs = 0.8
//! threshold = 0.1
//!
//! [typewriter]
//! type_interval_ms = 100
//! hold_ms = 2000
//! delete_interval_ms = 50
//! cursor = "|"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MotionError, Result};
use crate::state::{RevealConfig, TypewriterTiming};
use crate::types::Direction;

/// Look-ahead margin around the viewport, so elements start revealing just
/// before they scroll on screen.
pub const DEFAULT_ROOT_MARGIN_PX: f32 = 50.0;
pub const DEFAULT_DURATION_SECS: f32 = 0.8;
pub const DEFAULT_THRESHOLD: f32 = 0.1;
pub const DEFAULT_CURSOR: &str = "|";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MotionConfig {
    /// Report zero-length transitions (user asked for reduced motion).
    pub reduced_motion: bool,
    pub reveal: RevealSettings,
    pub typewriter: TypewriterSettings,
}

/// Defaults for reveal instances that do not set their own values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealSettings {
    pub root_margin_px: f32,
    pub direction: Direction,
    pub delay_ms: u64,
    pub duration_secs: f32,
    pub threshold: f32,
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self {
            root_margin_px: DEFAULT_ROOT_MARGIN_PX,
            direction: Direction::Left,
            delay_ms: 0,
            duration_secs: DEFAULT_DURATION_SECS,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypewriterSettings {
    pub type_interval_ms: u64,
    pub hold_ms: u64,
    pub delete_interval_ms: u64,
    pub cursor: String,
}

impl Default for TypewriterSettings {
    fn default() -> Self {
        Self {
            type_interval_ms: 100,
            hold_ms: 2000,
            delete_interval_ms: 50,
            cursor: DEFAULT_CURSOR.to_string(),
        }
    }
}

impl MotionConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no motion config, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded motion config");
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| MotionError::InvalidConfig(e.to_string()))
    }

    /// Reject values the controllers would have to sanitise.
    pub fn validate(&self) -> Result<()> {
        let reveal = &self.reveal;

        if !reveal.root_margin_px.is_finite() {
            return Err(MotionError::InvalidConfig(
                "reveal.root_margin_px must be finite".to_string(),
            ));
        }
        self.reveal_config().validate()?;

        let tw = &self.typewriter;
        if tw.type_interval_ms == 0 || tw.delete_interval_ms == 0 || tw.hold_ms == 0 {
            return Err(MotionError::InvalidConfig(
                "typewriter intervals must be at least 1ms".to_string(),
            ));
        }

        Ok(())
    }

    /// Reveal config built from the defaults section.
    pub fn reveal_config(&self) -> RevealConfig {
        RevealConfig {
            direction: self.reveal.direction,
            delay: Duration::from_millis(self.reveal.delay_ms),
            duration_secs: self.reveal.duration_secs,
            threshold: self.reveal.threshold,
        }
    }

    pub fn typewriter_timing(&self) -> TypewriterTiming {
        TypewriterTiming::new(
            Duration::from_millis(self.typewriter.type_interval_ms),
            Duration::from_millis(self.typewriter.hold_ms),
            Duration::from_millis(self.typewriter.delete_interval_ms),
        )
    }
}
