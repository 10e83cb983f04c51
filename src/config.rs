// src/config.rs

//! Configuration for the window renderer.
//!
//! `RendererConfig` can be deserialized from a JSON file, and `SurfaceConfig`
//! can also be built from the property bag handed over by a binding layer.
//! Every field has a default, so an empty object yields a 600x480 windowed
//! surface that waits indefinitely for the window manager.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_WIDTH: u32 = 600;
pub const DEFAULT_HEIGHT: u32 = 480;
/// Title and icon name given to every window.
pub const DEFAULT_TITLE: &str = "Window Renderer";

/// Process-wide defaults, used when no configuration is supplied.
pub static DEFAULT_CONFIG: Lazy<RendererConfig> = Lazy::new(RendererConfig::default);

// --- Top-Level Configuration Structure ---

/// Complete configuration for one renderer (and the demo binary).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RendererConfig {
    /// Window geometry and title.
    pub surface: SurfaceConfig,
    /// Optional upper bound on the window-map handshake. `None` blocks until the
    /// window manager maps the window, however long that takes.
    pub map_timeout_ms: Option<u64>,
    /// Test-pattern settings for the demo binary.
    pub demo: DemoConfig,
}

impl RendererConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RendererConfig =
            serde_json::from_str(json).context("Failed to parse renderer configuration")?;
        config.surface.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    pub fn map_timeout(&self) -> Option<Duration> {
        self.map_timeout_ms.map(Duration::from_millis)
    }
}

// --- Surface Configuration ---

/// Fixed geometry of the output window. Immutable once a renderer is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub title: String,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        SurfaceConfig {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fullscreen: false,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl SurfaceConfig {
    /// Reads `width`, `height` and `fullscreen` from a property bag. Missing
    /// keys (or a `null` bag) keep their defaults.
    pub fn from_properties(properties: &Value) -> Result<Self> {
        let mut config = DEFAULT_CONFIG.surface.clone();
        let map = match properties {
            Value::Null => return Ok(config),
            Value::Object(map) => map,
            other => bail!("Renderer properties must be an object, got {}", other),
        };

        if let Some(width) = map.get("width") {
            config.width = dimension("width", width)?;
        }
        if let Some(height) = map.get("height") {
            config.height = dimension("height", height)?;
        }
        if let Some(fullscreen) = map.get("fullscreen") {
            config.fullscreen = fullscreen
                .as_bool()
                .with_context(|| format!("'fullscreen' must be a boolean, got {}", fullscreen))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// X11 window dimensions are positive 16-bit quantities.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if value == 0 || value > u32::from(u16::MAX) {
                bail!("Surface {} must be between 1 and {}, got {}", name, u16::MAX, value);
            }
        }
        Ok(())
    }
}

fn dimension(name: &str, value: &Value) -> Result<u32> {
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .with_context(|| format!("'{}' must be a positive integer, got {}", name, value))
}

// --- Demo Configuration ---

/// Settings for the generated test pattern played by the demo binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of frames to push before signalling end-of-stream.
    pub frames: u32,
    /// Frames per second.
    pub fps: u32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            frames: 300,
            fps: 30,
        }
    }
}
