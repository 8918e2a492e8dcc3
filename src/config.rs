//! Configuration management for keystone warps

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::WarpError;
use crate::geometry::{Point, Quad};
use crate::warp::{WarpPerspective, DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Name of the warp created in a fresh configuration
pub const DEFAULT_WARP: &str = "main";

/// Persisted state of a single warp
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WarpConfig {
    pub name: String,

    /// Content width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Content height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Output brightness (0.0 to 1.0)
    #[serde(default = "default_brightness")]
    pub brightness: f32,

    /// Normalized corners
    /// Order: top-left, top-right, bottom-right, bottom-left
    #[serde(default)]
    pub points: Quad,
}

fn default_width() -> u32 {
    DEFAULT_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_HEIGHT
}

fn default_brightness() -> f32 {
    1.0
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_WARP.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            brightness: 1.0,
            points: Quad::unit(),
        }
    }
}

impl WarpConfig {
    /// Build a live warp for the given window size
    pub fn to_warp(&self, window_size: Point) -> WarpPerspective {
        let mut warp = WarpPerspective::new(self.width, self.height);
        warp.set_window_size(window_size);
        warp.set_brightness(self.brightness);
        warp.set_control_points(self.points);
        warp
    }

    /// Capture the persistent part of a live warp
    pub fn from_warp(name: &str, warp: &WarpPerspective) -> Self {
        let (width, height) = warp.size();
        Self {
            name: name.to_string(),
            width,
            height,
            brightness: warp.brightness(),
            points: *warp.control_points(),
        }
    }
}

/// Display (window) configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl DisplayConfig {
    pub fn window_size(&self) -> Point {
        Point::new(self.width as f32, self.height as f32)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default = "default_warps")]
    pub warps: Vec<WarpConfig>,
}

fn default_warps() -> Vec<WarpConfig> {
    vec![WarpConfig::default()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display: DisplayConfig::default(),
            warps: default_warps(),
        }
    }
}

impl Config {
    /// Load configuration from a file, or create default if it doesn't exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config from {:?}", path))?;
            tracing::info!("Loaded configuration from {:?}", path);
            Ok(config)
        } else {
            let config = Config::default();
            config.save(path)?;
            tracing::info!("Created default configuration at {:?}", path);
            Ok(config)
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Look up a warp by name. `None` picks the first warp.
    pub fn warp(&self, name: Option<&str>) -> Result<&WarpConfig, WarpError> {
        let found = match name {
            Some(name) => self.warps.iter().find(|w| w.name == name),
            None => self.warps.first(),
        };
        found.ok_or_else(|| WarpError::UnknownWarp(name.unwrap_or(DEFAULT_WARP).to_string()))
    }

    /// Build a live warp sized to the configured display
    pub fn build_warp(&self, name: Option<&str>) -> Result<WarpPerspective, WarpError> {
        self.warp(name).map(|w| w.to_warp(self.display.window_size()))
    }

    /// Store a live warp, replacing the entry with the same name or appending
    pub fn store_warp(&mut self, name: &str, warp: &WarpPerspective) {
        let entry = WarpConfig::from_warp(name, warp);
        match self.warps.iter_mut().find(|w| w.name == name) {
            Some(existing) => *existing = entry,
            None => self.warps.push(entry),
        }
    }
}
