use crate::api::paginate::{Termination, DEFAULT_MAX_PAGES};
use crate::api::channel::DEFAULT_CHANNEL_BASE;
use crate::api::DEFAULT_API_BASE;
use crate::layout::{Canvas, RadialLayout, RingPolicy, DRAG_MARGIN, RING_MARGIN};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub channel_base_url: String,
    pub proxy: Option<String>,
    pub timeout_secs: u64,
    pub pagination: PaginationConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            channel_base_url: DEFAULT_CHANNEL_BASE.to_string(),
            proxy: None,
            timeout_secs: 30,
            pagination: PaginationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PagePolicy {
    Capped,
    CycleSafe,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub policy: PagePolicy,
    pub max_pages: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            policy: PagePolicy::Capped,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl PaginationConfig {
    pub fn termination(&self) -> Termination {
        match self.policy {
            PagePolicy::Capped => Termination::Capped {
                max_pages: self.max_pages.max(1),
            },
            PagePolicy::CycleSafe => Termination::CycleSafe,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RingStyle {
    Proportional,
    Simple,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    pub rings: RingStyle,
    pub ring_margin: f64,
    pub drag_margin: f64,
    pub inner_offset: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 700.0,
            height: 700.0,
            rings: RingStyle::Proportional,
            ring_margin: RING_MARGIN,
            drag_margin: DRAG_MARGIN,
            inner_offset: true,
        }
    }
}

impl LayoutConfig {
    pub fn canvas(&self) -> Canvas {
        let defaults = LayoutConfig::default();
        let width = if self.width > 0.0 { self.width } else { defaults.width };
        let height = if self.height > 0.0 { self.height } else { defaults.height };
        Canvas::new(width, height)
    }

    pub fn radial(&self) -> RadialLayout {
        let rings = match self.rings {
            RingStyle::Proportional => RingPolicy::Proportional {
                margin: self.ring_margin,
            },
            RingStyle::Simple => RingPolicy::Simple,
        };
        RadialLayout::new(self.canvas(), rings).with_inner_offset(self.inner_offset)
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("spoonfollows").join("config.toml"))
    }

    /// Load `path`, or the default location when `path` is `None`.
    /// A missing default file yields the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}
