use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::audio::channel::ChannelMode;
use crate::audio::spectrum::WindowFunction;
use crate::render::style::{HexColor, PointShape, StyleKind};
use crate::settings::{BinDimension, OutputMode, SmoothRadius};

const FILE_NAME: &str = "spectrovid.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub output: OutputConfig,
    pub analysis: AnalysisConfig,
    pub style: StyleConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub mode: Option<OutputMode>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub framerate: Option<f64>,
    pub codec: Option<String>,
    pub pix_fmt: Option<String>,
    pub crf: Option<u32>,
    pub bitrate: Option<String>,
    pub keep_parts: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub bins: Option<usize>,
    pub duration: Option<f64>,
    pub xlog: Option<f64>,
    pub ylog: Option<f64>,
    pub smooth_t: Option<SmoothRadius>,
    pub smooth_y: Option<SmoothRadius>,
    pub frequency_start: Option<f64>,
    pub frequency_end: Option<f64>,
    pub channel: Option<ChannelMode>,
    pub window: Option<WindowFunction>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleConfig {
    pub kind: Option<StyleKind>,
    pub bin_width: Option<BinDimension>,
    pub bin_spacing: Option<BinDimension>,
    pub point_shape: Option<PointShape>,
    pub point_width: Option<f64>,
    pub line_thickness: Option<f64>,
    pub inner_radius: Option<f64>,
    pub color: Option<HexColor>,
    pub background: Option<HexColor>,
    pub mirror: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub chunk_size: Option<usize>,
    pub workers: Option<usize>,
}

/// Explicit path, then `./spectrovid.toml`, then the user config directories.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("spectrovid").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("spectrovid").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid config {}", path.display()))
}

pub fn parse_config(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}
