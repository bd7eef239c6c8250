use crate::color::theme::DEFAULT_THEME_ID;
use crate::matching::MatchTuning;
use crate::render::dominant_color::DEFAULT_MAX_SIDE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,

    #[serde(default)]
    pub image_dir: Option<PathBuf>,

    #[serde(default = "default_profile_max_side")]
    pub profile_max_side: u32,

    /// Bits per channel kept when counting colors; unset counts exact colors.
    #[serde(default)]
    pub quantize_bits: Option<u8>,

    #[serde(default = "default_profile_cache")]
    pub profile_cache: usize,

    #[serde(default)]
    pub matching: MatchTuning,
}

fn default_theme() -> String {
    DEFAULT_THEME_ID.to_string()
}

fn default_profile_max_side() -> u32 {
    DEFAULT_MAX_SIDE
}

fn default_profile_cache() -> usize {
    256
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            image_dir: None,
            profile_max_side: default_profile_max_side(),
            quantize_bits: None,
            profile_cache: default_profile_cache(),
            matching: MatchTuning::default(),
        }
    }
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        match toml::from_str(&raw) {
            Ok(cfg) => Ok(cfg),
            Err(e) => {
                log::warn!("ignoring malformed config {}: {e}", path.display());
                Ok(Self::default())
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("mkdir {}", parent.display()))?;
        }
        let raw = toml::to_string_pretty(self)?;
        fs::write(path, raw).with_context(|| format!("write {}", path.display()))
    }
}
