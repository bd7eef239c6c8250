use anyhow::{Context, Result};
use directories::BaseDirs;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_ASSET_DIR: &str = "THEME_BACKDROP_ASSET_DIR";
const APP_DIR: &str = "theme-backdrop";

pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../config/default.toml");

pub const BUNDLED_THEMES: [(&str, &str); 5] = [
    ("dark-purple", include_str!("../../themes/dark-purple.toml")),
    ("midnight-blue", include_str!("../../themes/midnight-blue.toml")),
    ("forest-green", include_str!("../../themes/forest-green.toml")),
    ("sunset-orange", include_str!("../../themes/sunset-orange.toml")),
    ("light", include_str!("../../themes/light.toml")),
];

pub fn resolve_asset_root() -> PathBuf {
    if let Some(p) = std::env::var_os(ENV_ASSET_DIR) {
        return PathBuf::from(p);
    }

    // Linux: ~/.config/theme-backdrop, macOS: ~/Library/Application Support/theme-backdrop,
    // Windows: %APPDATA%\theme-backdrop
    if let Some(sys) = BaseDirs::new().map(|d| d.config_dir().join(APP_DIR)) {
        return sys;
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".config")
        .join(APP_DIR)
}

/// Makes sure `root` holds a config file and every bundled theme.
/// Existing files are left alone so user edits survive.
pub fn ensure_assets_ready(root: &Path) -> Result<()> {
    ensure_dir(&root.join("config"))?;
    ensure_dir(&root.join("themes"))?;
    ensure_dir(&root.join("state"))?;

    write_if_missing(&root.join("config/default.toml"), DEFAULT_CONFIG_TOML)?;
    for (id, raw) in BUNDLED_THEMES {
        write_if_missing(&root.join("themes").join(format!("{id}.toml")), raw)?;
    }
    Ok(())
}

fn ensure_dir(p: &Path) -> Result<()> {
    fs::create_dir_all(p).with_context(|| format!("mkdir {}", p.display()))
}

fn write_if_missing(path: &Path, contents: &str) -> Result<()> {
    if path.is_file() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}
