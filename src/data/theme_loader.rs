use crate::color::space::Rgb;
use crate::color::theme::{Theme, ThemeColors};
use crate::data::assets::BUNDLED_THEMES;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub struct ThemeLoader {
    dir: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ThemeToml {
    #[serde(default)]
    name: String,
    background: String,
    accent: String,
    text: String,
}

impl ThemeLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Reads `<dir>/<id>.toml`, or the bundled copy when no file exists.
    pub fn load(&self, id: &str) -> Result<Theme> {
        if !is_valid_id(id) {
            return Err(anyhow!("invalid theme id: {id:?}"));
        }
        let path = self.dir.join(format!("{id}.toml"));
        let raw = if path.is_file() {
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?
        } else {
            BUNDLED_THEMES
                .iter()
                .find(|(bundled, _)| *bundled == id)
                .map(|(_, raw)| raw.to_string())
                .ok_or_else(|| anyhow!("unknown theme: {id}"))?
        };
        parse_theme(id, &raw).with_context(|| format!("theme {id}"))
    }

    /// Every theme in the directory plus bundled ones it does not override,
    /// sorted by id. Unreadable files are skipped.
    pub fn list(&self) -> Vec<Theme> {
        let mut ids: Vec<String> = BUNDLED_THEMES.iter().map(|(id, _)| id.to_string()).collect();
        if let Ok(entries) = fs::read_dir(&self.dir) {
            for entry in entries.flatten() {
                let p = entry.path();
                if let Some(id) = theme_id(&p) {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            }
        }
        ids.sort();

        ids.iter()
            .filter_map(|id| match self.load(id) {
                Ok(t) => Some(t),
                Err(e) => {
                    log::warn!("skipping theme {id}: {e:#}");
                    None
                }
            })
            .collect()
    }
}

// A bare file stem, so `<dir>/<id>.toml` cannot leave `dir`.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\', ':'])
}

fn theme_id(p: &Path) -> Option<String> {
    if !p.is_file() || p.extension().and_then(|s| s.to_str()) != Some("toml") {
        return None;
    }
    p.file_stem().and_then(|s| s.to_str()).map(str::to_string)
}

fn parse_theme(id: &str, raw: &str) -> Result<Theme> {
    let t: ThemeToml = toml::from_str(raw)?;
    Ok(Theme {
        id: id.to_string(),
        name: t.name,
        colors: ThemeColors {
            background: parse_hex("background", &t.background)?,
            accent: parse_hex("accent", &t.accent)?,
            text: parse_hex("text", &t.text)?,
        },
    })
}

fn parse_hex(field: &str, s: &str) -> Result<Rgb> {
    Rgb::from_hex(s).ok_or_else(|| anyhow!("{field}: invalid hex color {s:?}"))
}
