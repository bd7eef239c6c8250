use crate::matching::history::{MatchHistory, ThemeHistory};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Where per-theme match history lives between runs.
pub trait HistoryRepository {
    fn load(&self, theme_id: &str) -> Result<ThemeHistory>;
    fn save(&mut self, theme_id: &str, history: &ThemeHistory) -> Result<()>;
    fn load_all(&self) -> Result<MatchHistory>;
    fn clear(&mut self) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    all: MatchHistory,
}

impl HistoryRepository for MemoryHistoryStore {
    fn load(&self, theme_id: &str) -> Result<ThemeHistory> {
        Ok(self.all.get(theme_id))
    }

    fn save(&mut self, theme_id: &str, history: &ThemeHistory) -> Result<()> {
        self.all.set(theme_id, history.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<MatchHistory> {
        Ok(self.all.clone())
    }

    fn clear(&mut self) -> Result<()> {
        self.all.clear();
        Ok(())
    }
}

/// History as a TOML table of theme id to index list.
#[derive(Debug)]
pub struct TomlHistoryStore {
    path: PathBuf,
    cap: usize,
}

impl TomlHistoryStore {
    pub fn new(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self { path: path.into(), cap }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<MatchHistory> {
        if !self.path.is_file() {
            return Ok(MatchHistory::new());
        }
        let raw = fs::read_to_string(&self.path).with_context(|| format!("read {}", self.path.display()))?;
        let stored: MatchHistory = match toml::from_str(&raw) {
            Ok(h) => h,
            Err(e) => {
                log::warn!("discarding unreadable history {}: {e}", self.path.display());
                return Ok(MatchHistory::new());
            }
        };

        // Files may have been edited by hand; restore the invariants.
        let mut out = MatchHistory::new();
        for (theme, h) in stored.themes() {
            out.set(theme, ThemeHistory::from_indices(h.indices().iter().copied(), self.cap));
        }
        Ok(out)
    }

    fn write(&self, all: &MatchHistory) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("mkdir {}", parent.display()))?;
        }
        let raw = toml::to_string(all)?;
        fs::write(&self.path, raw).with_context(|| format!("write {}", self.path.display()))
    }
}

impl HistoryRepository for TomlHistoryStore {
    fn load(&self, theme_id: &str) -> Result<ThemeHistory> {
        Ok(self.read()?.get(theme_id))
    }

    fn save(&mut self, theme_id: &str, history: &ThemeHistory) -> Result<()> {
        let mut all = self.read()?;
        all.set(theme_id, history.clone());
        self.write(&all)
    }

    fn load_all(&self) -> Result<MatchHistory> {
        self.read()
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).with_context(|| format!("remove {}", self.path.display()))?;
        }
        Ok(())
    }
}
