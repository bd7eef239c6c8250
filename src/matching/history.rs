use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_HISTORY_CAP: usize = 5;

/// Recently selected image indices for one theme, oldest first.
///
/// Never holds duplicates and never grows past the cap it was last
/// recorded with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThemeHistory(Vec<usize>);

impl ThemeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a history from stored indices, dropping duplicates (first
    /// occurrence wins) and keeping only the newest `cap` entries.
    pub fn from_indices(indices: impl IntoIterator<Item = usize>, cap: usize) -> Self {
        let mut out = Self::new();
        for i in indices {
            if !out.0.contains(&i) {
                out.0.push(i);
            }
        }
        out.trim(cap);
        out
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends `index` unless already present, then evicts from the front
    /// until at most `cap` entries remain. Returns whether anything changed.
    pub fn record(&mut self, index: usize, cap: usize) -> bool {
        if self.0.contains(&index) {
            return false;
        }
        self.0.push(index);
        let evicted = self.trim(cap);
        if evicted > 0 {
            log::debug!("history full; evicted {evicted} oldest entries");
        }
        true
    }

    fn trim(&mut self, cap: usize) -> usize {
        let cap = cap.max(1);
        let excess = self.0.len().saturating_sub(cap);
        self.0.drain(..excess);
        excess
    }
}

/// History for every theme, keyed by theme id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchHistory(BTreeMap<String, ThemeHistory>);

impl MatchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, theme_id: &str) -> ThemeHistory {
        self.0.get(theme_id).cloned().unwrap_or_default()
    }

    pub fn set(&mut self, theme_id: &str, history: ThemeHistory) {
        self.0.insert(theme_id.to_string(), history);
    }

    pub fn themes(&self) -> impl Iterator<Item = (&str, &ThemeHistory)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
