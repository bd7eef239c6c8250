use crate::color::space::Rgb;

/// Reference colors of one theme, read fresh for every match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeColors {
    pub background: Rgb,
    pub accent: Rgb,
    pub text: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// File stem, also the key under which match history is stored.
    pub id: String,
    pub name: String,
    pub colors: ThemeColors,
}

pub const DEFAULT_THEME_ID: &str = "dark-purple";

impl Theme {
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}
