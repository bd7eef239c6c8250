pub mod error;
pub mod history;
pub mod theme_matcher;

pub use error::MatchError;
pub use history::{MatchHistory, ThemeHistory};
pub use theme_matcher::{MatchOutcome, MatchTuning, ScoredImage, ThemeMatcher};
