pub mod app;
pub mod color;
pub mod data;
pub mod matching;
pub mod render;

pub use app::cli::run_from_env;
