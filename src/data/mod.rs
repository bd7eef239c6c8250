pub mod assets;
pub mod config;
pub mod history_store;
pub mod image_set;
pub mod library;
pub mod theme_loader;
