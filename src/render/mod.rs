pub mod dominant_color;
pub mod profile_cache;
