pub mod space;
pub mod theme;
