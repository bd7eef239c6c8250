use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("no candidate images to match against")]
    NoCandidates,
    #[error("color profiles are stale: {images} images but {profiles} profiles")]
    ProfilesStale { images: usize, profiles: usize },
}
