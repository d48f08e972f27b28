use thiserror::Error;

/// Errors reported by this crate.
///
/// Misuse of the component protocol is not an error; it asserts in debug builds.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid dimension: {0:?}")]
    InvalidDimension(String),

    #[error("no generation has been built yet")]
    NotBuilt,

    #[error("mount failed: {0}")]
    Mount(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
