use thiserror::Error;

/// Returned when a cache is constructed with parameters it cannot honour.
///
/// This is the only error the crate produces, all other operations are infallible
/// and report absence through `Option`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("capacity must be positive")]
    ZeroCapacity,

    #[error("default TTL must be positive")]
    ZeroTtl,

    #[error("a timed cache requires a default TTL")]
    MissingTtl,
}
