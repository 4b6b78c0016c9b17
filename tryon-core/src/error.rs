use thiserror::Error;

/// Failure taxonomy for the try-on pipeline.
///
/// Every variant except `Config` is a local, recoverable condition: the
/// pipeline logs it and returns the frame unchanged (or substitutes a
/// placeholder). `Config` is fatal and must surface at startup.
#[derive(Debug, Error)]
pub enum TryOnError {
    #[error("no subject detected in frame")]
    NoSubjectDetected,

    #[error("input bytes do not decode to an image: {0}")]
    InvalidImage(String),

    #[error("unknown category tag '{0}'")]
    UnknownCategory(String),

    #[error("overlay asset unavailable: {0}")]
    AssetMissing(String),

    #[error("degenerate landmark geometry: {0}")]
    GeometryDegenerate(String),

    #[error("compositing bounds mismatch: {0}")]
    CompositingBounds(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl TryOnError {
    /// Whether the failure was caused by the request rather than the system.
    ///
    /// Client errors map to 4xx-style responses (bad upload, unknown tag, no
    /// subject in the photo); everything else is an internal failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TryOnError::NoSubjectDetected
                | TryOnError::InvalidImage(_)
                | TryOnError::UnknownCategory(_)
        )
    }

    /// Whether the pipeline may absorb this failure and keep the frame.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TryOnError::Config(_))
    }
}
