//! Error types for the virtual try-on pipeline.
//!
//! Joint-level problems (missing keypoints, degenerate triangles) are not errors:
//! they surface as `None` and the previous signal is kept. The variants below
//! cover the failures that reach the orchestration layer.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic I/O error with description
    #[error("I/O error: {0}")]
    IoError(String),

    /// Smoothing stage initialization error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Mesh or skeleton import failed; the previous avatar stays in place
    #[error("Asset load error: {0}")]
    AssetLoad(String),

    /// A rig table refers to a bone the loaded skeleton does not have
    #[error("Bone binding error: {0}")]
    BindingError(String),

    /// Camera or video surface never became ready
    #[error("Resource unavailable after {attempts} attempts: {resource}")]
    ResourceUnavailable {
        /// Name of the resource that was polled
        resource: String,
        /// Number of consecutive failed attempts
        attempts: u32,
    },

    /// The pose estimator reported a failure
    #[error("Pose source error: {0}")]
    PoseSourceError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
