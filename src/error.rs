//! Error types for city map generation

use thiserror::Error;

/// Errors that can occur during map generation or queries
///
/// Degenerate geometry (a region with no visible boundary) is not an error:
/// outlines are returned as `Option` and a `None` simply means "nothing to draw".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapGenError {
    /// Configuration validation failed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Caller-supplied request was rejected before any work started
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The generated island has fewer land cells than requested districts
    #[error("not enough land: {land_cells} land cells for {districts} districts")]
    InsufficientLand {
        /// Number of cells classified as land
        land_cells: usize,
        /// Number of districts requested
        districts: usize,
    },
    /// Generation failed due to geometry issues
    #[error("generation failed: {0}")]
    GenerationFailed(String),
    /// Requested cell ID does not exist
    #[error("cell not found: {0}")]
    CellNotFound(usize),
    /// The background worker died or reported an error
    #[error("worker failed: {0}")]
    WorkerFailed(String),
}

/// Result type alias for map generation
pub type Result<T> = std::result::Result<T, MapGenError>;
