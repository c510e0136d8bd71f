//! Error taxonomy surfaced by the analyzer, the record store and the pad facade.
//!
//! - `NotReady`: model or store warm-up has not completed
//! - `NotFound`: a delete targeted an id that is not stored
//! - `InvalidInput`: malformed import blob, bad raster dimensions, empty canvas
//! - `StorageFailure`: the durable key-value store could not be read or written

/// Errors returned by the drawing pad core.
#[derive(Debug, thiserror::Error)]
pub enum PadError {
    /// A warm-up gate has not opened yet
    #[error("{0} is not ready yet, try again shortly")]
    NotReady(&'static str),

    /// No record carries the requested id
    #[error("drawing record not found: {0}")]
    NotFound(String),

    /// Caller supplied data the core cannot use
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Persistence layer failed; not retried by the core
    #[error("storage failure: {0:#}")]
    StorageFailure(#[from] anyhow::Error),
}

impl PadError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        PadError::InvalidInput(reason.into())
    }
}

pub type PadResult<T> = Result<T, PadError>;
