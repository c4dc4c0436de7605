//! Error types for pipework.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using pipework's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Structural failures surfaced by [`Pipeline::run`](crate::Pipeline::run).
///
/// Everything else that can go wrong while a pipeline runs (a child
/// exiting non-zero, an endpoint descriptor failing mid-stream) is
/// reported through the exit-status surface and the log, not through
/// this type.
#[derive(Error, Debug)]
pub enum Error {
    /// `run()` was called on a pipeline with no stages.
    #[error("pipeline has no stages")]
    NoStages,

    /// A pipe between stages or endpoints could not be created.
    #[error("could not create a pipe: {0}")]
    CreatePipe(#[source] std::io::Error),

    /// A parent-owned descriptor could not be switched to non-blocking mode.
    #[error("could not set non-blocking mode: {0}")]
    SetNonBlocking(#[source] std::io::Error),

    /// The input file endpoint could not be opened.
    #[error("could not open input file {}: {source}", .path.display())]
    OpenInput {
        /// Path of the input file.
        path: PathBuf,
        /// Underlying open failure.
        source: std::io::Error,
    },

    /// The output file endpoint could not be created.
    #[error("could not open output file {}: {source}", .path.display())]
    OpenOutput {
        /// Path of the output file.
        path: PathBuf,
        /// Underlying open failure.
        source: std::io::Error,
    },

    /// Waiting for descriptor readiness failed with something other
    /// than an interrupt.
    #[error("error waiting for descriptor readiness: {0}")]
    Poll(#[source] std::io::Error),
}
