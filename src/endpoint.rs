//! Input and output endpoint configurations.
//!
//! Each pipeline has exactly one input and one output endpoint, set once
//! before running. `Inherit` is both the unset state and a valid
//! configuration: the edge stage keeps the parent's own stdin or stdout.

use std::os::fd::OwnedFd;
use std::path::PathBuf;

use crate::element::{Sink, Source};

/// Where the first stage's input comes from.
pub(crate) enum Input {
    /// The first stage inherits the parent's stdin.
    Inherit,
    /// An already-open descriptor, handed to the first stage.
    Fd(OwnedFd),
    /// A file the engine opens read-only at run time.
    File(PathBuf),
    /// An in-memory byte sequence written into the first stage;
    /// `pos` tracks how far delivery has progressed.
    Bytes { data: Vec<u8>, pos: usize },
    /// A callback polled for data while the pipeline runs.
    Source(Box<dyn Source>),
}

impl Default for Input {
    fn default() -> Self {
        Self::Inherit
    }
}

impl Input {
    /// True until one of the `set_input_*` calls configured the endpoint.
    pub(crate) fn is_unset(&self) -> bool {
        matches!(self, Self::Inherit)
    }
}

/// Where the last stage's output goes.
pub(crate) enum Output {
    /// The last stage inherits the parent's stdout.
    Inherit,
    /// An already-open descriptor, handed to the last stage.
    Fd(OwnedFd),
    /// A file the engine creates or truncates with the given permission
    /// bits.
    File { path: PathBuf, mode: u32 },
    /// Collect the output in memory for retrieval after the run.
    Bytes(Vec<u8>),
    /// A callback receiving the output as it arrives.
    Sink(Box<dyn Sink>),
}

impl Default for Output {
    fn default() -> Self {
        Self::Inherit
    }
}

impl Output {
    /// True until one of the `set_output_*` calls configured the endpoint.
    pub(crate) fn is_unset(&self) -> bool {
        matches!(self, Self::Inherit)
    }
}
