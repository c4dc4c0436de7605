//! # pipework
//!
//! Linear pipelines of child processes, multiplexed from a single thread.
//!
//! pipework builds a sequence of connected child programs, the moral
//! equivalent of shell piping, and runs it to completion while the parent
//! shuttles bytes between the chain and its endpoints. Input and output
//! can each be nothing (inherit), an open descriptor, a file, an
//! in-memory byte sequence, or a callback object; in-process
//! [`Function`] stages can be spliced between programs to observe or
//! transform the stream as it flows.
//!
//! ## Features
//!
//! - **Single-threaded parent**: concurrency comes from the children;
//!   the parent drives everything through one readiness loop.
//! - **Typed endpoints**: descriptors are `OwnedFd`s end to end, so every
//!   error path closes what it owns.
//! - **In-process stages**: sources, functions and sinks run inside the
//!   parent, backed by auto-growing ring buffers for back-pressure.
//! - **Per-stage outcomes**: exit codes and terminating signals are
//!   collected for every spawned program.
//!
//! ## Quick start
//!
//! ```ignore
//! use pipework::Pipeline;
//!
//! let pipe = Pipeline::new();
//! pipe.set_input_file("archive.tar");
//! pipe.add_execp("gzip", &["-9"]);
//! pipe.set_output_file("archive.tar.gz");
//! pipe.run()?;
//! assert!(pipe.all_exit_zero());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod element;
pub mod error;
pub mod log;
pub mod pipeline;
pub mod ring;

mod endpoint;
mod stage;
mod sys;

pub use crate::element::{Function, Sink, Source, Writer};
pub use crate::error::{Error, Result};
pub use crate::log::LogLevel;
pub use crate::pipeline::Pipeline;
pub use crate::ring::ByteRingBuffer;
