//! In-process data handlers plugged into a pipeline.
//!
//! Three capabilities exist, one per position in the stream:
//!
//! - [`Source`] generates the pipeline's input when polled.
//! - [`Function`] sits between two stages, sees every byte flowing past,
//!   and decides what to forward.
//! - [`Sink`] receives the pipeline's output.
//!
//! All three run inside the parent process, driven by the multiplex loop
//! while the child processes execute concurrently. Handlers emit bytes
//! through the [`Writer`] the engine passes in; nothing is forwarded
//! implicitly, so a [`Function`] that never writes produces an empty
//! stream downstream.

use crate::ring::ByteRingBuffer;

/// Handle through which a [`Source`] or [`Function`] emits bytes.
///
/// Writing appends to an engine-owned ring buffer; the multiplex loop
/// drains it into the downstream descriptor as the descriptor accepts
/// data. Writes therefore never block, they only grow the buffer.
pub struct Writer<'a> {
    ring: &'a mut ByteRingBuffer,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(ring: &'a mut ByteRingBuffer) -> Self {
        Self { ring }
    }

    /// Queue `data` for delivery to the next stage.
    pub fn write(&mut self, data: &[u8]) {
        self.ring.write(data);
    }
}

/// Generates the input stream of a pipeline.
///
/// [`poll`](Self::poll) is called whenever the engine wants more data:
/// emit the next chunk through `out` and return `true` while more will
/// follow. Returning `false` with nothing buffered ends the input stream.
pub trait Source {
    /// Produce more input. Return `false` once the stream is exhausted.
    fn poll(&mut self, out: &mut Writer<'_>) -> bool;
}

/// An intermediate processing stage running in the parent process.
///
/// Bytes arriving from the previous stage are delivered to
/// [`process`](Self::process); whatever is written to `out` continues to
/// the next stage. When the previous stage closes its stream,
/// [`eof`](Self::eof) is called exactly once, after the final `process`.
pub trait Function {
    /// Handle a block of bytes from the upstream stage.
    fn process(&mut self, data: &[u8], out: &mut Writer<'_>);

    /// The upstream stream ended. A final write to `out` is still
    /// delivered downstream.
    fn eof(&mut self, out: &mut Writer<'_>);
}

/// Receives the output stream of a pipeline.
pub trait Sink {
    /// Handle a block of output bytes.
    fn process(&mut self, data: &[u8]);

    /// The output stream ended; no further `process` calls follow.
    fn eof(&mut self);
}
