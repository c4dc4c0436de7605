//! Pipeline stages and the ordered stage table.
//!
//! A stage is one position in the linear pipeline: either a child process
//! described by an [`ExecSpec`], or an in-process [`Function`] with its
//! private out-buffer. Both carry the pair of descriptors wiring them to
//! their neighbours; `None` means "not assigned" before planning and
//! "closed" afterwards.

use std::io;
use std::os::fd::OwnedFd;

use rustix::io::Errno;

use crate::element::{Function, Writer};
use crate::log::Logger;
use crate::ring::ByteRingBuffer;
use crate::sys::ChildStatus;

/// Size of the scratch buffer used for descriptor reads.
pub(crate) const READ_CHUNK: usize = 4096;

/// Description of one child process to launch.
pub(crate) struct ExecSpec {
    /// Program path, or bare name when `path_search` is set.
    pub prog: String,
    /// Full argument vector, including `argv[0]`.
    pub argv: Vec<String>,
    /// Explicit environment as `KEY=value` entries; `None` inherits.
    pub env: Option<Vec<String>>,
    /// Resolve `prog` against `PATH` like `execvp`.
    pub path_search: bool,
}

impl ExecSpec {
    /// The argv joined for log output.
    pub(crate) fn command_line(&self) -> String {
        self.argv.join(" ")
    }
}

/// What a stage runs: a child process or an in-process function.
pub(crate) enum StageKind {
    /// External program; `pid` and `status` are filled in while running.
    Exec {
        spec: ExecSpec,
        pid: Option<u32>,
        status: Option<ChildStatus>,
    },
    /// In-process transformer with the buffer its writes accumulate in
    /// until the downstream descriptor drains them.
    Function {
        func: Box<dyn Function>,
        outbuf: ByteRingBuffer,
    },
}

/// One position in the pipeline plus its descriptor wiring.
pub(crate) struct Stage {
    pub kind: StageKind,
    /// Read side facing the previous stage (or the input endpoint).
    pub stdin: Option<OwnedFd>,
    /// Write side facing the next stage (or the output endpoint).
    pub stdout: Option<OwnedFd>,
}

impl Stage {
    fn new(kind: StageKind) -> Self {
        Self {
            kind,
            stdin: None,
            stdout: None,
        }
    }

    /// True for in-process stages, whose descriptors the parent services.
    pub(crate) fn is_function(&self) -> bool {
        matches!(self.kind, StageKind::Function { .. })
    }

    /// Drain the upstream descriptor of a function stage into the
    /// transformer until it would block. End of stream delivers `eof` and
    /// closes the descriptor; a hard error closes it too.
    pub(crate) fn service_read(&mut self, log: &mut Logger) {
        let StageKind::Function { func, outbuf } = &mut self.kind else {
            return;
        };
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let Some(fd) = &self.stdin else { break };
            match rustix::io::read(fd, &mut buf) {
                Ok(0) => {
                    log.info(format_args!("closing stage input descriptor at end of stream"));
                    func.eof(&mut Writer::new(outbuf));
                    self.stdin = None;
                    break;
                }
                Ok(n) => {
                    log.trace(format_args!("read {n} bytes on stage input"));
                    func.process(&buf[..n], &mut Writer::new(outbuf));
                }
                Err(e) if e == Errno::AGAIN || e == Errno::INTR => break,
                Err(e) => {
                    log.error(format_args!(
                        "error reading stage input descriptor: {}",
                        io::Error::from(e)
                    ));
                    self.stdin = None;
                    break;
                }
            }
        }
    }

    /// Push a function stage's buffered output into the downstream
    /// descriptor until the buffer empties or the descriptor would block.
    /// Once the upstream side is closed and the buffer is drained, the
    /// descriptor is closed so the next stage sees end of stream.
    pub(crate) fn service_write(&mut self, log: &mut Logger) {
        let StageKind::Function { outbuf, .. } = &mut self.kind else {
            return;
        };
        loop {
            if outbuf.is_empty() {
                break;
            }
            let Some(fd) = &self.stdout else { break };
            match rustix::io::write(fd, outbuf.bottom()) {
                Ok(0) => break,
                Ok(n) => {
                    log.trace(format_args!("wrote {n} bytes on stage output"));
                    outbuf.advance(n);
                }
                Err(e) if e == Errno::AGAIN || e == Errno::INTR => break,
                Err(e) => {
                    log.error(format_args!(
                        "error writing stage output descriptor: {}",
                        io::Error::from(e)
                    ));
                    self.stdout = None;
                    break;
                }
            }
        }

        if self.stdin.is_none() && outbuf.is_empty() && self.stdout.is_some() {
            log.info(format_args!("closing stage output descriptor"));
            self.stdout = None;
        }
    }
}

/// Ordered list of pipeline stages; insertion order is pipeline order.
#[derive(Default)]
pub(crate) struct StageTable {
    stages: Vec<Stage>,
}

impl StageTable {
    /// Append a child-process stage. An empty argv is ignored.
    pub(crate) fn push_exec(&mut self, spec: ExecSpec) {
        if spec.argv.is_empty() {
            return;
        }
        self.stages.push(Stage::new(StageKind::Exec {
            spec,
            pid: None,
            status: None,
        }));
    }

    /// Append an in-process function stage.
    pub(crate) fn push_function(&mut self, func: Box<dyn Function>) {
        self.stages.push(Stage::new(StageKind::Function {
            func,
            outbuf: ByteRingBuffer::new(),
        }));
    }

    pub(crate) fn len(&self) -> usize {
        self.stages.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Stage> {
        self.stages.iter_mut()
    }
}

impl std::ops::Index<usize> for StageTable {
    type Output = Stage;

    fn index(&self, index: usize) -> &Stage {
        &self.stages[index]
    }
}

impl std::ops::IndexMut<usize> for StageTable {
    fn index_mut(&mut self, index: usize) -> &mut Stage {
        &mut self.stages[index]
    }
}
