//! The pipeline engine and its public handle.
//!
//! [`Pipeline`] builds a linear chain of child processes, optionally
//! interleaved with in-process [`Function`] stages, wires the chain to an
//! input and an output endpoint, and runs the whole arrangement to
//! completion from a single thread.
//!
//! ```text
//!    input                  stages                        output
//!   inherit |                                           | inherit
//!     fd    |              child process                |    fd
//!    file   |-> stage ->       or         -> stage -> ..|   file
//!    bytes  |              Function                     |   bytes
//!   Source  |                                           |   Sink
//! ```
//!
//! `run()` proceeds in four phases: plan descriptors, spawn children,
//! multiplex I/O across every parent-owned descriptor, and reap exit
//! statuses. Pipes are only created where the parent must participate;
//! direct child-to-child connections use pipes the parent hands off in
//! their entirety at spawn time.

use std::cell::RefCell;
use std::io;
use std::mem;
use std::os::fd::{AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::path::PathBuf;
use std::rc::Rc;

use rustix::event::{PollFd, PollFlags};
use rustix::io::Errno;

use crate::element::{Function, Sink, Source, Writer};
use crate::endpoint::{Input, Output};
use crate::error::{Error, Result};
use crate::log::{LogLevel, Logger};
use crate::ring::ByteRingBuffer;
use crate::stage::{ExecSpec, Stage, StageKind, StageTable, READ_CHUNK};
use crate::sys::{self, ChildStatus};

/// Identifies one armed descriptor across a poll round.
#[derive(Clone, Copy)]
enum Token {
    /// Parent side of the input pipe, armed for writing.
    Input,
    /// Parent side of the output pipe, armed for reading.
    Output,
    /// A function stage's upstream descriptor, armed for reading.
    StageIn(usize),
    /// A function stage's downstream descriptor, armed for writing.
    StageOut(usize),
}

/// The engine state behind a [`Pipeline`] handle.
#[derive(Default)]
struct Engine {
    log: Logger,
    input: Input,
    output: Output,
    stages: StageTable,
    /// Write end of the input pipe, present only for byte and source
    /// inputs.
    input_fd: Option<OwnedFd>,
    /// Read end of the output pipe, present only for byte and sink
    /// outputs.
    output_fd: Option<OwnedFd>,
    /// Holding buffer between a [`Source`] callback and the input pipe.
    source_ring: ByteRingBuffer,
}

impl Engine {
    fn set_input(&mut self, input: Input) {
        assert!(self.input.is_unset(), "input endpoint already configured");
        self.input = input;
    }

    fn set_output(&mut self, output: Output) {
        assert!(self.output.is_unset(), "output endpoint already configured");
        self.output = output;
    }

    fn add_exec(&mut self, prog: &str, args: &[&str], path_search: bool) {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(prog.to_string());
        argv.extend(args.iter().map(|a| a.to_string()));
        self.stages.push_exec(ExecSpec {
            prog: prog.to_string(),
            argv,
            env: None,
            path_search,
        });
    }

    fn add_exece(&mut self, prog: &str, argv: &[&str], env: Option<&[&str]>) {
        assert!(!argv.is_empty(), "exec stage needs at least argv[0]");
        self.stages.push_exec(ExecSpec {
            prog: prog.to_string(),
            argv: argv.iter().map(|a| a.to_string()).collect(),
            env: env.map(|e| e.iter().map(|v| v.to_string()).collect()),
            path_search: false,
        });
    }

    fn run(&mut self) -> Result<()> {
        if self.stages.is_empty() {
            return Err(Error::NoStages);
        }

        self.plan_input()?;
        self.plan_stage_pipes()?;
        self.plan_output()?;
        self.spawn_stages();
        self.multiplex()?;
        self.reap();

        self.log.info(format_args!("finished running pipeline"));
        Ok(())
    }

    /// Phase 1a: connect the input endpoint to the first stage's stdin.
    ///
    /// Descriptors a parent ends up owning (the input pipe's write end,
    /// and any first-stage stdin when that stage is a function) are
    /// switched to non-blocking; descriptors handed entirely to a child
    /// stay blocking.
    fn plan_input(&mut self) -> Result<()> {
        let first_is_function = self.stages[0].is_function();
        match mem::take(&mut self.input) {
            Input::Inherit => {}
            Input::Fd(fd) => {
                if first_is_function {
                    sys::set_nonblocking(&fd).map_err(Error::SetNonBlocking)?;
                }
                self.stages[0].stdin = Some(fd);
            }
            Input::File(path) => {
                let fd = sys::open_read(&path).map_err(|source| Error::OpenInput {
                    path: path.clone(),
                    source,
                })?;
                if first_is_function {
                    sys::set_nonblocking(&fd).map_err(Error::SetNonBlocking)?;
                }
                self.stages[0].stdin = Some(fd);
            }
            input @ (Input::Bytes { .. } | Input::Source(_)) => {
                let (read_end, write_end) = sys::pipe().map_err(Error::CreatePipe)?;
                sys::set_nonblocking(&write_end).map_err(Error::SetNonBlocking)?;
                if first_is_function {
                    sys::set_nonblocking(&read_end).map_err(Error::SetNonBlocking)?;
                }
                self.stages[0].stdin = Some(read_end);
                self.input_fd = Some(write_end);
                self.input = input;
            }
        }
        Ok(())
    }

    /// Phase 1b: exactly one pipe between each adjacent stage pair. An
    /// end adjoining a function stage is parent-owned and non-blocking.
    fn plan_stage_pipes(&mut self) -> Result<()> {
        for i in 0..self.stages.len() - 1 {
            let (read_end, write_end) = sys::pipe().map_err(Error::CreatePipe)?;
            if self.stages[i].is_function() {
                sys::set_nonblocking(&write_end).map_err(Error::SetNonBlocking)?;
            }
            if self.stages[i + 1].is_function() {
                sys::set_nonblocking(&read_end).map_err(Error::SetNonBlocking)?;
            }
            self.stages[i].stdout = Some(write_end);
            self.stages[i + 1].stdin = Some(read_end);
        }
        Ok(())
    }

    /// Phase 1c: connect the last stage's stdout to the output endpoint.
    fn plan_output(&mut self) -> Result<()> {
        let last = self.stages.len() - 1;
        let last_is_function = self.stages[last].is_function();
        match mem::take(&mut self.output) {
            Output::Inherit => {}
            Output::Fd(fd) => {
                if last_is_function {
                    sys::set_nonblocking(&fd).map_err(Error::SetNonBlocking)?;
                }
                self.stages[last].stdout = Some(fd);
            }
            Output::File { path, mode } => {
                let fd =
                    sys::open_write_truncate(&path, mode).map_err(|source| Error::OpenOutput {
                        path: path.clone(),
                        source,
                    })?;
                if last_is_function {
                    sys::set_nonblocking(&fd).map_err(Error::SetNonBlocking)?;
                }
                self.stages[last].stdout = Some(fd);
            }
            output @ (Output::Bytes(_) | Output::Sink(_)) => {
                let (read_end, write_end) = sys::pipe().map_err(Error::CreatePipe)?;
                sys::set_nonblocking(&read_end).map_err(Error::SetNonBlocking)?;
                if last_is_function {
                    sys::set_nonblocking(&write_end).map_err(Error::SetNonBlocking)?;
                }
                self.stages[last].stdout = Some(write_end);
                self.output_fd = Some(read_end);
                self.output = output;
            }
        }
        Ok(())
    }

    /// Phase 2: launch every exec stage. The stage's descriptors are
    /// consumed by the spawn and closed on the parent side; a launch
    /// failure is recorded as exit status 255 and the pipeline carries
    /// on, so downstream stages see end of stream instead of a hang.
    fn spawn_stages(&mut self) {
        let Engine { log, stages, .. } = self;
        for stage in stages.iter_mut() {
            let Stage {
                kind: StageKind::Exec { spec, pid, status },
                stdin,
                stdout,
            } = stage
            else {
                continue;
            };

            log.info(format_args!("exec {}", spec.command_line()));
            match sys::spawn(spec, stdin.take(), stdout.take()) {
                Ok(child) => *pid = Some(child.id()),
                Err(e) => {
                    log.error(format_args!("could not execute {}: {e}", spec.prog));
                    *status = Some(ChildStatus::launch_failed());
                }
            }
        }
    }

    /// Phase 3: multiplex every parent-owned descriptor until all of
    /// them have reached end of stream.
    fn multiplex(&mut self) -> Result<()> {
        let Engine {
            log,
            input,
            output,
            stages,
            input_fd,
            output_fd,
            source_ring,
        } = self;

        loop {
            let mut armed: Vec<(Token, RawFd, PollFlags)> = Vec::new();

            // Input side: arm for writing while there is anything left to
            // deliver. A source is topped up here, once its ring has been
            // drained; when it reports exhaustion the descriptor closes
            // and the first stage sees end of stream.
            if input_fd.is_some() {
                let keep = match input {
                    Input::Source(source) => {
                        if source_ring.is_empty()
                            && !source.poll(&mut Writer::new(source_ring))
                            && source_ring.is_empty()
                        {
                            log.info(format_args!("closing input descriptor, source exhausted"));
                            *input_fd = None;
                            false
                        } else {
                            true
                        }
                    }
                    Input::Bytes { data, pos } => {
                        if *pos >= data.len() {
                            log.info(format_args!(
                                "closing input descriptor, all bytes delivered"
                            ));
                            *input_fd = None;
                            false
                        } else {
                            true
                        }
                    }
                    _ => true,
                };
                if keep {
                    if let Some(fd) = input_fd.as_ref() {
                        log.debug(format_args!("waiting to write input descriptor"));
                        armed.push((Token::Input, fd.as_raw_fd(), PollFlags::OUT));
                    }
                }
            }

            for (i, stage) in stages.iter_mut().enumerate() {
                let StageKind::Function { outbuf, .. } = &stage.kind else {
                    continue;
                };
                if let Some(fd) = stage.stdin.as_ref() {
                    log.debug(format_args!("waiting to read stage {i} input"));
                    armed.push((Token::StageIn(i), fd.as_raw_fd(), PollFlags::IN));
                }
                if let Some(fd) = stage.stdout.as_ref() {
                    if !outbuf.is_empty() {
                        log.debug(format_args!("waiting to write stage {i} output"));
                        armed.push((Token::StageOut(i), fd.as_raw_fd(), PollFlags::OUT));
                    } else if stage.stdin.is_none() {
                        log.info(format_args!("closing stage {i} output descriptor"));
                        stage.stdout = None;
                    }
                }
            }

            if let Some(fd) = output_fd.as_ref() {
                log.debug(format_args!("waiting to read output descriptor"));
                armed.push((Token::Output, fd.as_raw_fd(), PollFlags::IN));
            }

            if armed.is_empty() {
                break;
            }

            // SAFETY: the raw descriptors gathered above belong to fds the
            // engine holds open; nothing closes them before dispatch below.
            let mut pollfds: Vec<PollFd<'_>> = armed
                .iter()
                .map(|&(_, fd, events)| {
                    PollFd::from_borrowed_fd(unsafe { BorrowedFd::borrow_raw(fd) }, events)
                })
                .collect();

            match rustix::event::poll(&mut pollfds, -1) {
                Ok(n) => log.trace(format_args!("{n} descriptors ready")),
                Err(e) if e == Errno::INTR => continue,
                Err(e) => return Err(Error::Poll(io::Error::from(e))),
            }

            let ready: Vec<Token> = armed
                .iter()
                .zip(&pollfds)
                .filter(|(_, pfd)| !pfd.revents().is_empty())
                .map(|(&(token, _, _), _)| token)
                .collect();
            drop(pollfds);

            for token in ready {
                match token {
                    Token::Input => service_input(log, input, input_fd, source_ring),
                    Token::Output => service_output(log, output, output_fd),
                    Token::StageIn(i) => stages[i].service_read(log),
                    Token::StageOut(i) => stages[i].service_write(log),
                }
            }
        }
        Ok(())
    }

    /// Phase 4: collect exit statuses until every spawned stage has been
    /// matched. Unknown pids are logged and ignored; a wait failure ends
    /// the loop and leaves the unmatched stages with the default status.
    fn reap(&mut self) {
        let Engine { log, stages, .. } = self;

        let mut pending = stages
            .iter()
            .filter(|s| {
                matches!(
                    s.kind,
                    StageKind::Exec {
                        pid: Some(_),
                        status: None,
                        ..
                    }
                )
            })
            .count();

        while pending > 0 {
            match sys::wait_any() {
                Ok(Some((pid, child_status))) => {
                    let mut matched = false;
                    for stage in stages.iter_mut() {
                        let StageKind::Exec {
                            pid: Some(stage_pid),
                            status,
                            ..
                        } = &mut stage.kind
                        else {
                            continue;
                        };
                        if *stage_pid == pid && status.is_none() {
                            if let Some(code) = child_status.code() {
                                log.info(format_args!(
                                    "exec stage pid {pid} finished with code {code}"
                                ));
                            } else if let Some(sig) = child_status.signal() {
                                log.info(format_args!(
                                    "exec stage pid {pid} terminated by signal {sig}"
                                ));
                            }
                            *status = Some(child_status);
                            pending -= 1;
                            matched = true;
                            break;
                        }
                    }
                    if !matched {
                        log.error(format_args!("wait returned unknown child pid {pid}"));
                    }
                }
                Ok(None) => {
                    log.error(format_args!("no children left while stages are unreaped"));
                    break;
                }
                Err(e) => {
                    log.error(format_args!("error waiting for children: {e}"));
                    break;
                }
            }
        }
    }

    fn stage_status(&self, stage: usize) -> ChildStatus {
        let stage = self.stages.get(stage).expect("stage index out of range");
        match &stage.kind {
            StageKind::Exec { status, .. } => status.unwrap_or_default(),
            StageKind::Function { .. } => {
                panic!("function stages have no exit status")
            }
        }
    }

    fn all_exit_zero(&self) -> bool {
        self.stages.iter().all(|s| match &s.kind {
            StageKind::Function { .. } => true,
            StageKind::Exec { status, .. } => status.unwrap_or_default().code() == Some(0),
        })
    }
}

/// Deliver pending input bytes into the first stage's descriptor until it
/// would block.
fn service_input(
    log: &mut Logger,
    input: &mut Input,
    input_fd: &mut Option<OwnedFd>,
    source_ring: &mut ByteRingBuffer,
) {
    match input {
        Input::Bytes { data, pos } => loop {
            let Some(fd) = input_fd.as_ref() else { break };
            if *pos >= data.len() {
                log.info(format_args!("closing input descriptor, all bytes delivered"));
                *input_fd = None;
                break;
            }
            match rustix::io::write(fd, &data[*pos..]) {
                Ok(0) => break,
                Ok(n) => {
                    log.trace(format_args!("wrote {n} bytes on input descriptor"));
                    *pos += n;
                }
                Err(e) if e == Errno::AGAIN || e == Errno::INTR => break,
                Err(e) => {
                    log.info(format_args!(
                        "error writing input descriptor, closing: {}",
                        io::Error::from(e)
                    ));
                    *input_fd = None;
                    break;
                }
            }
        },
        Input::Source(_) => loop {
            if source_ring.is_empty() {
                break;
            }
            let Some(fd) = input_fd.as_ref() else { break };
            match rustix::io::write(fd, source_ring.bottom()) {
                Ok(0) => break,
                Ok(n) => {
                    log.trace(format_args!("wrote {n} bytes on input descriptor"));
                    source_ring.advance(n);
                }
                Err(e) if e == Errno::AGAIN || e == Errno::INTR => break,
                Err(e) => {
                    log.info(format_args!(
                        "error writing input descriptor, closing: {}",
                        io::Error::from(e)
                    ));
                    *input_fd = None;
                    break;
                }
            }
        },
        _ => {}
    }
}

/// Drain the last stage's descriptor into the output endpoint until it
/// would block. End of stream notifies a sink and closes the descriptor.
fn service_output(log: &mut Logger, output: &mut Output, output_fd: &mut Option<OwnedFd>) {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        let Some(fd) = output_fd.as_ref() else { break };
        match rustix::io::read(fd, &mut buf) {
            Ok(0) => {
                log.info(format_args!("closing output descriptor at end of stream"));
                if let Output::Sink(sink) = output {
                    sink.eof();
                }
                *output_fd = None;
                break;
            }
            Ok(n) => {
                log.trace(format_args!("read {n} bytes on output descriptor"));
                match output {
                    Output::Bytes(dst) => dst.extend_from_slice(&buf[..n]),
                    Output::Sink(sink) => sink.process(&buf[..n]),
                    _ => {}
                }
            }
            Err(e) if e == Errno::AGAIN || e == Errno::INTR => break,
            Err(e) => {
                log.error(format_args!(
                    "error reading output descriptor, closing: {}",
                    io::Error::from(e)
                ));
                *output_fd = None;
                break;
            }
        }
    }
}

/// A linear pipeline of child processes and in-process stages.
///
/// The handle is cheap to clone; clones share one underlying engine, so a
/// pipeline can be configured from several places and run once. All
/// methods take `&self` and mutate through the shared engine.
///
/// # Example
///
/// ```ignore
/// use pipework::Pipeline;
///
/// let pipe = Pipeline::new();
/// pipe.set_input_bytes("test123");
/// pipe.set_output_bytes();
/// pipe.add_exec("/bin/cat", &[]);
/// pipe.add_execp("md5sum", &[]);
/// pipe.run()?;
///
/// assert!(pipe.all_exit_zero());
/// let digest = pipe.take_output_bytes();
/// ```
///
/// Callback objects ([`Source`], [`Function`], [`Sink`]) move into the
/// engine; share state with the caller through `Rc<RefCell<..>>` when
/// results must be inspected after the run. Callbacks must not use the
/// handle re-entrantly while `run()` is in progress.
#[derive(Clone, Default)]
pub struct Pipeline {
    engine: Rc<RefCell<Engine>>,
}

impl Pipeline {
    /// Create an empty pipeline with inherit endpoints and no stages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the diagnostic verbosity. The default is [`LogLevel::Error`].
    pub fn set_log_level(&self, level: LogLevel) {
        self.engine.borrow_mut().log.set_level(level);
    }

    /// Route formatted diagnostic lines to `sink` instead of the
    /// [`tracing`] macros.
    pub fn set_log_sink(&self, sink: impl FnMut(&str) + 'static) {
        self.engine.borrow_mut().log.set_sink(Box::new(sink));
    }

    /// Feed the first stage from an already-open descriptor. The
    /// descriptor is handed over in its entirety; the parent does not
    /// read or write it.
    ///
    /// # Panics
    ///
    /// Panics if an input endpoint is already configured.
    pub fn set_input_fd(&self, fd: impl Into<OwnedFd>) {
        self.engine.borrow_mut().set_input(Input::Fd(fd.into()));
    }

    /// Feed the first stage from a file, opened read-only at run time.
    ///
    /// # Panics
    ///
    /// Panics if an input endpoint is already configured.
    pub fn set_input_file(&self, path: impl Into<PathBuf>) {
        self.engine.borrow_mut().set_input(Input::File(path.into()));
    }

    /// Feed the first stage from an in-memory byte sequence.
    ///
    /// # Panics
    ///
    /// Panics if an input endpoint is already configured.
    pub fn set_input_bytes(&self, data: impl Into<Vec<u8>>) {
        self.engine.borrow_mut().set_input(Input::Bytes {
            data: data.into(),
            pos: 0,
        });
    }

    /// Feed the first stage from a [`Source`] callback, polled for data
    /// while the pipeline runs.
    ///
    /// # Panics
    ///
    /// Panics if an input endpoint is already configured.
    pub fn set_input_source(&self, source: impl Source + 'static) {
        self.engine
            .borrow_mut()
            .set_input(Input::Source(Box::new(source)));
    }

    /// Send the last stage's output to an already-open descriptor.
    ///
    /// # Panics
    ///
    /// Panics if an output endpoint is already configured.
    pub fn set_output_fd(&self, fd: impl Into<OwnedFd>) {
        self.engine.borrow_mut().set_output(Output::Fd(fd.into()));
    }

    /// Send the last stage's output to a file, created or truncated with
    /// permission bits `0o666`.
    ///
    /// # Panics
    ///
    /// Panics if an output endpoint is already configured.
    pub fn set_output_file(&self, path: impl Into<PathBuf>) {
        self.set_output_file_with_mode(path, 0o666);
    }

    /// Like [`set_output_file`](Self::set_output_file) with explicit
    /// permission bits.
    ///
    /// # Panics
    ///
    /// Panics if an output endpoint is already configured.
    pub fn set_output_file_with_mode(&self, path: impl Into<PathBuf>, mode: u32) {
        self.engine.borrow_mut().set_output(Output::File {
            path: path.into(),
            mode,
        });
    }

    /// Collect the last stage's output in memory; retrieve it with
    /// [`take_output_bytes`](Self::take_output_bytes) after the run.
    ///
    /// # Panics
    ///
    /// Panics if an output endpoint is already configured.
    pub fn set_output_bytes(&self) {
        self.engine.borrow_mut().set_output(Output::Bytes(Vec::new()));
    }

    /// Deliver the last stage's output to a [`Sink`] callback as it
    /// arrives.
    ///
    /// # Panics
    ///
    /// Panics if an output endpoint is already configured.
    pub fn set_output_sink(&self, sink: impl Sink + 'static) {
        self.engine
            .borrow_mut()
            .set_output(Output::Sink(Box::new(sink)));
    }

    /// The bytes collected by a [`set_output_bytes`](Self::set_output_bytes)
    /// endpoint, leaving an empty buffer behind.
    ///
    /// # Panics
    ///
    /// Panics if the output endpoint is not collecting bytes.
    pub fn take_output_bytes(&self) -> Vec<u8> {
        let mut engine = self.engine.borrow_mut();
        match &mut engine.output {
            Output::Bytes(data) => mem::take(data),
            _ => panic!("output endpoint is not collecting bytes"),
        }
    }

    /// Append a child-process stage. `argv[0]` is set to `prog`, which is
    /// used as a pathname (no `PATH` search, like `execv`).
    pub fn add_exec(&self, prog: &str, args: &[&str]) {
        self.engine.borrow_mut().add_exec(prog, args, false);
    }

    /// Append a child-process stage resolved against `PATH` (like
    /// `execvp`). `argv[0]` is set to `prog`.
    pub fn add_execp(&self, prog: &str, args: &[&str]) {
        self.engine.borrow_mut().add_exec(prog, args, true);
    }

    /// Append a child-process stage with a full argument vector and an
    /// optional explicit environment of `KEY=value` entries (like
    /// `execve`). `argv[0]` is taken from `argv` as given, so the
    /// program name a child observes may differ from `prog`.
    ///
    /// # Panics
    ///
    /// Panics if `argv` is empty.
    pub fn add_exece(&self, prog: &str, argv: &[&str], env: Option<&[&str]>) {
        self.engine.borrow_mut().add_exece(prog, argv, env);
    }

    /// Append an in-process [`Function`] stage.
    pub fn add_function(&self, func: impl Function + 'static) {
        self.engine.borrow_mut().stages.push_function(Box::new(func));
    }

    /// Number of stages added so far.
    pub fn stage_count(&self) -> usize {
        self.engine.borrow().stages.len()
    }

    /// Run the pipeline to completion: plan descriptors, spawn every
    /// exec stage, multiplex I/O across the parent-owned descriptors
    /// while draining function stages, and reap the children.
    ///
    /// Returns `Err` only for structural failures (no stages, pipe or
    /// file setup, readiness polling). A child that fails to launch or
    /// exits non-zero is reported through the exit-status surface
    /// instead.
    pub fn run(&self) -> Result<()> {
        self.engine.borrow_mut().run()
    }

    /// Raw platform wait status of an exec stage.
    ///
    /// # Panics
    ///
    /// Panics if `stage` is out of range or names a function stage.
    pub fn exit_raw(&self, stage: usize) -> i32 {
        self.engine.borrow().stage_status(stage).raw()
    }

    /// Exit code of a normally terminated exec stage, or −1 if it was
    /// terminated by a signal.
    ///
    /// # Panics
    ///
    /// Panics if `stage` is out of range or names a function stage.
    pub fn exit_code(&self, stage: usize) -> i32 {
        self.engine.borrow().stage_status(stage).code().unwrap_or(-1)
    }

    /// Signal that terminated an exec stage abnormally, or −1 if it
    /// exited normally.
    ///
    /// # Panics
    ///
    /// Panics if `stage` is out of range or names a function stage.
    pub fn exit_signal(&self, stage: usize) -> i32 {
        self.engine
            .borrow()
            .stage_status(stage)
            .signal()
            .unwrap_or(-1)
    }

    /// True iff every exec stage terminated normally with exit code 0.
    /// Function stages are ignored.
    pub fn all_exit_zero(&self) -> bool {
        self.engine.borrow().all_exit_zero()
    }
}
