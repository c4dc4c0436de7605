//! Host capability layer: pipes, descriptor modes, endpoint files,
//! child processes.
//!
//! Everything the engine needs from the operating system funnels through
//! here. Descriptors are created close-on-exec, so a child only ever
//! sees one by receiving it as stdin or stdout at spawn time; the
//! remaining pipe ends stay private to the parent regardless of how many
//! children are launched.

use std::io;
use std::os::fd::{AsFd, OwnedFd};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use rustix::fs::{fcntl_getfl, fcntl_setfl, Mode, OFlags};
use rustix::pipe::{pipe_with, PipeFlags};
use rustix::process::{wait, WaitOptions};

use crate::stage::ExecSpec;

/// Create an anonymous unidirectional byte channel as
/// `(read_end, write_end)`, both close-on-exec.
pub(crate) fn pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    Ok(pipe_with(PipeFlags::CLOEXEC)?)
}

/// Switch a descriptor to non-blocking mode, so reads and writes report
/// `EAGAIN` instead of suspending the parent.
pub(crate) fn set_nonblocking<F: AsFd>(fd: F) -> io::Result<()> {
    let flags = fcntl_getfl(&fd)?;
    fcntl_setfl(&fd, flags | OFlags::NONBLOCK)?;
    Ok(())
}

/// Open the input file endpoint read-only.
pub(crate) fn open_read(path: &Path) -> io::Result<OwnedFd> {
    Ok(rustix::fs::open(
        path,
        OFlags::RDONLY | OFlags::CLOEXEC,
        Mode::empty(),
    )?)
}

/// Create or truncate the output file endpoint write-only with the given
/// permission bits.
pub(crate) fn open_write_truncate(path: &Path, mode: u32) -> io::Result<OwnedFd> {
    Ok(rustix::fs::open(
        path,
        OFlags::WRONLY | OFlags::CREATE | OFlags::TRUNC | OFlags::CLOEXEC,
        Mode::from_bits_truncate(mode),
    )?)
}

/// Launch the child process described by `spec` with the given stdin and
/// stdout descriptors; `None` inherits the parent's.
///
/// Without PATH search, a bare program name resolves against the working
/// directory, matching `execv` pathname semantics. `argv[0]` is passed
/// through as given, so callers may fake the program name.
pub(crate) fn spawn(
    spec: &ExecSpec,
    stdin: Option<OwnedFd>,
    stdout: Option<OwnedFd>,
) -> io::Result<Child> {
    let program = if spec.path_search || spec.prog.contains('/') {
        PathBuf::from(&spec.prog)
    } else {
        Path::new(".").join(&spec.prog)
    };

    let mut cmd = Command::new(program);
    if let Some((argv0, rest)) = spec.argv.split_first() {
        cmd.arg0(argv0);
        cmd.args(rest);
    }
    if let Some(env) = &spec.env {
        cmd.env_clear();
        for entry in env {
            match entry.split_once('=') {
                Some((key, value)) => cmd.env(key, value),
                None => cmd.env(entry, ""),
            };
        }
    }
    if let Some(fd) = stdin {
        cmd.stdin(Stdio::from(fd));
    }
    if let Some(fd) = stdout {
        cmd.stdout(Stdio::from(fd));
    }
    cmd.spawn()
}

/// Block until any child of this process changes state; returns its pid
/// and decoded exit status, or `None` when there is no child left.
pub(crate) fn wait_any() -> io::Result<Option<(u32, ChildStatus)>> {
    match wait(WaitOptions::empty())? {
        Some((pid, status)) => Ok(Some((
            pid.as_raw_nonzero().get() as u32,
            ChildStatus::from_wait(status),
        ))),
        None => Ok(None),
    }
}

/// Decoded exit state of one exec stage.
///
/// Captures the raw `wait` status plus its interpretation: the exit code
/// of a normally terminated child, or the signal that killed it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ChildStatus {
    raw: i32,
    code: Option<i32>,
    signal: Option<i32>,
}

impl Default for ChildStatus {
    /// The status an unreaped stage reads as: normal exit, code 0.
    fn default() -> Self {
        Self {
            raw: 0,
            code: Some(0),
            signal: None,
        }
    }
}

impl ChildStatus {
    /// Status recorded when the program could not be executed at all.
    /// Indistinguishable from a child exiting 255, which is the contract.
    pub(crate) fn launch_failed() -> Self {
        Self {
            raw: 255 << 8,
            code: Some(255),
            signal: None,
        }
    }

    fn from_wait(status: rustix::process::WaitStatus) -> Self {
        Self {
            raw: status.as_raw() as i32,
            code: status.exit_status().map(|c| c as i32),
            signal: status.terminating_signal().map(|s| s as i32),
        }
    }

    /// Raw platform wait status.
    pub(crate) fn raw(&self) -> i32 {
        self.raw
    }

    /// Exit code of a normally terminated child.
    pub(crate) fn code(&self) -> Option<i32> {
        self.code
    }

    /// Signal that terminated the child abnormally.
    pub(crate) fn signal(&self) -> Option<i32> {
        self.signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustix::io::Errno;

    #[test]
    fn test_pipe_roundtrip() {
        let (read_fd, write_fd) = pipe().unwrap();

        rustix::io::write(&write_fd, b"through the pipe").unwrap();
        drop(write_fd);

        let mut buf = [0u8; 64];
        let n = rustix::io::read(&read_fd, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"through the pipe");

        // Writer closed: the next read reports end of stream.
        let n = rustix::io::read(&read_fd, &mut buf).unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_nonblocking_read_reports_again() {
        let (read_fd, _write_fd) = pipe().unwrap();
        set_nonblocking(&read_fd).unwrap();

        let mut buf = [0u8; 16];
        let err = rustix::io::read(&read_fd, &mut buf).unwrap_err();
        assert_eq!(err, Errno::AGAIN);
    }

    #[test]
    fn test_spawn_and_wait_roundtrip() {
        let (read_fd, write_fd) = pipe().unwrap();
        let spec = ExecSpec {
            prog: "/bin/echo".into(),
            argv: vec!["/bin/echo".into(), "spawned".into()],
            env: None,
            path_search: false,
        };
        let child = spawn(&spec, None, Some(write_fd)).unwrap();
        let pid = child.id();

        let mut buf = [0u8; 64];
        let n = rustix::io::read(&read_fd, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"spawned\n");

        let (reaped, status) = wait_any().unwrap().unwrap();
        assert_eq!(reaped, pid);
        assert_eq!(status.code(), Some(0));
        assert_eq!(status.signal(), None);
    }

    #[test]
    fn test_default_status_reads_as_success() {
        let status = ChildStatus::default();
        assert_eq!(status.raw(), 0);
        assert_eq!(status.code(), Some(0));
        assert_eq!(status.signal(), None);
    }

    #[test]
    fn test_launch_failed_reads_as_255() {
        let status = ChildStatus::launch_failed();
        assert_eq!(status.code(), Some(255));
        assert_eq!(status.signal(), None);
    }
}
