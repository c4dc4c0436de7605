//! End-to-end tests driving real child processes.
//!
//! These tests verify that:
//! - Bytes pass through identity pipelines unchanged
//! - Every endpoint kind (file, fd, bytes, callback) wires up correctly
//! - Function stages observe and forward the stream between children
//! - Exit codes, signals and launch failures are reported per stage

use std::cell::RefCell;
use std::io::Write as _;
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard};

use pipework::{Function, LogLevel, Pipeline, Sink, Source, Writer};
use sha2::{Digest, Sha256};

/// Reaping children is process-wide state, so pipeline runs must not
/// overlap within this test binary.
static RUN_LOCK: Mutex<()> = Mutex::new(());

fn run_lock() -> MutexGuard<'static, ()> {
    RUN_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

const MD5_TEST123: &[u8] = b"cc03e747a6afbbcbf8be7668acfebee5";

// ============================================================================
// Byte endpoints through external programs
// ============================================================================

#[test]
fn test_echo_to_bytes() {
    let _guard = run_lock();
    let pipe = Pipeline::new();
    pipe.set_output_bytes();
    pipe.add_exec("/bin/echo", &["test123"]);

    pipe.run().unwrap();
    assert!(pipe.all_exit_zero());
    assert_eq!(pipe.take_output_bytes(), b"test123\n");
}

#[test]
fn test_bytes_through_cat_unchanged() {
    let _guard = run_lock();
    let mut input = b"test123".to_vec();
    input.resize(input.len() + (1 << 20), 1u8);

    let pipe = Pipeline::new();
    pipe.set_input_bytes(input.clone());
    pipe.set_output_bytes();
    pipe.add_exec("/bin/cat", &[]);

    pipe.run().unwrap();
    assert!(pipe.all_exit_zero());
    assert_eq!(pipe.take_output_bytes(), input);
}

#[test]
fn test_bytes_through_md5() {
    let _guard = run_lock();
    let pipe = Pipeline::new();
    pipe.set_input_bytes("test123");
    pipe.set_output_bytes();
    pipe.add_execp("md5sum", &[]);

    pipe.run().unwrap();
    assert!(pipe.all_exit_zero());
    assert!(pipe.take_output_bytes().starts_with(MD5_TEST123));
}

#[test]
fn test_bytes_through_cat_then_md5() {
    let _guard = run_lock();
    let pipe = Pipeline::new();
    pipe.set_input_bytes("test123");
    pipe.set_output_bytes();
    pipe.add_exec("/bin/cat", &[]);
    pipe.add_execp("md5sum", &[]);

    pipe.run().unwrap();
    assert!(pipe.all_exit_zero());
    assert!(pipe.take_output_bytes().starts_with(MD5_TEST123));
}

// ============================================================================
// File and descriptor endpoints
// ============================================================================

#[test]
fn test_file_input_through_sort() {
    let _guard = run_lock();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"pear\napple\norange\n").unwrap();

    let pipe = Pipeline::new();
    pipe.set_input_file(file.path());
    pipe.set_output_bytes();
    pipe.add_execp("sort", &[]);

    pipe.run().unwrap();
    assert!(pipe.all_exit_zero());
    assert_eq!(pipe.take_output_bytes(), b"apple\norange\npear\n");
}

#[test]
fn test_fd_input_through_cat() {
    let _guard = run_lock();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"descriptor endpoint\n").unwrap();
    let reopened = std::fs::File::open(file.path()).unwrap();

    let pipe = Pipeline::new();
    pipe.set_input_fd(reopened);
    pipe.set_output_bytes();
    pipe.add_exec("/bin/cat", &[]);

    pipe.run().unwrap();
    assert!(pipe.all_exit_zero());
    assert_eq!(pipe.take_output_bytes(), b"descriptor endpoint\n");
}

#[test]
fn test_output_file_is_written() {
    let _guard = run_lock();
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("result.txt");

    let pipe = Pipeline::new();
    pipe.set_input_bytes("into the file");
    pipe.set_output_file(&out_path);
    pipe.add_exec("/bin/cat", &[]);

    pipe.run().unwrap();
    assert!(pipe.all_exit_zero());
    assert_eq!(std::fs::read(&out_path).unwrap(), b"into the file");
}

// ============================================================================
// Callback endpoints and function stages
// ============================================================================

/// Emits `i as u8` for `i` in `0..1000` per poll until 100 KiB have been
/// produced, recording everything it wrote.
struct CountSource {
    remaining: usize,
    wrote: Rc<RefCell<Vec<u8>>>,
}

impl CountSource {
    fn new(wrote: Rc<RefCell<Vec<u8>>>) -> Self {
        Self {
            remaining: 100 * 1024,
            wrote,
        }
    }
}

impl Source for CountSource {
    fn poll(&mut self, out: &mut Writer<'_>) -> bool {
        let mut i = 0usize;
        while i < 1000 && self.remaining > 0 {
            let byte = [i as u8];
            out.write(&byte);
            self.wrote.borrow_mut().push(byte[0]);
            i += 1;
            self.remaining -= 1;
        }
        self.remaining > 0
    }
}

/// Expected SHA-256 of the full `CountSource` stream.
const COUNT_SOURCE_SHA256: &str =
    "56ecf4a9d98115c3b2b47a5c0af9a1562c674e086bc05c095acbaaf4531359e5";

/// Forwards every byte unchanged while hashing the stream; publishes the
/// hex digest on end of stream.
struct DigestThrough {
    hasher: Sha256,
    digest: Rc<RefCell<String>>,
}

impl DigestThrough {
    fn new(digest: Rc<RefCell<String>>) -> Self {
        Self {
            hasher: Sha256::new(),
            digest,
        }
    }
}

impl Function for DigestThrough {
    fn process(&mut self, data: &[u8], out: &mut Writer<'_>) {
        self.hasher.update(data);
        out.write(data);
    }

    fn eof(&mut self, _out: &mut Writer<'_>) {
        *self.digest.borrow_mut() = hex::encode(self.hasher.finalize_reset());
    }
}

/// Collects output and checks it against the md5 of `test123` on eof.
struct Md5CheckSink {
    collected: Vec<u8>,
    ok: Rc<RefCell<bool>>,
}

impl Sink for Md5CheckSink {
    fn process(&mut self, data: &[u8]) {
        self.collected.extend_from_slice(data);
    }

    fn eof(&mut self) {
        *self.ok.borrow_mut() = self.collected.starts_with(MD5_TEST123);
    }
}

#[test]
fn test_sink_receives_output_and_eof() {
    let _guard = run_lock();
    let ok = Rc::new(RefCell::new(false));

    let pipe = Pipeline::new();
    pipe.set_input_bytes("test123");
    pipe.set_output_sink(Md5CheckSink {
        collected: Vec::new(),
        ok: ok.clone(),
    });
    pipe.add_execp("md5sum", &[]);

    pipe.run().unwrap();
    assert!(pipe.all_exit_zero());
    assert!(*ok.borrow());
}

#[test]
fn test_source_through_cat_unchanged() {
    let _guard = run_lock();
    let wrote = Rc::new(RefCell::new(Vec::new()));

    let pipe = Pipeline::new();
    pipe.set_input_source(CountSource::new(wrote.clone()));
    pipe.set_output_bytes();
    pipe.add_execp("cat", &[]);

    pipe.run().unwrap();
    assert!(pipe.all_exit_zero());
    let output = pipe.take_output_bytes();
    assert_eq!(output.len(), 100 * 1024);
    assert_eq!(output, *wrote.borrow());
}

#[test]
fn test_function_between_programs_preserves_stream() {
    let _guard = run_lock();
    let wrote = Rc::new(RefCell::new(Vec::new()));
    let digest = Rc::new(RefCell::new(String::new()));

    let pipe = Pipeline::new();
    pipe.set_input_source(CountSource::new(wrote.clone()));
    pipe.set_output_bytes();
    pipe.add_execp("cat", &[]);
    pipe.add_function(DigestThrough::new(digest.clone()));
    pipe.add_execp("sha256sum", &[]);

    pipe.run().unwrap();
    assert!(pipe.all_exit_zero());
    assert_eq!(*digest.borrow(), COUNT_SOURCE_SHA256);
    assert!(pipe
        .take_output_bytes()
        .starts_with(COUNT_SOURCE_SHA256.as_bytes()));
}

#[test]
fn test_function_as_last_stage() {
    let _guard = run_lock();
    let wrote = Rc::new(RefCell::new(Vec::new()));
    let digest = Rc::new(RefCell::new(String::new()));

    let pipe = Pipeline::new();
    pipe.set_input_source(CountSource::new(wrote.clone()));
    pipe.set_output_bytes();
    pipe.add_execp("cat", &[]);
    pipe.add_function(DigestThrough::new(digest.clone()));

    pipe.run().unwrap();
    assert!(pipe.all_exit_zero());
    assert_eq!(*digest.borrow(), COUNT_SOURCE_SHA256);
    assert_eq!(pipe.take_output_bytes().len(), 100 * 1024);
}

// ============================================================================
// Environment, exit codes and failure reporting
// ============================================================================

#[test]
fn test_exece_passes_environment() {
    let _guard = run_lock();
    let pipe = Pipeline::new();
    pipe.set_output_bytes();
    pipe.add_exece("/bin/sh", &["/bin/sh", "-c", "set"], Some(&["TEST=123"]));

    pipe.run().unwrap();
    assert!(pipe.all_exit_zero());
    let output = String::from_utf8_lossy(&pipe.take_output_bytes()).into_owned();
    assert!(output.contains("TEST=123"), "environment dump: {output}");
}

#[test]
fn test_exit_code_is_reported() {
    let _guard = run_lock();
    let pipe = Pipeline::new();
    pipe.add_exec("/bin/sh", &["-c", "exit 7"]);

    pipe.run().unwrap();
    assert_eq!(pipe.exit_code(0), 7);
    assert_eq!(pipe.exit_signal(0), -1);
    assert!(!pipe.all_exit_zero());
}

#[test]
fn test_exit_signal_is_reported() {
    let _guard = run_lock();
    let pipe = Pipeline::new();
    pipe.add_exec("/bin/sh", &["-c", "kill -KILL $$"]);

    pipe.run().unwrap();
    assert_eq!(pipe.exit_signal(0), 9);
    assert_eq!(pipe.exit_code(0), -1);
    assert!(!pipe.all_exit_zero());
}

#[test]
fn test_missing_program_reports_255() {
    let _guard = run_lock();
    let pipe = Pipeline::new();
    pipe.set_log_level(LogLevel::Info);
    pipe.set_log_sink(|_line: &str| {});
    pipe.add_exec("xyz-non-existing-program", &[]);

    pipe.run().unwrap();
    assert_eq!(pipe.exit_code(0), 255);
    assert!(!pipe.all_exit_zero());
}

#[test]
fn test_mixed_success_is_observable_per_stage() {
    let _guard = run_lock();
    let pipe = Pipeline::new();
    pipe.set_input_bytes("partial");
    pipe.set_output_bytes();
    pipe.add_exec("/bin/cat", &[]);
    pipe.add_exec("/bin/sh", &["-c", "cat; exit 3"]);

    pipe.run().unwrap();
    assert_eq!(pipe.exit_code(0), 0);
    assert_eq!(pipe.exit_code(1), 3);
    assert!(!pipe.all_exit_zero());
    assert_eq!(pipe.take_output_bytes(), b"partial");
}
