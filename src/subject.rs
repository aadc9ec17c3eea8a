//! Subject program orchestration.
//!
//! The interpreter under test is an opaque external executable: the harness
//! interacts with it purely through byte streams. Each invocation spawns a
//! fresh subprocess, feeds it the test body on stdin, closes the stream so
//! the subject can observe end-of-input, drains stdout and stderr fully, and
//! waits for termination. The subprocess is completely reaped before the
//! next test case begins.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::errors::HarnessError;

/// How often the harness checks for subprocess exit when a timeout is set.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The subject executable plus its wait policy.
#[derive(Debug, Clone)]
pub struct Subject {
    path: PathBuf,
    timeout: Option<Duration>,
}

impl Subject {
    pub fn new(path: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            path: path.into(),
            timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the subject once with `input` on its stdin and return the captured
    /// stdout, untrimmed. Stderr is drained and discarded so a chatty subject
    /// cannot deadlock on a full pipe. The exit code is intentionally ignored.
    pub fn invoke(&self, input: &str) -> Result<String, HarnessError> {
        let mut child = Command::new(&self.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HarnessError::Launch {
                subject: self.path.clone(),
                source,
            })?;

        // Writer and reader threads run concurrently with the wait so no
        // pipe can fill up and stall the subject.
        let writer = spawn_stdin_writer(&mut child, input.as_bytes().to_vec());
        let stdout_reader = spawn_reader(child.stdout.take());
        let stderr_drain = spawn_drain(child.stderr.take());

        // On a wait error (timeout, try_wait failure) the pipes may still be
        // held open by orphaned grandchildren of the killed subject, so the
        // reader threads are left detached instead of joined.
        self.wait(&mut child)?;

        let bytes = join_reader(stdout_reader)?;
        if let Some(handle) = stderr_drain {
            let _ = handle.join();
        }
        if let Some(handle) = writer {
            let _ = handle.join();
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Wait for the child to exit. With no timeout this blocks indefinitely;
    /// with one, the child is polled and killed on expiry.
    fn wait(&self, child: &mut Child) -> Result<(), HarnessError> {
        let Some(timeout) = self.timeout else {
            child
                .wait()
                .map_err(|source| HarnessError::SubprocessIo { source })?;
            return Ok(());
        };

        let deadline = Instant::now() + timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => return Ok(()),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(HarnessError::Timeout { timeout });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(source) => return Err(HarnessError::SubprocessIo { source }),
            }
        }
    }
}

/// Feed the body to the child's stdin and close it. Write errors are ignored:
/// a subject that exits without draining its input is not a harness failure.
fn spawn_stdin_writer(child: &mut Child, input: Vec<u8>) -> Option<JoinHandle<()>> {
    let mut stdin = child.stdin.take()?;
    Some(thread::spawn(move || {
        let _ = stdin.write_all(&input);
        // stdin drops here, delivering end-of-input to the subject
    }))
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<io::Result<Vec<u8>>>> {
    let mut pipe = pipe?;
    Some(thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    }))
}

fn spawn_drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<()>> {
    let mut pipe = pipe?;
    Some(thread::spawn(move || {
        let _ = io::copy(&mut pipe, &mut io::sink());
    }))
}

fn join_reader(handle: Option<JoinHandle<io::Result<Vec<u8>>>>) -> Result<Vec<u8>, HarnessError> {
    let Some(handle) = handle else {
        return Ok(Vec::new());
    };
    handle
        .join()
        .map_err(|_| HarnessError::SubprocessIo {
            source: io::Error::new(io::ErrorKind::Other, "stdout reader thread panicked"),
        })?
        .map_err(|source| HarnessError::SubprocessIo { source })
}
