//! Harness error taxonomy.
//!
//! Per-file errors (`File`, `MalformedHeader`, `Timeout`) abort only the file
//! that raised them and are converted to a report line by the harness.
//! `Launch` is fatal to the whole run: no further test case can produce a
//! meaningful result without a runnable subject executable. `SubprocessIo` is
//! folded into a failed comparison for the affected file.

use std::path::PathBuf;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum HarnessError {
    #[error("cannot read test file '{path}': {source}", path = .path.display())]
    #[diagnostic(
        code(attest::file),
        help("check that the path exists and is a readable file")
    )]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no parenthesized expected value on the first line of '{path}'", path = .path.display())]
    #[diagnostic(
        code(attest::malformed_header),
        help("the first line must contain the expected output in parentheses, e.g. `( 42 )`")
    )]
    MalformedHeader { path: PathBuf },

    #[error("cannot launch subject program '{subject}': {source}", subject = .subject.display())]
    #[diagnostic(
        code(attest::launch),
        help("point --subject at the interpreter executable under test")
    )]
    Launch {
        subject: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o failure while talking to the subject program: {source}")]
    #[diagnostic(code(attest::subprocess_io))]
    SubprocessIo {
        #[source]
        source: std::io::Error,
    },

    #[error("subject program did not exit within {}s", .timeout.as_secs())]
    #[diagnostic(
        code(attest::timeout),
        help("raise --timeout, or investigate whether the test input hangs the subject")
    )]
    Timeout { timeout: Duration },
}

impl HarnessError {
    /// Fatal errors abort the whole run; everything else is isolated to one file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HarnessError::Launch { .. })
    }
}
