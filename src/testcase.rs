//! Test case loading and expected-value extraction.
//!
//! A test case is a plain text file with two logical parts: a header line and
//! a body. The header's first parenthesized group, trimmed, is the expected
//! output of the subject program; the body is fed verbatim to the subject's
//! standard input.

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::HarnessError;

/// First parenthesized group on the header line, non-greedy: the capture
/// stops at the first `)`. Multiple or nested groups beyond the first are
/// deliberately ignored.
static EXPECTED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\((.*?)\)").unwrap_or_else(|e| panic!("invalid expected-value pattern: {e}"))
});

/// One test file, split and decoded, immutable for the duration of the run.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub path: PathBuf,
    /// Trimmed contents of the first parenthesized group on the header line.
    pub expected: String,
    /// Everything after the first line terminator, verbatim. Empty when the
    /// file has a single line.
    pub body: String,
}

impl TestCase {
    /// Load a test case from disk. Fails with `HarnessError::File` when the
    /// path is unreadable and `HarnessError::MalformedHeader` when the first
    /// line carries no parenthesized expected value.
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let content = fs::read_to_string(path).map_err(|source| HarnessError::File {
            path: path.to_path_buf(),
            source,
        })?;

        let (header, body) = split_header(&content);
        let expected = extract_expected(header).ok_or_else(|| HarnessError::MalformedHeader {
            path: path.to_path_buf(),
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            body: body.to_string(),
        })
    }
}

/// Split file content at exactly the first line terminator. A trailing `\r`
/// is removed from the header so CRLF files extract cleanly; the body is
/// never altered.
fn split_header(content: &str) -> (&str, &str) {
    match content.split_once('\n') {
        Some((header, body)) => (header.strip_suffix('\r').unwrap_or(header), body),
        None => (content, ""),
    }
}

/// Extract the expected value from a header line: the first `(...)` group,
/// with surrounding whitespace stripped. `None` when the header has no group.
fn extract_expected(header: &str) -> Option<&str> {
    EXPECTED_RE
        .captures(header)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}
