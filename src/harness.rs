//! Test case runner and reporting.
//!
//! One report line per test file on stdout:
//!
//! ```text
//! OK: <path>
//! FAIL: <path> | Expected [<expected>] got [<actual>]
//! ERROR: <path> | <message>
//! ```
//!
//! Per-file errors are reported, never silently skipped, and never abort the
//! rest of the run. Only a launch failure is fatal: without a runnable
//! subject, no further file can produce a meaningful result. Run totals go to
//! stderr so stdout carries exactly one line per test case.

use std::path::{Path, PathBuf};
use std::time::Duration;

use difference::{Changeset, Difference};

use crate::errors::HarnessError;
use crate::subject::Subject;
use crate::testcase::TestCase;

// =============================================================================
// CORE TYPES
// =============================================================================

/// The outcome of running one test case. Created right after the subprocess
/// is reaped, consumed by the reporter, not retained across cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestResult {
    /// Trimmed actual output matched the expected value exactly.
    Pass { path: String },
    /// Outputs differed (or the subject's stdout could not be read).
    Fail {
        path: String,
        expected: String,
        actual: String,
    },
    /// The file itself could not be processed: unreadable, malformed header,
    /// or subject timeout.
    Error { path: String, message: String },
}

/// Configuration for a harness run.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// The subject executable, invoked with no arguments.
    pub subject: PathBuf,
    /// Maximum wait per subprocess. `None` blocks until the subject exits.
    pub timeout: Option<Duration>,
    pub use_colors: bool,
    /// Print a line diff of expected vs actual to stderr on failure.
    pub verbose: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            subject: PathBuf::from("./subject"),
            timeout: None,
            use_colors: atty::is(atty::Stream::Stdout),
            verbose: false,
        }
    }
}

// Color constants for terminal output
const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";

impl TestConfig {
    /// Apply color formatting to text if colors are enabled.
    pub fn colorize(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}{}", color, text, RESET)
        } else {
            text.to_string()
        }
    }
}

// =============================================================================
// TEST EXECUTION
// =============================================================================

/// Run a single test case: load, extract the expected value, execute the
/// subject with the body on stdin, trim, compare.
///
/// Per-file failures come back as `TestResult::Error` (or a `Fail` in the
/// subprocess-I/O case); only a fatal launch error propagates as `Err`.
pub fn run_case(path: &Path, subject: &Subject) -> Result<TestResult, HarnessError> {
    let shown = path.display().to_string();

    let case = match TestCase::load(path) {
        Ok(case) => case,
        Err(err) => {
            return Ok(TestResult::Error {
                path: shown,
                message: err.to_string(),
            })
        }
    };

    let raw = match subject.invoke(&case.body) {
        Ok(raw) => raw,
        Err(err) if err.is_fatal() => return Err(err),
        Err(HarnessError::SubprocessIo { source }) => {
            // Output could not be read back; count it as a failed comparison
            // so the file still shows up with a FAIL marker.
            return Ok(TestResult::Fail {
                path: shown,
                expected: case.expected,
                actual: format!("<subprocess i/o error: {source}>"),
            });
        }
        Err(err) => {
            return Ok(TestResult::Error {
                path: shown,
                message: err.to_string(),
            })
        }
    };

    let actual = raw.trim();
    if actual == case.expected {
        Ok(TestResult::Pass { path: shown })
    } else {
        Ok(TestResult::Fail {
            path: shown,
            expected: case.expected,
            actual: actual.to_string(),
        })
    }
}

/// Run every file in order, printing one report line each. Returns
/// `(passed, failed, errored)` counts; a launch failure aborts immediately.
pub fn run_all(paths: &[PathBuf], config: &TestConfig) -> Result<(usize, usize, usize), HarnessError> {
    let subject = Subject::new(&config.subject, config.timeout);

    let mut results = Vec::with_capacity(paths.len());
    for path in paths {
        let result = run_case(path, &subject)?;
        print_result(&result, config);
        results.push(result);
    }

    let (passed, failed, errored) = partition_results(&results);
    eprintln!(
        "\nattest summary: total {}, {} {}, {} {}, {} {}",
        results.len(),
        config.colorize("passed", GREEN),
        passed,
        config.colorize("failed", RED),
        failed,
        config.colorize("errored", YELLOW),
        errored,
    );
    Ok((passed, failed, errored))
}

/// Partition test results by outcome type.
pub fn partition_results(results: &[TestResult]) -> (usize, usize, usize) {
    let passed = results
        .iter()
        .filter(|r| matches!(r, TestResult::Pass { .. }))
        .count();
    let failed = results
        .iter()
        .filter(|r| matches!(r, TestResult::Fail { .. }))
        .count();
    let errored = results
        .iter()
        .filter(|r| matches!(r, TestResult::Error { .. }))
        .count();
    (passed, failed, errored)
}

// =============================================================================
// REPORTING
// =============================================================================

/// Render the single stdout report line for a result, colors off.
pub fn report_line(result: &TestResult) -> String {
    let plain = TestConfig {
        use_colors: false,
        ..TestConfig::default()
    };
    format_result(result, &plain)
}

fn format_result(result: &TestResult, config: &TestConfig) -> String {
    match result {
        TestResult::Pass { path } => {
            format!("{}: {}", config.colorize("OK", GREEN), path)
        }
        TestResult::Fail {
            path,
            expected,
            actual,
        } => format!(
            "{}: {} | Expected [{}] got [{}]",
            config.colorize("FAIL", RED),
            path,
            expected,
            actual
        ),
        TestResult::Error { path, message } => {
            format!("{}: {} | {}", config.colorize("ERROR", YELLOW), path, message)
        }
    }
}

fn print_result(result: &TestResult, config: &TestConfig) {
    println!("{}", format_result(result, config));
    if config.verbose {
        if let TestResult::Fail {
            expected, actual, ..
        } = result
        {
            print_failure_diff(expected, actual, config);
        }
    }
}

/// Line diff of expected vs actual on stderr, for multi-line outputs where
/// the bracketed one-liner is hard to read.
fn print_failure_diff(expected: &str, actual: &str, config: &TestConfig) {
    let changeset = Changeset::new(expected, actual, "\n");
    eprintln!("  Diff:");
    for diff in &changeset.diffs {
        match diff {
            Difference::Same(block) => {
                for line in block.lines() {
                    eprintln!("    {}", line);
                }
            }
            Difference::Rem(block) => {
                for line in block.lines() {
                    eprintln!("  - expected: {}", config.colorize(line, GREEN));
                }
            }
            Difference::Add(block) => {
                for line in block.lines() {
                    eprintln!("  + actual:   {}", config.colorize(line, RED));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("attest_harness_{}_{}", std::process::id(), name));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn report_lines_match_the_contract() {
        let pass = TestResult::Pass {
            path: "tests/add.t".into(),
        };
        assert_eq!(report_line(&pass), "OK: tests/add.t");

        let fail = TestResult::Fail {
            path: "tests/add.t".into(),
            expected: "5".into(),
            actual: "4".into(),
        };
        assert_eq!(
            report_line(&fail),
            "FAIL: tests/add.t | Expected [5] got [4]"
        );
    }

    #[test]
    fn colorize_wraps_only_when_enabled() {
        let mut config = TestConfig::default();
        config.use_colors = false;
        assert_eq!(config.colorize("OK", GREEN), "OK");
        config.use_colors = true;
        assert_eq!(config.colorize("OK", GREEN), "\x1b[32mOK\x1b[0m");
    }

    #[cfg(unix)]
    #[test]
    fn run_case_passes_when_trimmed_outputs_match() {
        // /bin/cat echoes the body, so the expected value is the body itself;
        // trailing newline differences must not matter.
        let path = scratch_file("pass.t", "echo test (hello)\nhello\n");
        let result = run_case(&path, &Subject::new("/bin/cat", None)).unwrap();
        assert!(matches!(result, TestResult::Pass { .. }));
        let _ = fs::remove_file(&path);
    }

    #[cfg(unix)]
    #[test]
    fn run_case_fails_on_interior_difference() {
        let path = scratch_file("fail.t", "(hello world)\nhello  world\n");
        let result = run_case(&path, &Subject::new("/bin/cat", None)).unwrap();
        match result {
            TestResult::Fail {
                expected, actual, ..
            } => {
                assert_eq!(expected, "hello world");
                assert_eq!(actual, "hello  world");
            }
            other => panic!("expected a failure, got {:?}", other),
        }
        let _ = fs::remove_file(&path);
    }

    #[cfg(unix)]
    #[test]
    fn run_case_with_empty_body_compares_against_nothing() {
        let path = scratch_file("empty_body.t", "()\n");
        let result = run_case(&path, &Subject::new("/bin/cat", None)).unwrap();
        assert!(matches!(result, TestResult::Pass { .. }));
        let _ = fs::remove_file(&path);
    }

    #[cfg(unix)]
    #[test]
    fn run_case_isolates_malformed_headers() {
        let path = scratch_file("malformed.t", "no expected value here\nbody\n");
        let result = run_case(&path, &Subject::new("/bin/cat", None)).unwrap();
        assert!(matches!(result, TestResult::Error { .. }));
        let _ = fs::remove_file(&path);
    }

    #[cfg(unix)]
    #[test]
    fn run_case_propagates_launch_failures() {
        let path = scratch_file("launch.t", "(5)\n2 3 +\n");
        let err = run_case(&path, &Subject::new("./no_such_interpreter", None)).unwrap_err();
        assert!(err.is_fatal());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn partition_counts_each_outcome() {
        let results = vec![
            TestResult::Pass { path: "a".into() },
            TestResult::Fail {
                path: "b".into(),
                expected: "1".into(),
                actual: "2".into(),
            },
            TestResult::Pass { path: "c".into() },
            TestResult::Error {
                path: "d".into(),
                message: "unreadable".into(),
            },
        ];
        assert_eq!(partition_results(&results), (2, 1, 1));
    }
}
