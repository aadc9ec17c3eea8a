//! Command-line entry point for the harness.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use walkdir::WalkDir;

use crate::harness::{self, TestConfig};

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "attest",
    version,
    about = "A golden-file test harness: runs each test file's body through an external interpreter and checks its stdout against the expected value on the file's first line."
)]
pub struct AttestArgs {
    /// Test files to run, in order. A directory is expanded recursively to
    /// its files in sorted order.
    pub paths: Vec<PathBuf>,

    /// The subject executable under test, invoked with no arguments.
    #[arg(long, default_value = "./subject")]
    pub subject: PathBuf,

    /// Maximum seconds to wait for the subject per test case. Unset waits
    /// until the subject exits on its own.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// On failure, also print a line diff of expected vs actual to stderr.
    #[arg(long)]
    pub verbose: bool,

    /// Disable ANSI colors (colors are auto-disabled when stdout is piped).
    #[arg(long)]
    pub no_color: bool,
}

/// The main entry point for the CLI. Exits non-zero when any test case
/// failed or errored, or when the subject could not be launched at all.
pub fn run() {
    let args = AttestArgs::parse();

    let config = TestConfig {
        subject: args.subject,
        timeout: args.timeout.map(Duration::from_secs),
        use_colors: !args.no_color && atty::is(atty::Stream::Stdout),
        verbose: args.verbose,
    };

    let files = collect_test_files(&args.paths);

    match harness::run_all(&files, &config) {
        Ok((_, failed, errored)) => {
            if failed > 0 || errored > 0 {
                process::exit(1);
            }
        }
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            process::exit(1);
        }
    }
}

/// Expand directory arguments into their regular files, recursively and in
/// sorted order. File arguments pass through in place, so the overall run
/// order stays the argument order. Nonexistent paths pass through too and
/// get reported per file.
pub fn collect_test_files(args: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for arg in args {
        if arg.is_dir() {
            files.extend(
                WalkDir::new(arg)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_type().is_file())
                    .map(|e| e.path().to_path_buf()),
            );
        } else {
            files.push(arg.clone());
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn directories_expand_sorted_and_files_pass_through() {
        let dir = std::env::temp_dir().join(format!("attest_cli_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("b.t"), "(1)\n").unwrap();
        fs::write(dir.join("a.t"), "(1)\n").unwrap();

        let lone = dir.join("b.t");
        let collected = collect_test_files(&[lone.clone(), dir.clone()]);
        assert_eq!(collected[0], lone);
        assert_eq!(collected[1], dir.join("a.t"));
        assert_eq!(collected[2], dir.join("b.t"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn nonexistent_paths_pass_through_for_per_file_reporting() {
        let ghost = PathBuf::from("does/not/exist.t");
        assert_eq!(collect_test_files(&[ghost.clone()]), vec![ghost]);
    }
}
