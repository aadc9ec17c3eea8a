pub use crate::errors::HarnessError;
pub use crate::harness::{run_all, run_case, TestConfig, TestResult};
pub use crate::subject::Subject;
pub use crate::testcase::TestCase;

pub mod cli;
pub mod errors;
pub mod harness;
pub mod subject;
pub mod testcase;
