//! # functest
//!
//! A black-box functional test runner for command-line tools that transform
//! text into structured formats (XML, JSON, YAML).
//!
//! Test cases live in YAML files: each names a command to run, text to feed
//! it on stdin, and the stdout it should produce. Outputs can be normalized
//! per format before comparison so whitespace and key/attribute ordering
//! never cause superficial failures, and an optional executable gate refuses
//! to run commands whose binary resolves outside an allowed directory.
//!
//! ## Quick start
//!
//! ```yaml
//! # tests.yaml
//! normalize: json
//! tests:
//!   - name: pretty-prints
//!     command: "{command} --json"
//!     input: "a=1"
//!     expected_output: '{"a": 1}'
//! ```
//!
//! ```bash
//! functest --tests tests.yaml --command ./target/release/mytool
//! ```
//!
//! ## Library use
//!
//! ```rust,ignore
//! use functest::{load_cases, run_all, RunOptions};
//!
//! let entries = load_cases(&paths)?;
//! let summary = run_all(&entries, &RunOptions::default());
//! std::process::exit(summary.exit_code());
//! ```

pub mod gate;
pub mod loader;
pub mod normalize;
pub mod report;
pub mod runner;
pub mod template;

// Re-exports for easier access
pub use gate::GateError;
pub use loader::{load_cases, CaseEntry, LoadError, TestCase};
pub use normalize::Normalizer;
pub use report::{run_all, unified_diff, RunSummary};
pub use runner::{run_case, RunOptions, Verdict};
pub use template::TemplateError;
