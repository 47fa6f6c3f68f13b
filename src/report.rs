//! Sequential run loop, result printing, and the final summary.
//!
//! Stream discipline: PASS lines and the summary go to stdout so callers can
//! pipe authoritative results; warnings and all failure detail go to stderr.

use similar::{ChangeTag, TextDiff};

use crate::loader::CaseEntry;
use crate::runner::{run_case, RunOptions, Verdict};

/// Totals for one complete run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    /// Process exit code: 0 only when every case passed.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}

/// Execute every entry in index order, print per-case results, and return
/// the totals. No parallelism, no retries: each case runs exactly once.
pub fn run_all(entries: &[CaseEntry], options: &RunOptions) -> RunSummary {
    let mut passed = 0;

    for entry in entries {
        let verdict = run_case(entry, options);
        if verdict.passed {
            passed += 1;
            if !options.quiet {
                println!("PASS: {}", verdict.name);
            }
        } else {
            report_failure(&verdict);
        }
    }

    let summary = RunSummary { total: entries.len(), passed };
    println!();
    println!("{} out of {} tests passed", summary.passed, summary.total);
    summary
}

/// Print the full failure report for one case to stderr.
fn report_failure(verdict: &Verdict) {
    eprintln!("FAIL: {}", verdict.name);
    eprintln!("Expected:");
    eprintln!("{}", verdict.expected);
    eprintln!("Actual:");
    eprintln!("{}", verdict.actual);
    eprintln!("Diff:");
    eprintln!("{}", unified_diff(&verdict.expected, &verdict.actual));
    if !verdict.stderr.is_empty() {
        eprintln!("Error output:");
        eprintln!("{}", verdict.stderr);
    }
    eprintln!("{}", "-".repeat(40));
}

/// Render a unified line diff between expected and actual text.
pub fn unified_diff(expected: &str, actual: &str) -> String {
    let diff = TextDiff::from_lines(expected, actual);

    let mut out = String::new();
    out.push_str("--- expected\n");
    out.push_str("+++ actual\n");

    for group in diff.grouped_ops(3) {
        if let Some((first, last)) = group.first().zip(group.last()) {
            out.push_str(&format!(
                "@@ -{},{} +{},{} @@\n",
                first.old_range().start + 1,
                last.old_range().end - first.old_range().start,
                first.new_range().start + 1,
                last.new_range().end - first.new_range().start,
            ));
        }

        for op in group {
            for change in diff.iter_changes(&op) {
                let prefix = match change.tag() {
                    ChangeTag::Delete => "-",
                    ChangeTag::Insert => "+",
                    ChangeTag::Equal => " ",
                };
                out.push_str(prefix);
                out.push_str(change.value());
                if !change.value().ends_with('\n') {
                    out.push('\n');
                }
            }
        }
    }

    out
}
