//! Test case loading and aggregation.
//!
//! Test definitions live in YAML files: a top-level optional `normalize` key
//! naming the file's default normalization, and a `tests` list. Multiple
//! files are flattened into one globally ordered case list; a file that
//! parses but contains no tests is skipped with a warning, while an
//! unreadable or unparseable file aborts the run.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::template::{self, TemplateError};

/// A single test case as written in a test file. Immutable once loaded.
#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    /// Human-readable name for reporting.
    #[serde(default = "default_name")]
    pub name: String,
    /// Command template; may reference `{command}` and `{count}`.
    pub command: String,
    /// Text fed to the process on stdin.
    #[serde(default)]
    pub input: String,
    /// Expected stdout, compared after optional normalization and trimming.
    #[serde(default)]
    pub expected_output: String,
    /// Expected process exit status. Accepts a bare integer or a quoted
    /// scalar ("1"), since existing suites write both.
    #[serde(default, deserialize_with = "lenient_exit_status")]
    pub expected_exit_status: i32,
    /// Per-case normalization key, overriding the file default.
    #[serde(default)]
    pub normalize: Option<String>,
}

fn default_name() -> String {
    "<unnamed>".to_string()
}

fn lenient_exit_status<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i32),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(|_| {
            serde::de::Error::custom(format!("invalid expected_exit_status: {s:?}"))
        }),
    }
}

/// One test file: a default normalization key plus its cases.
#[derive(Debug, Deserialize)]
struct TestFile {
    #[serde(default)]
    normalize: Option<String>,
    #[serde(default)]
    tests: Vec<TestCase>,
}

/// A case tagged with its global position and its file's default
/// normalization. The index is the case's ordinal across all loaded files,
/// used only for `{count}` substitution.
#[derive(Debug, Clone)]
pub struct CaseEntry {
    pub index: usize,
    pub default_normalize: Option<String>,
    pub case: TestCase,
}

/// Load-time failures. All of these abort the run before anything executes.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("error reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error parsing {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid command template in test '{name}' ({}): {source}", .path.display())]
    Template {
        path: PathBuf,
        name: String,
        source: TemplateError,
    },

    #[error("no valid tests found in the provided test files")]
    NoCases,
}

/// Read every file in `paths`, in order, and flatten their cases into one
/// indexed sequence. Empty files warn on stderr and contribute nothing; an
/// empty final sequence is an error.
pub fn load_cases(paths: &[PathBuf]) -> Result<Vec<CaseEntry>, LoadError> {
    let mut entries = Vec::new();

    for path in paths {
        let file = read_file(path)?;
        if file.tests.is_empty() {
            eprintln!("No tests found in {}!", path.display());
            continue;
        }
        for case in file.tests {
            // Reject unknown placeholders now, not mid-run.
            template::placeholders(&case.command).map_err(|source| LoadError::Template {
                path: path.clone(),
                name: case.name.clone(),
                source,
            })?;
            entries.push(CaseEntry {
                index: entries.len(),
                default_normalize: file.normalize.clone(),
                case,
            });
        }
    }

    if entries.is_empty() {
        return Err(LoadError::NoCases);
    }
    Ok(entries)
}

fn read_file(path: &Path) -> Result<TestFile, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_single_file_with_defaults() {
        let file = write_file(
            "normalize: json\ntests:\n  - command: \"echo hi\"\n    expected_output: \"hi\"\n",
        );
        let entries = load_cases(&[file.path().to_path_buf()]).unwrap();

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.index, 0);
        assert_eq!(entry.default_normalize.as_deref(), Some("json"));
        assert_eq!(entry.case.name, "<unnamed>");
        assert_eq!(entry.case.command, "echo hi");
        assert_eq!(entry.case.input, "");
        assert_eq!(entry.case.expected_output, "hi");
        assert_eq!(entry.case.expected_exit_status, 0);
        assert_eq!(entry.case.normalize, None);
    }

    #[test]
    fn test_load_concatenates_files_in_order() {
        let first = write_file(
            "tests:\n  - name: one\n    command: \"echo 1\"\n  - name: two\n    command: \"echo 2\"\n",
        );
        let second = write_file("normalize: xml\ntests:\n  - name: three\n    command: \"echo 3\"\n");

        let entries =
            load_cases(&[first.path().to_path_buf(), second.path().to_path_buf()]).unwrap();

        assert_eq!(entries.len(), 3);
        let names: Vec<_> = entries.iter().map(|e| e.case.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
        let indices: Vec<_> = entries.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(entries[0].default_normalize, None);
        assert_eq!(entries[2].default_normalize.as_deref(), Some("xml"));
    }

    #[test]
    fn test_empty_file_skipped_non_fatal() {
        let empty = write_file("tests: []\n");
        let full = write_file("tests:\n  - name: only\n    command: \"echo x\"\n");

        let entries = load_cases(&[empty.path().to_path_buf(), full.path().to_path_buf()]).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].case.name, "only");
        assert_eq!(entries[0].index, 0);
    }

    #[test]
    fn test_quoted_exit_status_accepted() {
        let file = write_file(
            "tests:\n  - command: \"false\"\n    expected_exit_status: \"1\"\n",
        );
        let entries = load_cases(&[file.path().to_path_buf()]).unwrap();
        assert_eq!(entries[0].case.expected_exit_status, 1);
    }

    #[test]
    fn test_non_numeric_exit_status_is_fatal() {
        let file = write_file(
            "tests:\n  - command: \"false\"\n    expected_exit_status: \"often\"\n",
        );
        let err = load_cases(&[file.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = load_cases(&[PathBuf::from("/no/such/tests.yaml")]).unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }

    #[test]
    fn test_bad_yaml_is_fatal() {
        let file = write_file("tests: [unclosed\n");
        let err = load_cases(&[file.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_missing_command_is_fatal() {
        let file = write_file("tests:\n  - name: broken\n");
        let err = load_cases(&[file.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_unknown_placeholder_is_fatal() {
        let file = write_file("tests:\n  - name: bad\n    command: \"{tool} -x\"\n");
        let err = load_cases(&[file.path().to_path_buf()]).unwrap_err();
        match err {
            LoadError::Template { name, source, .. } => {
                assert_eq!(name, "bad");
                assert_eq!(source, TemplateError::UnknownPlaceholder("tool".to_string()));
            }
            other => panic!("expected template error, got {other:?}"),
        }
    }

    #[test]
    fn test_no_cases_at_all_is_fatal() {
        let empty = write_file("tests: []\n");
        let err = load_cases(&[empty.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, LoadError::NoCases));
    }
}
