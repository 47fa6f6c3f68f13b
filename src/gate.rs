//! Executable gate: path validation run before any command is invoked.
//!
//! The gate guards against running arbitrary binaries picked up through
//! search-path pollution or relative-path tricks: the first shell word of a
//! command must resolve to an executable living at or under an allowed base
//! directory. Every resolution error fails closed.

use std::path::{Path, PathBuf};

/// Reasons the gate can reject a command. All of them are rejections: there
/// is no "could not check, allow anyway" outcome.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("empty or unparseable command")]
    BadCommand,

    #[error("could not resolve executable: {0}")]
    Unresolved(String),

    #[error("could not resolve allowed path: {0}")]
    BadBase(String),

    #[error("executable {} is not under allowed path {}", .exe.display(), .base.display())]
    OutsideBase { exe: PathBuf, base: PathBuf },
}

/// Validate that `command`'s executable resolves under `base`.
///
/// The executable is the first shell word of `command`. Absolute paths are
/// canonicalized directly; bare names are resolved through `PATH` first.
/// `base` defaults to the current working directory when absent.
pub fn validate(command: &str, base: Option<&Path>) -> Result<(), GateError> {
    let tokens = shlex::split(command).ok_or(GateError::BadCommand)?;
    let executable = tokens.first().ok_or(GateError::BadCommand)?;

    let resolved = resolve_executable(executable)
        .ok_or_else(|| GateError::Unresolved(executable.clone()))?;

    let base_path = match base {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()
            .map_err(|_| GateError::BadBase(".".to_string()))?,
    };
    let base_path = base_path
        .canonicalize()
        .map_err(|_| GateError::BadBase(base_path.display().to_string()))?;

    // Component-wise prefix check: the executable must be at or under base.
    if resolved.starts_with(&base_path) {
        Ok(())
    } else {
        Err(GateError::OutsideBase { exe: resolved, base: base_path })
    }
}

/// Resolve the executable to a canonical absolute path, following symlinks.
fn resolve_executable(executable: &str) -> Option<PathBuf> {
    let candidate = if Path::new(executable).is_absolute() {
        PathBuf::from(executable)
    } else {
        which::which(executable).ok()?
    };
    candidate.canonicalize().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_empty_command_rejected() {
        assert!(matches!(validate("", None), Err(GateError::BadCommand)));
        assert!(matches!(validate("   ", None), Err(GateError::BadCommand)));
    }

    #[test]
    fn test_unparseable_command_rejected() {
        // Unterminated quote fails shell-word splitting.
        assert!(matches!(
            validate("tool 'unterminated", None),
            Err(GateError::BadCommand)
        ));
    }

    #[test]
    fn test_unresolvable_executable_rejected() {
        let err = validate("definitely-not-a-real-binary-2718", None).unwrap_err();
        assert!(matches!(err, GateError::Unresolved(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_under_base_accepted() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("tool.sh");
        fs::write(&tool, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        let command = format!("{} --flag", tool.display());
        assert!(validate(&command, Some(dir.path())).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_executable_outside_base_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate("/bin/sh -c 'exit 0'", Some(dir.path())).unwrap_err();
        assert!(matches!(err, GateError::OutsideBase { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_sibling_directory_with_common_prefix_rejected() {
        use std::os::unix::fs::PermissionsExt;

        // /base-extra shares a string prefix with /base but is not under it.
        let parent = tempfile::tempdir().unwrap();
        let base = parent.path().join("base");
        let sibling = parent.path().join("base-extra");
        fs::create_dir_all(&base).unwrap();
        fs::create_dir_all(&sibling).unwrap();

        let tool = sibling.join("tool.sh");
        fs::write(&tool, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        let command = tool.display().to_string();
        assert!(matches!(
            validate(&command, Some(&base)),
            Err(GateError::OutsideBase { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_base_rejected() {
        let err = validate("/bin/sh", Some(Path::new("/no/such/base/dir"))).unwrap_err();
        assert!(matches!(err, GateError::BadBase(_)));
    }
}
