//! Autorun candidate resolution for a mounted medium.
//!
//! Given the root directory of a mount, decides whether the medium carries an
//! autorun program and, if so, the exact command to invoke. Probing follows
//! the freedesktop autostart convention: the well-known names are tried in a
//! fixed priority order and the first hit wins.

use nix::unistd::{AccessFlags, access};
use std::path::{Path, PathBuf};

/// Shell used to run `autorun.sh` scripts that are not directly executable.
pub const SHELL_INTERPRETER: &str = "/bin/sh";

/// A resolved execution plan for a mount's autorun program.
///
/// Immutable once built; consumed exactly once by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutorunCandidate {
    /// Program to invoke. Either a file on the medium or the shell
    /// interpreter for the script fallback.
    pub program: PathBuf,
    /// Single argument, only present for the script fallback (the path of
    /// `autorun.sh` on the medium).
    pub argument: Option<PathBuf>,
    /// Working directory for the program, always the mount root.
    pub working_dir: PathBuf,
}

/// Determine the autorun candidate for a mount root, if any.
///
/// Probe order, first match wins:
/// 1. `.autorun`, must be executable — run directly.
/// 2. `autorun`, must be executable — run directly.
/// 3. `autorun.sh`, existence is enough — run via [`SHELL_INTERPRETER`].
///
/// The ordering is mandated by the autostart convention and must not change.
/// The script case deliberately skips the executability check: the script is
/// run by the interpreter, not directly.
pub fn resolve(root: &Path) -> Option<AutorunCandidate> {
    if check_file(root, ".autorun", true) {
        return Some(direct_candidate(root, ".autorun"));
    }
    if check_file(root, "autorun", true) {
        return Some(direct_candidate(root, "autorun"));
    }
    if check_file(root, "autorun.sh", false) {
        tracing::debug!("Falling back to shell interpreter for autorun.sh");
        return Some(AutorunCandidate {
            program: PathBuf::from(SHELL_INTERPRETER),
            argument: Some(root.join("autorun.sh")),
            working_dir: root.to_path_buf(),
        });
    }

    None
}

fn direct_candidate(root: &Path, name: &str) -> AutorunCandidate {
    AutorunCandidate {
        program: root.join(name),
        argument: None,
        working_dir: root.to_path_buf(),
    }
}

/// Probe an immediate child of `root` for existence and, optionally, the
/// can-execute attribute. Any probe failure (absent file, permission denied,
/// transient I/O error) counts as a miss.
fn check_file(root: &Path, name: &str, must_be_executable: bool) -> bool {
    let path = root.join(name);
    let flags = if must_be_executable {
        AccessFlags::X_OK
    } else {
        AccessFlags::F_OK
    };

    match access(&path, flags) {
        Ok(()) => true,
        Err(errno) => {
            tracing::debug!("Probe for {:?} missed: {}", path, errno);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::os::unix::fs::OpenOptionsExt;
    use tempfile::TempDir;

    fn create_file(dir: &TempDir, name: &str, mode: u32) {
        OpenOptions::new()
            .create(true)
            .write(true)
            .mode(mode)
            .open(dir.path().join(name))
            .unwrap();
    }

    #[test]
    fn test_empty_root_resolves_nothing() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve(dir.path()), None);
    }

    #[test]
    fn test_hidden_autorun_takes_precedence() {
        let dir = TempDir::new().unwrap();
        create_file(&dir, ".autorun", 0o755);
        create_file(&dir, "autorun", 0o755);
        create_file(&dir, "autorun.sh", 0o755);

        let candidate = resolve(dir.path()).unwrap();
        assert_eq!(candidate.program, dir.path().join(".autorun"));
        assert_eq!(candidate.argument, None);
        assert_eq!(candidate.working_dir, dir.path());
    }

    #[test]
    fn test_plain_autorun_when_hidden_absent() {
        let dir = TempDir::new().unwrap();
        create_file(&dir, "autorun", 0o755);

        let candidate = resolve(dir.path()).unwrap();
        assert_eq!(candidate.program, dir.path().join("autorun"));
        assert_eq!(candidate.argument, None);
    }

    #[test]
    fn test_non_executable_hidden_falls_through() {
        let dir = TempDir::new().unwrap();
        create_file(&dir, ".autorun", 0o644);
        create_file(&dir, "autorun", 0o755);

        let candidate = resolve(dir.path()).unwrap();
        assert_eq!(candidate.program, dir.path().join("autorun"));
    }

    #[test]
    fn test_non_executable_autorun_is_not_a_script() {
        // A bare `autorun` without the executable bit must not be picked up,
        // and must not be reinterpreted as a shell script.
        let dir = TempDir::new().unwrap();
        create_file(&dir, "autorun", 0o644);

        assert_eq!(resolve(dir.path()), None);
    }

    #[test]
    fn test_script_accepted_without_executable_bit() {
        let dir = TempDir::new().unwrap();
        create_file(&dir, "autorun.sh", 0o644);

        let candidate = resolve(dir.path()).unwrap();
        assert_eq!(candidate.program, PathBuf::from(SHELL_INTERPRETER));
        assert_eq!(candidate.argument, Some(dir.path().join("autorun.sh")));
        assert_eq!(candidate.working_dir, dir.path());
    }

    #[test]
    fn test_executable_autorun_beats_script() {
        let dir = TempDir::new().unwrap();
        create_file(&dir, "autorun", 0o755);
        create_file(&dir, "autorun.sh", 0o644);

        let candidate = resolve(dir.path()).unwrap();
        assert_eq!(candidate.program, dir.path().join("autorun"));
        assert_eq!(candidate.argument, None);
    }
}
