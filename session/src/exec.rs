//! Launching the resolved autorun program.

use autorun_resolver::AutorunCandidate;
use nix::unistd::{chdir, execv};
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("path contains an interior NUL byte: {0}")]
    BadPath(String),

    #[error("unable to enter the program directory: {0}")]
    WorkingDir(nix::errno::Errno),

    #[error("unable to start the program: {0}")]
    Launch(nix::errno::Errno),
}

/// Runs an [`AutorunCandidate`]. The real implementation replaces the current
/// process image and therefore only ever returns on failure.
pub trait Executor {
    fn execute(&mut self, candidate: &AutorunCandidate) -> Result<(), ExecError>;
}

/// Executor that replaces the current process with the candidate program via
/// `execv(2)`, after switching to the candidate's working directory.
#[derive(Debug, Default)]
pub struct ProcessExecutor;

impl Executor for ProcessExecutor {
    fn execute(&mut self, candidate: &AutorunCandidate) -> Result<(), ExecError> {
        let argv = build_argv(candidate)?;

        tracing::info!(
            "Starting {:?} in {:?}",
            candidate.program,
            candidate.working_dir
        );

        chdir(&candidate.working_dir).map_err(ExecError::WorkingDir)?;

        // Does not return on success: the process becomes the program.
        match execv(&argv[0], &argv) {
            Ok(never) => match never {},
            Err(errno) => Err(ExecError::Launch(errno)),
        }
    }
}

/// argv for the candidate: the program itself, then the optional script
/// argument.
fn build_argv(candidate: &AutorunCandidate) -> Result<Vec<CString>, ExecError> {
    let mut argv = Vec::with_capacity(2);
    argv.push(to_cstring(candidate.program.as_os_str())?);
    if let Some(argument) = &candidate.argument {
        argv.push(to_cstring(argument.as_os_str())?);
    }
    Ok(argv)
}

fn to_cstring(value: &std::ffi::OsStr) -> Result<CString, ExecError> {
    CString::new(value.as_bytes())
        .map_err(|_| ExecError::BadPath(value.to_string_lossy().into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_argv_for_direct_program() {
        let candidate = AutorunCandidate {
            program: PathBuf::from("/stick/.autorun"),
            argument: None,
            working_dir: PathBuf::from("/stick"),
        };

        let argv = build_argv(&candidate).unwrap();
        assert_eq!(argv.len(), 1);
        assert_eq!(argv[0].to_str().unwrap(), "/stick/.autorun");
    }

    #[test]
    fn test_argv_for_script_fallback() {
        let candidate = AutorunCandidate {
            program: PathBuf::from("/bin/sh"),
            argument: Some(PathBuf::from("/stick/autorun.sh")),
            working_dir: PathBuf::from("/stick"),
        };

        let argv = build_argv(&candidate).unwrap();
        assert_eq!(argv.len(), 2);
        assert_eq!(argv[0].to_str().unwrap(), "/bin/sh");
        assert_eq!(argv[1].to_str().unwrap(), "/stick/autorun.sh");
    }

    #[test]
    fn test_nul_in_path_is_rejected() {
        let candidate = AutorunCandidate {
            program: PathBuf::from("/stick/bad\0name"),
            argument: None,
            working_dir: PathBuf::from("/stick"),
        };

        assert!(matches!(
            build_argv(&candidate),
            Err(ExecError::BadPath(_))
        ));
    }
}
