//! VirtualBox command error types.

use std::io;
use std::process::ExitStatus;

use thiserror::Error;

/// Result type for VirtualBox command operations.
pub type VBoxResult<T> = Result<T, VBoxError>;

/// Errors that can occur while running VirtualBox commands.
#[derive(Debug, Error)]
pub enum VBoxError {
    /// The executable could not be found on the search path.
    #[error("command not found")]
    CommandNotFound,

    /// The machine already exists.
    #[error("machine already exists")]
    MachineExists,

    /// The machine does not exist.
    #[error("machine does not exist")]
    MachineNotExist,

    /// Looking up the current user's groups failed.
    #[error("looking up privileges of current user")]
    PermissionLookup(#[source] io::Error),

    /// The process ran but exited unsuccessfully.
    #[error("{program} failed: {status}")]
    ExitFailure {
        program: String,
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },

    /// Spawning or waiting on the process failed.
    #[error("running {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl VBoxError {
    /// Classify a failure to start `program`.
    ///
    /// Only a program that does not resolve on the search path maps to
    /// [`VBoxError::CommandNotFound`]. A program that exists but cannot be
    /// started (for example a script whose interpreter is missing) keeps its
    /// OS error.
    pub(crate) fn spawn(program: &str, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound && which::which(program).is_err() {
            Self::CommandNotFound
        } else {
            Self::Io {
                program: program.to_string(),
                source: err,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::CommandNotFound)
    }

    /// Captured standard output carried by a failed invocation, if any.
    pub fn stdout(&self) -> Option<&str> {
        match self {
            Self::ExitFailure { stdout, .. } => Some(stdout),
            _ => None,
        }
    }

    /// Captured standard error carried by a failed invocation, if any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::ExitFailure { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Exit code of the failed process. `None` when it was killed by a signal
    /// or never ran.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExitFailure { status, .. } => status.code(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(VBoxError::CommandNotFound.to_string(), "command not found");
        assert_eq!(
            VBoxError::MachineExists.to_string(),
            "machine already exists"
        );
        assert_eq!(
            VBoxError::MachineNotExist.to_string(),
            "machine does not exist"
        );
    }

    #[test]
    fn test_spawn_not_found_is_sentinel() {
        let err = VBoxError::spawn(
            "doesnotexist_tool",
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        assert!(err.is_not_found());
        assert!(err.stdout().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_not_found_for_resolvable_program_is_io() {
        let err = VBoxError::spawn(
            "sh",
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );
        match err {
            VBoxError::Io { program, source } => {
                assert_eq!(program, "sh");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_permission_lookup_message_omits_cause() {
        let err = VBoxError::PermissionLookup(io::Error::other("no passwd entry for uid 12345"));
        assert_eq!(err.to_string(), "looking up privileges of current user");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "no passwd entry for uid 12345");
    }

    #[test]
    fn test_spawn_other_error_is_passed_through() {
        let err = VBoxError::spawn(
            "VBoxManage",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        match err {
            VBoxError::Io { program, source } => {
                assert_eq!(program, "VBoxManage");
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
