//! Fatal build errors.
//!
//! Every error in the build core is fatal to the run: stages propagate a
//! [`BuildError`] with `?` and the binary entry point is the single place
//! that reports it and exits non-zero.

use std::io;
use std::path::{Path, PathBuf};

/// Result alias used throughout the build core.
pub type BuildResult<T> = Result<T, BuildError>;

/// Error type for a build run
#[derive(Debug)]
pub enum BuildError {
    /// Invalid or contradictory settings, detected before any tool runs
    Config(String),
    /// An external tool reported failure
    Tool {
        program: String,
        reason: ToolFailure,
    },
    /// Filesystem access failed
    Io { path: PathBuf, source: io::Error },
}

/// Why an external tool invocation was treated as failed
#[derive(Debug)]
pub enum ToolFailure {
    /// A line containing the failure marker appeared in the output
    Marker { line: String, output: String },
    /// The tool exited unsuccessfully without printing a failure marker
    Status { code: Option<i32>, output: String },
    /// The tool could not be started at all
    Spawn(io::Error),
    /// Reading the tool's output failed part way; what was read is kept
    OutputLost { output: String },
}

impl BuildError {
    pub fn config(msg: impl Into<String>) -> Self {
        BuildError::Config(msg.into())
    }

    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        BuildError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Captured tool output, when the error came from a tool run
    pub fn tool_output(&self) -> Option<&str> {
        match self {
            BuildError::Tool {
                reason:
                    ToolFailure::Marker { output, .. }
                    | ToolFailure::Status { output, .. }
                    | ToolFailure::OutputLost { output },
                ..
            } => Some(output),
            _ => None,
        }
    }
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::Config(msg) => write!(f, "Configuration error: {}", msg),
            BuildError::Tool { program, reason } => match reason {
                ToolFailure::Marker { line, .. } => {
                    write!(f, "'{}' reported an error: {}", program, line.trim())
                }
                ToolFailure::Status { code: Some(code), .. } => {
                    write!(f, "'{}' exited with status {}", program, code)
                }
                ToolFailure::Status { code: None, .. } => {
                    write!(f, "'{}' was terminated by a signal", program)
                }
                ToolFailure::Spawn(e) => write!(f, "failed to start '{}': {}", program, e),
                ToolFailure::OutputLost { .. } => {
                    write!(f, "output of '{}' could not be read completely", program)
                }
            },
            BuildError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Io { source, .. } => Some(source),
            BuildError::Tool {
                reason: ToolFailure::Spawn(e),
                ..
            } => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_failure_message_names_tool_and_line() {
        let err = BuildError::Tool {
            program: "clang".into(),
            reason: ToolFailure::Marker {
                line: "foo.cpp:12: error: boom\n".into(),
                output: "foo.cpp:12: error: boom\n".into(),
            },
        };
        assert_eq!(err.to_string(), "'clang' reported an error: foo.cpp:12: error: boom");
        assert_eq!(err.tool_output(), Some("foo.cpp:12: error: boom\n"));
    }

    #[test]
    fn test_io_error_keeps_path() {
        let err = BuildError::io(
            "src/missing",
            io::Error::new(io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().starts_with("src/missing"));
        assert!(err.tool_output().is_none());
    }
}
