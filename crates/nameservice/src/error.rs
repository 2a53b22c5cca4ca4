//! Error types for account database and backend operations.
//!
//! These errors stay inside the platform layer. The `user` resource wraps
//! them into [`declarative::Error::Backend`] with the resource reference
//! attached.

use std::io;
use thiserror::Error;

/// Errors that can occur while reading or changing accounts.
#[derive(Debug, Error)]
pub enum Error {
    /// A platform tool exited unsuccessfully
    #[error("command failed: {command}: {stderr}")]
    CommandFailed {
        /// Command line that was run
        command: String,
        /// Standard error output of the tool
        stderr: String,
    },

    /// A platform tool is not installed
    #[error("{tool} not found; is this host using the expected account tools?")]
    ToolNotFound {
        /// Name of the missing executable
        tool: String,
    },

    /// The system account database returned an error
    #[error("account database error: {0}")]
    Database(String),

    /// A native record field the backend does not know
    #[error("unknown account field: {0}")]
    UnknownField(String),

    /// A value the backend cannot write
    #[error("cannot set {field} to {value}")]
    Unsupported {
        /// Native field being synced
        field: String,
        /// Rendered value
        value: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Build an error from a spawn failure, recognizing missing tools
    pub fn from_spawn(tool: &str, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::ToolNotFound {
                tool: tool.to_string(),
            }
        } else {
            Self::Io(err)
        }
    }

    /// Build an error from an OS error number returned by libc
    pub fn from_errno(call: &str, errno: i32) -> Self {
        Self::Database(format!(
            "{call}: {}",
            io::Error::from_raw_os_error(errno)
        ))
    }
}

/// Result type for account operations.
pub type Result<T> = std::result::Result<T, Error>;
