//! LTF - A transparent wrapper for Terraform.
//!
//! This library provides the core functionality for the `ltf` CLI tool:
//! finding the Terraform configuration directory from the current directory,
//! loading variables from tfvars files and CLI arguments with Terraform's
//! precedence rules, and rendering `*.tfbackend` files for `terraform init`.

pub mod arguments;
pub mod backend;
pub mod cli;
pub mod environ;
pub mod filesystem;
pub mod variables;
pub mod wrapper;

use std::path::PathBuf;


/// Library-level error type for LTF operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("reading {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("cannot change frozen variable {name} from {}", .dir.display())]
    FrozenVariable { name: String, dir: PathBuf },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an I/O error with the path that caused it.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Build a parse error for a file.
    pub fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Error::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Result type alias for LTF operations.
pub type Result<T> = std::result::Result<T, Error>;
