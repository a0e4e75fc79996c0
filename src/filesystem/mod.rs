//! Filesystem helpers for locating Terraform files.
//!
//! [`read_names`] lists a directory, [`match_names`] filters names with a
//! glob pattern, and [`Directories`] holds the chain of directories between
//! the working directory and the Terraform configuration directory.

pub mod directories;

pub use directories::Directories;

use crate::{Error, Result};
use glob::Pattern;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Terraform configuration file patterns.
pub const CONFIG_PATTERNS: &[&str] = &["*.tf", "*.tf.json"];

/// List the file names in a directory, sorted lexicographically.
///
/// Names that are not valid UTF-8 are skipped since none of the Terraform
/// patterns could match them.
pub fn read_names(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::filesystem(dir, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::filesystem(dir, e))?;
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => tracing::trace!(?name, dir = %dir.display(), "skipping non-UTF-8 name"),
        }
    }
    names.sort();
    Ok(names)
}

/// Return the names matching a glob pattern, preserving their order.
pub fn match_names<'a>(names: &'a [String], pattern: &str) -> Vec<&'a str> {
    let Ok(pattern) = Pattern::new(pattern) else {
        return Vec::new();
    };
    names
        .iter()
        .filter(|name| pattern.matches(name))
        .map(String::as_str)
        .collect()
}

/// Check whether any name is a Terraform configuration file.
pub fn has_config_files(names: &[String]) -> bool {
    CONFIG_PATTERNS
        .iter()
        .any(|pattern| !match_names(names, pattern).is_empty())
}

/// Make a path absolute against `base` and lexically clean it.
///
/// `.` components are dropped and `..` pops the previous component, never
/// climbing above the root. Symbolic links are not followed.
pub fn absolute(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut clean = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                clean.pop();
            }
            other => clean.push(other.as_os_str()),
        }
    }
    clean
}
