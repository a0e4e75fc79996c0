//! Environment variables passed to Terraform.

use std::borrow::Cow;
use std::ffi::{OsStr, OsString};

/// An ordered list of environment variables.
///
/// Setting a variable replaces any earlier entry with the same name and
/// moves it to the end, so the list can be handed to a child process as-is.
/// Names and values are kept as OS strings so they reach Terraform unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environ {
    vars: Vec<(OsString, OsString)>,
}

impl Environ {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current process environment.
    pub fn from_process() -> Self {
        std::env::vars_os().collect()
    }

    /// Get a variable's value, or an empty string when unset.
    ///
    /// Values that are not valid UTF-8 are read lossily.
    pub fn get(&self, name: &str) -> Cow<'_, str> {
        self.vars
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.to_string_lossy())
            .unwrap_or(Cow::Borrowed(""))
    }

    /// Set a variable, replacing any existing value.
    pub fn set(&mut self, name: impl Into<OsString>, value: impl Into<OsString>) {
        let name = name.into();
        self.vars.retain(|(n, _)| *n != name);
        self.vars.push((name, value.into()));
    }

    /// Builder form of [`Environ::set`].
    pub fn with(mut self, name: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.set(name, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(n, v)| (n.as_os_str(), v.as_os_str()))
    }
}

impl<N: Into<OsString>, V: Into<OsString>> FromIterator<(N, V)> for Environ {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut env = Environ::new();
        for (name, value) in iter {
            env.set(name, value);
        }
        env
    }
}
