//! Terraform command line arguments as Terraform itself will see them.
//!
//! Terraform reads extra arguments from `TF_CLI_ARGS` and
//! `TF_CLI_ARGS_<subcommand>`. The *virtual* argument list merges those into
//! the real command line at the positions Terraform uses, so variables and
//! `-chdir` can be found no matter where they were given.

use crate::environ::Environ;
use crate::{Error, Result};

/// Arguments for one LTF invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    /// The program that was run (`args[0]`).
    pub bin: String,
    /// The real command line, including `bin`.
    pub command_line_args: Vec<String>,
    /// Command line merged with `TF_CLI_ARGS` and `TF_CLI_ARGS_<subcommand>`.
    pub virtual_args: Vec<String>,
    /// Value of `-chdir=<path>`, if given.
    pub chdir: Option<String>,
    pub help: bool,
    /// `-version` flag or `version` subcommand.
    pub version: bool,
    /// First non-flag argument.
    pub subcommand: Option<String>,
}

impl Arguments {
    /// Parse a command line (including the program name) with the
    /// environment providing `TF_CLI_ARGS*`.
    pub fn new(args: Vec<String>, env: &Environ) -> Result<Self> {
        let Some(bin) = args.first().cloned() else {
            return Err(Error::InvalidArgument("not enough arguments".to_string()));
        };

        let virtual_args = combine(&args, env)?;
        let mut parsed = Self {
            bin,
            command_line_args: args,
            ..Default::default()
        };

        for arg in virtual_args.iter().skip(1) {
            if parsed.subcommand.is_none() && !arg.is_empty() && !arg.starts_with('-') {
                parsed.subcommand = Some(arg.clone());
            } else if arg == "-help" {
                parsed.help = true;
            } else if arg == "-version" {
                parsed.version = true;
            } else if let Some(dir) = arg.strip_prefix("-chdir=") {
                parsed.chdir = Some(dir.to_string());
            }
        }
        if parsed.subcommand.as_deref() == Some("version") {
            parsed.version = true;
        }

        parsed.virtual_args = virtual_args;
        Ok(parsed)
    }

    pub fn subcommand(&self) -> &str {
        self.subcommand.as_deref().unwrap_or("")
    }

    /// The arguments after the program name, as given on the command line.
    pub fn passthrough(&self) -> &[String] {
        self.command_line_args.get(1..).unwrap_or_default()
    }
}

/// Convert `-var value` and `-var-file value` pairs to their `=` forms.
fn clean(args: &[String]) -> Vec<String> {
    let mut result = Vec::with_capacity(args.len());
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "-var" || arg == "-var-file" {
            if let Some(value) = iter.next() {
                result.push(format!("{}={}", arg, value));
                continue;
            }
        }
        result.push(arg.clone());
    }
    result
}

/// Split an environment variable's value with shell quoting rules.
fn split_env(env: &Environ, name: &str) -> Result<Vec<String>> {
    let value = env.get(name);
    let args = shlex::split(&value)
        .ok_or_else(|| Error::InvalidArgument(format!("parsing {}: unbalanced quotes", name)))?;
    Ok(clean(&args))
}

/// Merge the command line with `TF_CLI_ARGS` and `TF_CLI_ARGS_<subcommand>`.
///
/// Environment arguments are inserted right after the subcommand, before
/// the rest of the command line.
fn combine(args: &[String], env: &Environ) -> Result<Vec<String>> {
    let args = clean(args);

    let mut result = vec![args[0].clone()];
    let mut subcommand: Option<String> = None;
    let mut after = Vec::new();

    for arg in &args[1..] {
        if subcommand.is_none() {
            result.push(arg.clone());
            if !arg.is_empty() && !arg.starts_with('-') {
                subcommand = Some(arg.clone());
            }
        } else {
            after.push(arg.clone());
        }
    }

    for arg in split_env(env, "TF_CLI_ARGS")? {
        if subcommand.is_none() && !arg.is_empty() && !arg.starts_with('-') {
            subcommand = Some(arg.clone());
        }
        result.push(arg);
    }

    if let Some(subcommand) = &subcommand {
        result.extend(split_env(env, &format!("TF_CLI_ARGS_{}", subcommand))?);
    }

    result.extend(after);
    Ok(result)
}
