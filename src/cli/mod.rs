//! CLI argument definitions for LTF.
//!
//! LTF passes its whole command line through to Terraform, so only hidden
//! long options (normally set through the environment) belong to LTF itself.

use clap::Parser;
use std::ffi::OsString;

/// Options that belong to LTF; each takes one value.
const LTF_OPTIONS: &[&str] = &["--ltf-terraform", "--ltf-test-mode"];

/// LTF - a transparent wrapper for Terraform.
#[derive(Parser, Debug)]
#[command(name = "ltf")]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Terraform executable to run
    #[arg(
        long = "ltf-terraform",
        env = "LTF_TERRAFORM",
        default_value = "terraform",
        hide = true
    )]
    pub terraform: String,

    /// Print the Terraform command instead of running it
    #[arg(long = "ltf-test-mode", env = "LTF_TEST_MODE", hide = true)]
    pub test_mode: Option<String>,

    /// Terraform arguments, passed through unchanged
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Parse a command line, keeping every argument after LTF's own leading
    /// options verbatim, including a literal `--`.
    pub fn parse_passthrough<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut args = args.into_iter().map(Into::into).peekable();
        let mut own: Vec<OsString> = args.next().into_iter().collect();

        loop {
            let taken = match args.peek().and_then(|arg| arg.to_str()) {
                Some(arg) if LTF_OPTIONS.contains(&arg) => 2,
                Some(arg) if is_inline_option(arg) => 1,
                _ => break,
            };
            own.extend(args.by_ref().take(taken));
        }

        // Everything after this is a value of `args`, even another `--`.
        own.push(OsString::from("--"));
        own.extend(args);
        Self::try_parse_from(own)
    }
}

/// `--ltf-option=value` form.
fn is_inline_option(arg: &str) -> bool {
    LTF_OPTIONS
        .iter()
        .any(|option| arg.strip_prefix(option).is_some_and(|rest| rest.starts_with('=')))
}
