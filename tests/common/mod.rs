//! Common test utilities for ltf integration tests.
//!
//! Provides `TestEnv` for laying out Terraform files in a temporary
//! directory and running `ltf` against them without running Terraform.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// A temporary directory tree holding Terraform configuration.
///
/// The `ltf()` method returns a `Command` with a cleared environment and
/// `LTF_TEST_MODE=1`, so the Terraform command is printed instead of run.
pub struct TestEnv {
    pub root: TempDir,
}

impl TestEnv {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
        }
    }

    /// Create the layout used by most tests:
    ///
    /// ```text
    /// live/main.tf              declares stack, region, password
    /// live/terraform.tfvars     region (frozen)
    /// live/s3.tfbackend         bucket, key
    /// live/dev/vpc/vpc.auto.tfvars   stack, password
    /// ```
    pub fn stack() -> Self {
        let env = Self::new();
        env.write(
            "live/main.tf",
            r#"
variable "stack" {
  type = string
}

variable "region" {
  type = string
}

variable "password" {
  type      = string
  default   = ""
  sensitive = true
}
"#,
        );
        env.write("live/terraform.tfvars", "region = \"eu-west-1\"\n");
        env.write(
            "live/s3.tfbackend",
            r#"
bucket = "terraform-state"
key    = "${var.stack}/terraform.tfstate"
region = var.region
"#,
        );
        env.write(
            "live/dev/vpc/vpc.auto.tfvars",
            "stack = \"vpc\"\npassword = \"hunter2\"\n",
        );
        env
    }

    /// Get the root path of the tree.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Get an absolute path inside the tree.
    pub fn join(&self, rel: &str) -> PathBuf {
        self.root.path().join(rel)
    }

    /// Write a file inside the tree, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    /// Get a Command for the ltf binary running in `rel`.
    ///
    /// The environment is cleared per-command for parallel safety.
    pub fn ltf(&self, rel: &str) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_ltf"));
        cmd.current_dir(self.join(rel));
        cmd.env_clear();
        cmd.env("LTF_TEST_MODE", "1");
        cmd
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
