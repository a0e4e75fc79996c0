//! Directory chain resolution.
//!
//! LTF runs Terraform in a configuration directory that is either given
//! with `-chdir` or found by walking up from the working directory until a
//! directory containing `*.tf` or `*.tf.json` files is reached. Every
//! directory walked through is kept, because tfvars and tfbackend files in
//! those directories are also used.

use super::{absolute, has_config_files, read_names};
use crate::Result;
use std::path::{Path, PathBuf};

/// The directories used for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directories {
    /// Working directory first, each later entry the parent of the previous,
    /// ending at the configuration directory. When an explicit `-chdir` is
    /// not an ancestor of the working directory this is `[cwd, chdir]`.
    chain: Vec<PathBuf>,
    /// The directory Terraform runs in.
    config_dir: PathBuf,
}

impl Directories {
    /// Resolve the directory chain for `cwd`.
    ///
    /// `cwd` must be absolute. A relative `chdir` is resolved against it.
    pub fn resolve(cwd: &Path, chdir: Option<&Path>) -> Result<Self> {
        let cwd = absolute(Path::new("/"), cwd);
        let resolved = match chdir {
            Some(chdir) => {
                let config_dir = absolute(&cwd, chdir);
                let chain = chain_to(&cwd, &config_dir);
                Self { chain, config_dir }
            }
            None => {
                let chain = chain_to_config(&cwd)?;
                let config_dir = chain.last().cloned().unwrap_or_else(|| cwd.clone());
                Self { chain, config_dir }
            }
        };
        tracing::debug!(
            chain = ?resolved.chain,
            config_dir = %resolved.config_dir.display(),
            "resolved directories"
        );
        Ok(resolved)
    }

    /// The working directory.
    pub fn cwd(&self) -> &Path {
        &self.chain[0]
    }

    /// The configuration directory Terraform runs in.
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// The directory chain, working directory first.
    pub fn chain(&self) -> &[PathBuf] {
        &self.chain
    }

    /// Whether Terraform runs somewhere other than the working directory.
    pub fn is_remote(&self) -> bool {
        self.config_dir != self.chain[0]
    }

    /// Walk the chain from the outermost directory to the working directory.
    ///
    /// Files applied in this order let directories closer to the working
    /// directory override directories further away.
    pub fn outermost_first(&self) -> impl Iterator<Item = &Path> {
        self.chain.iter().rev().map(PathBuf::as_path)
    }
}

/// Build the chain from `cwd` up to an explicit configuration directory.
fn chain_to(cwd: &Path, config_dir: &Path) -> Vec<PathBuf> {
    let mut chain = Vec::new();
    let mut dir = Some(cwd);
    while let Some(current) = dir {
        chain.push(current.to_path_buf());
        if current == config_dir {
            return chain;
        }
        dir = current.parent();
    }

    // Not an ancestor: use only the working directory and the explicit one.
    if cwd == config_dir {
        vec![cwd.to_path_buf()]
    } else {
        vec![cwd.to_path_buf(), config_dir.to_path_buf()]
    }
}

/// Build the chain from `cwd` up to the nearest directory with `*.tf` files.
fn chain_to_config(cwd: &Path) -> Result<Vec<PathBuf>> {
    let mut chain = Vec::new();
    let mut dir = Some(cwd);
    while let Some(current) = dir {
        chain.push(current.to_path_buf());
        let names = read_names(current)?;
        if has_config_files(&names) {
            return Ok(chain);
        }
        dir = current.parent();
    }

    // No configuration directory found; Terraform runs in the working directory.
    Ok(vec![cwd.to_path_buf()])
}
