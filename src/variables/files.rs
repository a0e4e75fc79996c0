//! Reading variable definition files (`*.tfvars`, `*.tfvars.json`).
//!
//! Terraform automatically loads these files from its configuration
//! directory, in this order (later files override earlier ones):
//!
//! 1. `terraform.tfvars`
//! 2. `terraform.tfvars.json`
//! 3. `*.auto.tfvars` and `*.auto.tfvars.json`, in lexical filename order
//!
//! LTF reads the same files from every directory in the chain.

use super::syntax::NativeSyntax;
use super::value::canonical;
use crate::filesystem::read_names;
use crate::{Error, Result};
use glob::Pattern;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Variable name to canonical value.
pub type Values = BTreeMap<String, String>;

const TFVARS: &str = "terraform.tfvars";
const TFVARS_JSON: &str = "terraform.tfvars.json";
const AUTO_PATTERNS: &[&str] = &["*.auto.tfvars", "*.auto.tfvars.json"];

/// Select the variable definition files from a directory listing, in the
/// order they must be applied.
pub fn filter_variable_files(names: &[String]) -> Vec<&str> {
    let mut sorted: Vec<&str> = names.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let auto: Vec<Pattern> = AUTO_PATTERNS
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect();

    let mut matches = Vec::new();
    for name in [TFVARS, TFVARS_JSON] {
        if sorted.contains(&name) {
            matches.push(name);
        }
    }
    matches.extend(
        sorted
            .iter()
            .copied()
            .filter(|name| auto.iter().any(|p| p.matches(name))),
    );
    matches
}

/// Reads variable definition files into canonical values.
pub struct VariableFileReader<'a> {
    syntax: &'a dyn NativeSyntax,
}

impl<'a> VariableFileReader<'a> {
    pub fn new(syntax: &'a dyn NativeSyntax) -> Self {
        Self { syntax }
    }

    /// Read one variables file, JSON or native syntax by its extension.
    pub fn read_file(&self, path: &Path) -> Result<Values> {
        let bytes = fs::read(path).map_err(|e| Error::filesystem(path, e))?;

        let is_json = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".json"));
        let json = if is_json {
            bytes
        } else {
            self.syntax.to_json(&bytes, path)?
        };

        let document: serde_json::Map<String, serde_json::Value> =
            serde_json::from_slice(&json).map_err(|e| Error::parse(path, e))?;

        let mut values = Values::new();
        for (name, value) in &document {
            values.insert(name.clone(), canonical(value)?);
        }
        tracing::debug!(path = %path.display(), count = values.len(), "read variables file");
        Ok(values)
    }

    /// Read every variable definition file in a directory, applying them in
    /// Terraform's order so later files override earlier ones.
    pub fn read_dir(&self, dir: &Path) -> Result<Values> {
        let names = read_names(dir)?;
        let mut values = Values::new();
        for name in filter_variable_files(&names) {
            values.extend(self.read_file(&dir.join(name))?);
        }
        Ok(values)
    }
}
