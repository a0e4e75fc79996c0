//! Terraform variable loading with precedence and freezing.
//!
//! LTF passes variables to Terraform as `TF_VAR_name` environment
//! variables. Terraform prefers several other sources over the environment,
//! so a value from one of those sources is *frozen*: a later, lower
//! precedence source may not change it, and trying to is an error rather
//! than a silently ignored value.
//!
//! ## Load order
//!
//! 1. Declared defaults from the configuration directory (not frozen)
//! 2. tfvars files in the configuration directory (frozen)
//! 3. `-var` and `-var-file` arguments (frozen)
//! 4. tfvars files in the other directories of the chain, outermost first
//!    (not frozen, and may not change frozen values)

pub mod files;
pub mod module;
pub mod syntax;
pub mod value;

pub use files::{Values, VariableFileReader, filter_variable_files};
pub use module::{DeclaredVariable, DeclaredVariables, TerraformModule};
pub use syntax::{HclSyntax, NativeSyntax};

use crate::filesystem::{Directories, absolute};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Where a variable's current value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableSource {
    /// Default from the variable declaration (or no value at all)
    Default,
    /// tfvars file in the configuration directory
    ConfigDir(PathBuf),
    /// `-var` or `-var-file` argument
    CliArg,
    /// tfvars file in another directory of the chain
    OtherDir(PathBuf),
}

impl VariableSource {
    /// Whether values from this source are frozen.
    pub fn freezes(&self) -> bool {
        matches!(self, VariableSource::ConfigDir(_) | VariableSource::CliArg)
    }
}

impl std::fmt::Display for VariableSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableSource::Default => write!(f, "default"),
            VariableSource::ConfigDir(dir) => write!(f, "config-dir:{}", dir.display()),
            VariableSource::CliArg => write!(f, "cli"),
            VariableSource::OtherDir(dir) => write!(f, "dir:{}", dir.display()),
        }
    }
}

/// A resolved Terraform variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    /// Canonical string value (plain string or compact JSON).
    pub value: String,
    pub source: VariableSource,
    pub frozen: bool,
    pub sensitive: bool,
    /// Declared type constraint, if any.
    pub type_hint: Option<String>,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: impl Into<String>, source: VariableSource) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            source,
            frozen: false,
            sensitive: false,
            type_hint: None,
        }
    }

    /// The typed value used when rendering backend files.
    pub fn typed_value(&self) -> hcl::Value {
        value::typed(&self.value, self.type_hint.as_deref())
    }

    /// The value as shown to users, redacted when sensitive.
    pub fn display_value(&self) -> &str {
        if self.sensitive {
            "(sensitive value)"
        } else {
            &self.value
        }
    }
}

/// Variables for one invocation, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableStore {
    vars: BTreeMap<String, Variable>,
}

impl VariableStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load variables from every source in precedence order.
    pub fn load(
        declared: &dyn DeclaredVariables,
        syntax: &dyn NativeSyntax,
        virtual_args: &[String],
        dirs: &Directories,
    ) -> Result<Self> {
        let mut store = Self::new();
        let reader = VariableFileReader::new(syntax);
        let config_dir = dirs.config_dir();

        for decl in declared.load_declared(config_dir)? {
            let mut var = Variable::new(
                decl.name,
                decl.default.unwrap_or_default(),
                VariableSource::Default,
            );
            var.sensitive = decl.sensitive;
            var.type_hint = decl.type_hint;
            store.vars.insert(var.name.clone(), var);
        }

        // Terraform prefers these over TF_VAR_name, so they are frozen.
        let source = VariableSource::ConfigDir(config_dir.to_path_buf());
        store.set_values(reader.read_dir(config_dir)?, &source)?;

        let cli = read_args(&reader, virtual_args, dirs.cwd())?;
        store.set_values(cli, &VariableSource::CliArg)?;

        for dir in dirs.outermost_first() {
            if dir == config_dir {
                continue;
            }
            let source = VariableSource::OtherDir(dir.to_path_buf());
            store.set_values(reader.read_dir(dir)?, &source)?;
        }

        Ok(store)
    }

    /// Set a variable, creating it if needed.
    ///
    /// A freezing source always writes and freezes the variable. Any other
    /// source fails when the variable is frozen with a different value.
    pub fn set_value(
        &mut self,
        name: &str,
        value: &str,
        source: &VariableSource,
    ) -> Result<&Variable> {
        let freeze = source.freezes();
        let var = self
            .vars
            .entry(name.to_string())
            .or_insert_with(|| Variable::new(name, "", VariableSource::Default));

        if !freeze && var.frozen && var.value != value {
            let dir = match source {
                VariableSource::ConfigDir(dir) | VariableSource::OtherDir(dir) => dir.clone(),
                _ => PathBuf::new(),
            };
            return Err(Error::FrozenVariable {
                name: name.to_string(),
                dir,
            });
        }

        var.value = value.to_string();
        var.source = source.clone();
        if freeze {
            var.frozen = true;
        }
        tracing::trace!(name = %name, source = %source, frozen = var.frozen, "set variable");
        Ok(var)
    }

    /// Set several variables from the same source.
    pub fn set_values(&mut self, values: Values, source: &VariableSource) -> Result<()> {
        for (name, value) in &values {
            self.set_value(name, value, source)?;
        }
        Ok(())
    }

    /// Get a variable's value, or an empty string if it is unknown.
    pub fn get_value(&self, name: &str) -> &str {
        self.vars.get(name).map(|v| v.value.as_str()).unwrap_or("")
    }

    /// Get a variable by name.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    /// Iterate over all variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.values()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Collect values from `-var=name=value` and `-var-file=path` arguments,
/// left to right. Relative `-var-file` paths are resolved against `cwd`.
pub fn read_args(reader: &VariableFileReader<'_>, args: &[String], cwd: &Path) -> Result<Values> {
    let mut values = Values::new();
    for arg in args {
        if let Some(rest) = arg.strip_prefix("-var=") {
            let Some((name, value)) = rest.split_once('=') else {
                return Err(Error::InvalidArgument(arg.clone()));
            };
            values.insert(name.to_string(), value.to_string());
        } else if let Some(file) = arg.strip_prefix("-var-file=") {
            if file.is_empty() {
                return Err(Error::InvalidArgument(arg.clone()));
            }
            let path = absolute(cwd, Path::new(file));
            values.extend(reader.read_file(&path)?);
        }
    }
    Ok(values)
}
