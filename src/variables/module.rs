//! Declared variables of the root module.
//!
//! Reads `variable` blocks from `*.tf` and `*.tf.json` files in the
//! configuration directory to find variable names, defaults, types and
//! sensitivity.

use super::value::canonical;
use crate::filesystem::{match_names, read_names};
use crate::{Error, Result};
use hcl::eval::{Context, Evaluate};
use hcl::{Body, Expression};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A variable declared in the Terraform configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredVariable {
    pub name: String,
    /// Canonically encoded default value, if the declaration has one.
    pub default: Option<String>,
    pub sensitive: bool,
    /// The type constraint as written, e.g. `string` or `list(string)`.
    pub type_hint: Option<String>,
}

/// Source of declared variables for a configuration directory.
pub trait DeclaredVariables {
    fn load_declared(&self, dir: &Path) -> Result<Vec<DeclaredVariable>>;
}

/// Reads declarations from the `*.tf` and `*.tf.json` files on disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerraformModule;

impl DeclaredVariables for TerraformModule {
    fn load_declared(&self, dir: &Path) -> Result<Vec<DeclaredVariable>> {
        let names = read_names(dir)?;
        let mut declared = BTreeMap::new();

        for name in match_names(&names, "*.tf") {
            let path = dir.join(name);
            let text = fs::read_to_string(&path).map_err(|e| Error::filesystem(&path, e))?;
            for var in parse_native(&text, &path)? {
                declared.insert(var.name.clone(), var);
            }
        }
        for name in match_names(&names, "*.tf.json") {
            let path = dir.join(name);
            let text = fs::read_to_string(&path).map_err(|e| Error::filesystem(&path, e))?;
            for var in parse_json(&text, &path)? {
                declared.insert(var.name.clone(), var);
            }
        }

        tracing::debug!(dir = %dir.display(), count = declared.len(), "loaded declared variables");
        Ok(declared.into_values().collect())
    }
}

/// Parse `variable "name" { ... }` blocks from native syntax.
fn parse_native(text: &str, path: &Path) -> Result<Vec<DeclaredVariable>> {
    let body: Body = hcl::parse(text).map_err(|e| Error::parse(path, e))?;
    let ctx = Context::new();

    let mut vars = Vec::new();
    for block in body.blocks().filter(|b| b.identifier() == "variable") {
        let Some(label) = block.labels().first() else {
            return Err(Error::parse(path, "variable block without a name"));
        };
        let mut var = DeclaredVariable {
            name: label.as_str().to_string(),
            ..Default::default()
        };

        for attr in block.body().attributes() {
            match attr.key() {
                "default" => {
                    let value = attr.expr().evaluate(&ctx).map_err(|e| {
                        Error::parse(path, format!("variable {} default: {}", var.name, e))
                    })?;
                    var.default = match value {
                        hcl::Value::Null => None,
                        value => Some(canonical(&serde_json::to_value(&value)?)?),
                    };
                }
                "sensitive" => {
                    let value = attr.expr().evaluate(&ctx).map_err(|e| {
                        Error::parse(path, format!("variable {} sensitive: {}", var.name, e))
                    })?;
                    var.sensitive = matches!(value, hcl::Value::Bool(true));
                }
                "type" => var.type_hint = Some(type_hint(attr.expr())),
                _ => {}
            }
        }
        vars.push(var);
    }
    Ok(vars)
}

/// Render a type constraint expression back to its source form.
fn type_hint(expr: &Expression) -> String {
    match expr {
        Expression::Variable(name) => name.as_str().to_string(),
        Expression::String(s) => s.clone(),
        other => hcl::format::to_string(other).unwrap_or_else(|_| "any".to_string()),
    }
}

#[derive(Debug, Default, Deserialize)]
struct JsonDocument {
    #[serde(default)]
    variable: BTreeMap<String, JsonVariable>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonVariable {
    default: Option<serde_json::Value>,
    #[serde(default)]
    sensitive: bool,
    #[serde(rename = "type")]
    type_hint: Option<String>,
}

/// Parse `{"variable": {"name": {...}}}` declarations from JSON syntax.
fn parse_json(text: &str, path: &Path) -> Result<Vec<DeclaredVariable>> {
    let doc: JsonDocument = serde_json::from_str(text).map_err(|e| Error::parse(path, e))?;

    let mut vars = Vec::new();
    for (name, decl) in doc.variable {
        let default = match decl.default {
            Some(value) => Some(canonical(&value)?),
            None => None,
        };
        vars.push(DeclaredVariable {
            name,
            default,
            sensitive: decl.sensitive,
            type_hint: decl.type_hint,
        });
    }
    Ok(vars)
}
