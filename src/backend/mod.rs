//! Backend configuration from `*.tfbackend` files.
//!
//! Every `*.tfbackend` file in the directory chain is rendered as HCL with a
//! `var` object holding the resolved Terraform variables, so a file like
//!
//! ```hcl
//! bucket = "terraform-state"
//! key    = "${var.stack}/terraform.tfstate"
//! ```
//!
//! produces `key = "vpc/terraform.tfstate"` when `stack` is `vpc`. Files are
//! applied from the configuration directory towards the working directory,
//! so settings closer to the working directory win.

use crate::filesystem::{Directories, match_names, read_names};
use crate::variables::VariableStore;
use crate::variables::value::flatten;
use crate::{Error, Result};
use hcl::eval::{Context, Evaluate};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Backend setting name to rendered value.
pub type BackendConfig = BTreeMap<String, String>;

/// Find the backend files to use, in the order they are applied.
pub fn find_backend_files(dirs: &Directories) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for dir in dirs.outermost_first() {
        let names = read_names(dir)?;
        for name in match_names(&names, "*.tfbackend") {
            files.push(dir.join(name));
        }
    }
    Ok(files)
}

/// Build the evaluation context exposing variables as `var.<name>`.
fn var_context(vars: &VariableStore) -> Context<'static> {
    let object: hcl::Map<String, hcl::Value> = vars
        .iter()
        .map(|v| (v.name.clone(), v.typed_value()))
        .collect();

    let mut ctx = Context::new();
    ctx.declare_var("var", hcl::Value::Object(object));
    ctx
}

/// Render one backend file into flat string settings.
pub fn render(path: &Path, vars: &VariableStore) -> Result<BackendConfig> {
    let text = fs::read_to_string(path).map_err(|e| Error::filesystem(path, e))?;
    let body = hcl::parse(&text).map_err(|e| Error::parse(path, e))?;

    if let Some(block) = body.blocks().next() {
        return Err(Error::parse(
            path,
            format!("unexpected block {}, only attributes are allowed", block.identifier()),
        ));
    }

    let ctx = var_context(vars);
    let mut config = BackendConfig::new();
    for attr in body.attributes() {
        let value = attr
            .expr()
            .evaluate(&ctx)
            .map_err(|e| Error::parse(path, format!("{}: {}", attr.key(), e)))?;
        config.insert(attr.key().to_string(), flatten(&value)?);
    }
    tracing::debug!(path = %path.display(), count = config.len(), "rendered backend file");
    Ok(config)
}

/// Render every backend file in the chain and merge them, later files
/// overriding earlier ones.
pub fn load_configuration(dirs: &Directories, vars: &VariableStore) -> Result<BackendConfig> {
    let mut config = BackendConfig::new();
    for path in find_backend_files(dirs)? {
        config.extend(render(&path, vars)?);
    }
    Ok(config)
}

/// Format settings as `-backend-config=name=value` arguments.
pub fn to_args(config: &BackendConfig) -> Vec<String> {
    config
        .iter()
        .map(|(name, value)| format!("-backend-config={}={}", name, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestTree;
    use crate::variables::VariableSource;

    fn store(values: &[(&str, &str)]) -> VariableStore {
        let mut vars = VariableStore::new();
        for (name, value) in values {
            vars.set_value(name, value, &VariableSource::CliArg).unwrap();
        }
        vars
    }

    #[test]
    fn test_render_interpolates_variables() {
        let tree = TestTree::new();
        let path = tree.write(
            "s3.tfbackend",
            r#"
bucket    = "some-bucket"
key       = "${var.stack}/terraform.tfstate"
region    = var.region
encrypted = true
extra     = var.enabled ? "success" : "failure"
"#,
        );
        let vars = store(&[("stack", "vpc"), ("region", "eu-west-1"), ("enabled", "true")]);

        let config = render(&path, &vars).unwrap();

        assert_eq!(config["bucket"], "some-bucket");
        assert_eq!(config["key"], "vpc/terraform.tfstate");
        assert_eq!(config["region"], "eu-west-1");
        assert_eq!(config["encrypted"], "true");
        assert_eq!(config["extra"], "success");
    }

    #[test]
    fn test_render_non_string_values_as_json() {
        let tree = TestTree::new();
        let path = tree.write(
            "x.tfbackend",
            "retries = 3\nendpoints = [\"a\", \"b\"]\nzones = var.zones\n",
        );
        let vars = store(&[("zones", r#"["eu-west-1a"]"#)]);

        let config = render(&path, &vars).unwrap();

        assert_eq!(config["retries"], "3");
        assert_eq!(config["endpoints"], r#"["a","b"]"#);
        assert_eq!(config["zones"], r#"["eu-west-1a"]"#);
    }

    #[test]
    fn test_render_unknown_variable_fails() {
        let tree = TestTree::new();
        let path = tree.write("s3.tfbackend", "key = var.missing\n");

        let err = render(&path, &VariableStore::new()).unwrap_err();

        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_render_rejects_blocks() {
        let tree = TestTree::new();
        let path = tree.write("s3.tfbackend", "backend {\n  bucket = \"x\"\n}\n");

        let err = render(&path, &VariableStore::new()).unwrap_err();

        assert!(err.to_string().contains("backend"));
    }

    #[test]
    fn test_find_backend_files_outermost_first() {
        let tree = TestTree::new();
        tree.write("live/main.tf", "");
        tree.write("live/b.tfbackend", "");
        tree.write("live/a.tfbackend", "");
        tree.write("live/dev/dev.tfbackend", "");
        tree.write("live/dev/terraform.tfvars", "");
        let cwd = tree.join("live/dev");
        let dirs = Directories::resolve(&cwd, None).unwrap();

        let files = find_backend_files(&dirs).unwrap();

        assert_eq!(
            files,
            vec![
                tree.join("live/a.tfbackend"),
                tree.join("live/b.tfbackend"),
                tree.join("live/dev/dev.tfbackend"),
            ]
        );
    }

    #[test]
    fn test_load_configuration_inner_files_win() {
        let tree = TestTree::new();
        tree.write("live/main.tf", "");
        tree.write(
            "live/s3.tfbackend",
            "bucket = \"shared\"\nkey = \"${var.stack}/terraform.tfstate\"\n",
        );
        tree.write("live/dev/s3.tfbackend", "bucket = \"dev-${var.stack}\"\n");
        let dirs = Directories::resolve(&tree.join("live/dev"), None).unwrap();
        let vars = store(&[("stack", "vpc")]);

        let config = load_configuration(&dirs, &vars).unwrap();

        assert_eq!(config["bucket"], "dev-vpc");
        assert_eq!(config["key"], "vpc/terraform.tfstate");
        assert_eq!(
            to_args(&config),
            vec![
                "-backend-config=bucket=dev-vpc",
                "-backend-config=key=vpc/terraform.tfstate",
            ]
        );
    }

    #[test]
    fn test_load_configuration_no_files() {
        let tree = TestTree::new();
        tree.write("main.tf", "");
        let dirs = Directories::resolve(tree.path(), None).unwrap();

        let config = load_configuration(&dirs, &VariableStore::new()).unwrap();

        assert!(config.is_empty());
    }
}
