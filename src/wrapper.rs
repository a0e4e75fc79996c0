//! Build and run the Terraform command for one LTF invocation.

use crate::arguments::Arguments;
use crate::backend;
use crate::environ::Environ;
use crate::filesystem::Directories;
use crate::variables::{DeclaredVariables, NativeSyntax, VariableStore};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

pub const HELP_MESSAGE: &str = "\
LTF is a transparent wrapper for Terraform; it passes all command line
arguments and environment variables through to Terraform. LTF also checks
the current directory and parent directories for various Terraform files
and alters the command line arguments and environment variables to make
Terraform use them.";

/// Version line printed before `terraform -version`.
pub fn version_message() -> String {
    format!("LTF {} ({})", env!("CARGO_PKG_VERSION"), env!("LTF_GIT_COMMIT"))
}

/// A Terraform command ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    /// Program followed by its arguments.
    pub args: Vec<String>,
    /// Complete environment for the child process.
    pub env: Environ,
    /// Text printed to stdout before Terraform runs (help or version).
    pub banner: Option<String>,
    /// Variables that were exported, empty in skip mode.
    pub vars: VariableStore,
}

impl Prepared {
    /// The command as a single line for display.
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.args[0]);
        cmd.args(&self.args[1..]);
        cmd.env_clear();
        cmd.envs(self.env.iter());
        cmd
    }
}

/// Commands that Terraform runs without a configuration directory.
fn is_skip_mode(args: &Arguments) -> bool {
    args.help || args.version || matches!(args.subcommand(), "" | "fmt")
}

/// Path of `to` relative to `from`, `.` when they are the same.
fn relative(to: &Path, from: &Path) -> Result<PathBuf> {
    let rel = pathdiff::diff_paths(to, from).ok_or_else(|| {
        Error::Other(format!(
            "cannot express {} relative to {}",
            to.display(),
            from.display()
        ))
    })?;
    if rel.as_os_str().is_empty() {
        Ok(PathBuf::from("."))
    } else {
        Ok(rel)
    }
}

/// Work out the Terraform command and environment.
///
/// Prints the `+ NAME=value` lines for every environment change it makes.
pub fn prepare(
    cwd: &Path,
    args: &Arguments,
    mut env: Environ,
    terraform: &str,
    declared: &dyn DeclaredVariables,
    syntax: &dyn NativeSyntax,
) -> Result<Prepared> {
    let mut cmd_args = vec![terraform.to_string()];
    let mut vars = VariableStore::new();

    if !is_skip_mode(args) {
        let dirs = Directories::resolve(cwd, args.chdir.as_deref().map(Path::new))?;
        let cwd = dirs.cwd();
        let config_dir = dirs.config_dir();

        if dirs.is_remote() && env.get("TF_DATA_DIR").is_empty() {
            let data_dir = relative(cwd, config_dir)?.join(".terraform");
            let data_dir = data_dir.to_string_lossy().into_owned();
            eprintln!("+ TF_DATA_DIR={}", data_dir);
            env.set("TF_DATA_DIR", data_dir);
        }

        vars = VariableStore::load(declared, syntax, &args.virtual_args, &dirs)?;
        for var in vars.iter() {
            env.set(format!("TF_VAR_{}", var.name), var.value.as_str());
            if !var.value.is_empty() {
                eprintln!("+ TF_VAR_{}={}", var.name, var.display_value());
            }
        }

        if args.chdir.is_none() && dirs.is_remote() {
            let chdir = relative(config_dir, cwd)?;
            cmd_args.push(format!("-chdir={}", chdir.display()));
        }

        if args.subcommand() == "init" {
            let config = backend::load_configuration(&dirs, &vars)?;
            if !config.is_empty() {
                let mut init_args = backend::to_args(&config);
                let old = env.get("TF_CLI_ARGS_init");
                if !old.is_empty() {
                    init_args.push(old.into_owned());
                }
                let value = init_args.join(" ");
                eprintln!("+ TF_CLI_ARGS_init={}", value);
                env.set("TF_CLI_ARGS_init", value);
            }
        }
    }

    cmd_args.extend(args.passthrough().iter().cloned());

    let banner = if args.help {
        Some(format!("{}\n", HELP_MESSAGE))
    } else if args.version {
        Some(format!("{}\n", version_message()))
    } else {
        None
    };

    Ok(Prepared {
        args: cmd_args,
        env,
        banner,
        vars,
    })
}

/// Run a prepared command and return Terraform's exit status.
///
/// With `test_mode` set the command is printed but not run.
pub fn run(prepared: &Prepared, test_mode: Option<&str>) -> Result<i32> {
    if let Some(banner) = &prepared.banner {
        println!("{}", banner);
    }

    let line = prepared.command_line();
    if let Some(mode) = test_mode.filter(|m| !m.is_empty()) {
        eprintln!("# LTF_TEST_MODE={} skipped {}", mode, line);
        return Ok(0);
    }
    eprintln!("# {}", line);

    // Terraform handles the interrupt itself and exits on its own.
    if let Err(e) = ctrlc::set_handler(|| {}) {
        tracing::warn!(error = %e, "failed to set Ctrl-C handler");
    }

    let status = prepared
        .command()
        .status()
        .map_err(|e| Error::Other(format!("running {}: {}", prepared.args[0], e)))?;

    // Killed by a signal: report failure.
    Ok(status.code().unwrap_or(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestTree;
    use crate::variables::{HclSyntax, TerraformModule};

    fn prepare_in(tree: &TestTree, cwd: &str, cli: &[&str], env: Environ) -> Result<Prepared> {
        let mut list = vec!["ltf".to_string()];
        list.extend(cli.iter().map(|s| s.to_string()));
        let args = Arguments::new(list, &env)?;
        prepare(&tree.join(cwd), &args, env, "terraform", &TerraformModule, &HclSyntax)
    }

    fn layout() -> TestTree {
        let tree = TestTree::new();
        tree.write(
            "live/main.tf",
            "variable \"stack\" {}\nvariable \"region\" {\n  default = \"eu-west-1\"\n}\n",
        );
        tree.write(
            "live/s3.tfbackend",
            "bucket = \"state\"\nkey = \"${var.stack}/terraform.tfstate\"\n",
        );
        tree.write("live/dev/vpc/terraform.tfvars", "stack = \"vpc\"\n");
        tree
    }

    #[test]
    fn test_skip_mode_passes_arguments_through() {
        let tree = layout();

        let cases: [&[&str]; 4] = [&["-help"], &["-version"], &["fmt"], &[]];
        for cli in cases {
            let prepared = prepare_in(&tree, "live/dev/vpc", cli, Environ::new()).unwrap();

            let mut expected = vec!["terraform".to_string()];
            expected.extend(cli.iter().map(|s| s.to_string()));
            assert_eq!(prepared.args, expected);
            assert_eq!(prepared.env, Environ::new());
            assert!(prepared.vars.is_empty());
        }
    }

    #[test]
    fn test_banners() {
        let tree = layout();

        let help = prepare_in(&tree, "live", &["-help"], Environ::new()).unwrap();
        assert!(help.banner.unwrap().starts_with("LTF is a transparent wrapper"));

        let version = prepare_in(&tree, "live", &["version"], Environ::new()).unwrap();
        assert!(version.banner.unwrap().starts_with("LTF "));

        let plan = prepare_in(&tree, "live", &["plan"], Environ::new()).unwrap();
        assert_eq!(plan.banner, None);
    }

    #[test]
    fn test_plan_from_subdirectory() {
        let tree = layout();

        let prepared = prepare_in(&tree, "live/dev/vpc", &["plan"], Environ::new()).unwrap();

        assert_eq!(prepared.args, vec!["terraform", "-chdir=../..", "plan"]);
        assert_eq!(prepared.env.get("TF_DATA_DIR"), "dev/vpc/.terraform");
        assert_eq!(prepared.env.get("TF_VAR_stack"), "vpc");
        assert_eq!(prepared.env.get("TF_VAR_region"), "eu-west-1");
        assert_eq!(prepared.env.get("TF_CLI_ARGS_init"), "");
    }

    #[test]
    fn test_plan_in_configuration_directory() {
        let tree = layout();

        let prepared =
            prepare_in(&tree, "live", &["plan", "-var=stack=x"], Environ::new()).unwrap();

        assert_eq!(prepared.args, vec!["terraform", "plan", "-var=stack=x"]);
        assert_eq!(prepared.env.get("TF_DATA_DIR"), "");
        assert_eq!(prepared.env.get("TF_VAR_stack"), "x");
    }

    #[test]
    fn test_existing_data_dir_is_kept() {
        let tree = layout();
        let env = Environ::new().with("TF_DATA_DIR", "/tmp/data");

        let prepared = prepare_in(&tree, "live/dev/vpc", &["plan"], env).unwrap();

        assert_eq!(prepared.env.get("TF_DATA_DIR"), "/tmp/data");
    }

    #[test]
    fn test_explicit_chdir_is_not_repeated() {
        let tree = layout();

        let prepared =
            prepare_in(&tree, "live/dev/vpc", &["-chdir=../..", "plan"], Environ::new()).unwrap();

        assert_eq!(prepared.args, vec!["terraform", "-chdir=../..", "plan"]);
        assert_eq!(prepared.env.get("TF_DATA_DIR"), "dev/vpc/.terraform");
    }

    #[test]
    fn test_init_sets_backend_config() {
        let tree = layout();
        let env = Environ::new().with("TF_CLI_ARGS_init", "-upgrade");

        let prepared = prepare_in(&tree, "live/dev/vpc", &["init"], env).unwrap();

        assert_eq!(
            prepared.env.get("TF_CLI_ARGS_init"),
            "-backend-config=bucket=state -backend-config=key=vpc/terraform.tfstate -upgrade"
        );
    }

    #[test]
    fn test_frozen_conflict_fails() {
        let tree = layout();

        let err = prepare_in(
            &tree,
            "live/dev/vpc",
            &["plan", "-var=stack=other"],
            Environ::new(),
        )
        .unwrap_err();

        assert!(matches!(err, Error::FrozenVariable { ref name, .. } if name == "stack"));
    }

    #[test]
    fn test_environment_is_kept() {
        let tree = layout();
        let env = Environ::new().with("HOME", "/home/user");

        let prepared = prepare_in(&tree, "live", &["plan"], env).unwrap();

        assert_eq!(prepared.env.get("HOME"), "/home/user");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_environment_reaches_terraform_unchanged() {
        use std::ffi::{OsStr, OsString};
        use std::os::unix::ffi::OsStringExt;

        let tree = layout();
        let raw = OsString::from_vec(vec![b'x', 0xfe, b'y']);
        let env = Environ::new().with("LANG_RAW", raw.clone());

        let prepared = prepare_in(&tree, "live/dev/vpc", &["plan"], env).unwrap();

        let kept: Vec<&OsStr> = prepared
            .env
            .iter()
            .filter(|(name, _)| *name == "LANG_RAW")
            .map(|(_, value)| value)
            .collect();
        assert_eq!(kept, vec![raw.as_os_str()]);
    }

    #[test]
    fn test_run_in_test_mode_does_not_spawn() {
        let prepared = Prepared {
            args: vec!["/nonexistent/terraform".to_string(), "plan".to_string()],
            env: Environ::new(),
            banner: None,
            vars: VariableStore::new(),
        };

        assert_eq!(run(&prepared, Some("1")).unwrap(), 0);
    }

    #[test]
    fn test_relative_same_dir() {
        assert_eq!(
            relative(Path::new("/a/b"), Path::new("/a/b")).unwrap(),
            PathBuf::from(".")
        );
        assert_eq!(
            relative(Path::new("/a"), Path::new("/a/b/c")).unwrap(),
            PathBuf::from("../..")
        );
    }
}
