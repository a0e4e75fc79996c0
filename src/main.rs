//! LTF CLI - a transparent wrapper for Terraform.

use ltf::arguments::Arguments;
use ltf::cli::Cli;
use ltf::environ::Environ;
use ltf::variables::{HclSyntax, TerraformModule};
use ltf::wrapper;
use std::env;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LTF_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_passthrough(env::args_os()).unwrap_or_else(|e| e.exit());
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("LTF_GIT_COMMIT"),
        built = env!("LTF_BUILD_TIMESTAMP"),
        "starting ltf"
    );

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("ltf: {}", e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> ltf::Result<i32> {
    let cwd = env::current_dir().map_err(|e| ltf::Error::filesystem(".", e))?;
    let environ = Environ::from_process();

    let bin = env::args_os()
        .next()
        .map(|bin| bin.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ltf".to_string());
    let mut list = vec![bin];
    list.extend(cli.args);
    let args = Arguments::new(list, &environ)?;

    let prepared = wrapper::prepare(
        &cwd,
        &args,
        environ,
        &cli.terraform,
        &TerraformModule,
        &HclSyntax,
    )?;
    wrapper::run(&prepared, cli.test_mode.as_deref())
}
