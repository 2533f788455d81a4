//! Main entry point for the bzst CLI app

use bzst::{cli, cli_runner};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = match cli::run() {
        Ok(args) => args,
        // clap prints help/version/usage itself and picks its own exit status.
        Err(e) => e.exit(),
    };
    cli_runner::init_tracing(args.verbose);
    cli_runner::run_cli_app(&args)
}
