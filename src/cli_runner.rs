//! CLI runner shared by `main` and the integration tests: logging setup,
//! dispatch to [`operation::run`], error reporting and the exit code.

use std::process::ExitCode;
use std::time::Instant;

use tracing_subscriber::EnvFilter;

use crate::cli::Args;
use crate::operation;

/// Installs the stderr `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-v` selects `debug` and the default is `warn`.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    // A second install (tests calling this twice) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Runs one operation and maps its outcome to the process exit code.
pub fn run_cli_app(args: &Args) -> ExitCode {
    let started = Instant::now();
    let result = operation::run(&args.source, &args.destination, &args.options());

    let code = match result {
        Ok(outcome) => {
            tracing::debug!(?outcome, "operation finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    };

    if args.benchmark {
        println!("Elapsed: {:.3} s", started.elapsed().as_secs_f64());
    }
    code
}
