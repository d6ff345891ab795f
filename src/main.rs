// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, hand off to the
//   command handlers.
// - Any error is printed with hints and turned into exit code 1.

use clap::Parser;
use orshot_cli::{cli::Cli, commands, CredentialStore};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Credential file location: `ORSHOT_CONFIG_DIR` or the platform config
    // directory. See `CredentialStore::from_env`.
    let store = CredentialStore::from_env();

    if let Err(err) = commands::run(cli, &store) {
        commands::report_error(&err, &store);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` or `DEBUG` select debug output.
fn init_logging(verbose: bool) {
    let default_level = if verbose || std::env::var_os("DEBUG").is_some() {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
