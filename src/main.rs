//! loopcurate CLI entry point.

use clap::Parser;
use loopcurate::cli::{self, Cli, Commands, EXIT_ERROR};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    // Logs go to stderr so JSON reports on stdout stay parseable.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    loopcurate::init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run(args) => cli::run_pipeline(args),
        Commands::Extract(args) => cli::run_extract(args),
        Commands::Score(args) => cli::run_score(args),
        Commands::Init(args) => cli::run_init(args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
