mod aggregator;
mod categorizer;
mod cli;
mod error;
mod fmt;
mod legacy;
mod models;
mod output;
mod parser;
#[cfg(feature = "pdf")]
mod pdf;
mod ranker;
mod reports;
mod settings;
mod taxonomy;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

/// `RUST_LOG` wins; otherwise `-v` raises the level from warn to info, `-vv` to debug.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Report(args) => cli::report::run(args),
        Commands::Categories => cli::categories::run(),
        Commands::Status(args) => cli::status::run(args),
        Commands::Convert { file, output } => cli::convert::run(&file, output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error [{}]: {e}", e.stage());
        std::process::exit(1);
    }
}
