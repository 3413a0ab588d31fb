//! CLI entry point.
//!
//! Parses arguments, initializes tracing, bootstraps the context and
//! dispatches to the handlers.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use relayctl_cli::{Cli, CliError, Commands, SessionKind, bootstrap, handlers};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

/// Diagnostics go to stderr so they never interleave with command output
/// on stdout. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = &cli.command else {
        // No command provided - show help
        Cli::command().print_help()?;
        return Ok(());
    };

    let kind = match command {
        Commands::Run { .. } => SessionKind::Live,
        _ => SessionKind::Offline,
    };
    let ctx = bootstrap(&cli, kind).await?;

    match command {
        Commands::Add { files } => handlers::add::execute(&ctx, files).await?,
        Commands::Remove { number } => handlers::remove::execute(&ctx, *number).await?,
        Commands::List { json } => handlers::list::execute(&ctx, *json).await?,
        Commands::Clear => handlers::clear::execute(&ctx).await?,
        Commands::Urls => handlers::urls::execute(&ctx).await?,
        Commands::Config => handlers::config::execute(&ctx).await?,
        Commands::Run { start_all } => handlers::run::execute(&ctx, *start_all).await?,
    }

    Ok(())
}
