//! CLI entry point.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use papervisor_cli::{Cli, CliError, Commands, bootstrap, handlers};
use papervisor_core::Settings;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before clap reads env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = Settings::from_env().map_err(CliError::from)?;
    cli.apply_overrides(&mut settings);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    // Commands that need no services
    match &command {
        Commands::Hash { file } => return handlers::hash::execute(file).await,
        Commands::Settings => return handlers::settings::execute(&settings),
        _ => {}
    }

    let ctx = bootstrap(settings).await?;
    match command {
        Commands::Run { no_start } => handlers::run::execute(&ctx, !no_start).await,
        Commands::List { kind } => handlers::list::execute(&ctx, kind).await,
        Commands::Rejected { command } => handlers::rejected::execute(&ctx, command).await,
        Commands::Hash { .. } | Commands::Settings => Ok(()),
    }
}
