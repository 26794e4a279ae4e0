use clap::Parser;
use tracing_subscriber::EnvFilter;

mod bootstrap;
mod cli;
mod commands;
mod output;
mod progress;
mod sources;
mod ui;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("evd error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();
    ui::init(&flags);

    commands::dispatch(cli.command, &flags).await
}

/// Overrides the `--quiet`/`--verbose` log level with an `EnvFilter` directive.
const LOG_ENV: &str = "EVIDENTIA_LOG";

fn log_filter(quiet: bool, verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(match (quiet, verbose) {
            (true, _) => "error",
            (false, true) => "warn,ev_index=debug,ev_llm=debug,ev_pipeline=debug",
            (false, false) => "warn",
        })
    })
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(quiet, verbose))
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("cannot install log subscriber: {error}"))
}
