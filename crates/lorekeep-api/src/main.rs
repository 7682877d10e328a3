//! Lorekeep CLI entry point.
//!
//! Binary name: `lkeep`
//!
//! Parses CLI arguments, initializes the series agent, and dispatches to
//! the appropriate command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Tracing filter from verbosity.
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,lorekeep=debug",
        _ => "trace",
    };

    // Shell completions don't need app state.
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "lkeep", &mut std::io::stdout());
        return Ok(());
    }

    // Ingestion and summary generation need the LLM; pure reads degrade
    // gracefully without a key.
    let needs_llm = matches!(&cli.command, Commands::Ingest { .. } | Commands::Summary { .. });
    let state = AppState::init(&cli, needs_llm, filter).await?;

    let result = match &cli.command {
        Commands::Ingest { transcript, season, episode, title, air_date } => {
            cli::ingest::run(&state, transcript, *season, *episode, title, air_date.as_deref(), cli.json)
                .await
        }
        Commands::Summary { season, episode } => {
            cli::summary::run(&state, *season, *episode, cli.json).await
        }
        Commands::Character { name } => cli::query::character(&state, name, cli.json).await,
        Commands::Relationship { character1, character2 } => {
            cli::query::relationship(&state, character1, character2, cli.json).await
        }
        Commands::Arc { name } => cli::query::plot_arc(&state, name, cli.json).await,
        Commands::FindScene { query, n_results } => {
            cli::query::find_scene(&state, query, *n_results, cli.json).await
        }
        Commands::Search { query, n_results } => {
            cli::query::search(&state, query, *n_results, cli.json).await
        }
        Commands::Mystery { description } => cli::query::mystery(&state, description, cli.json).await,
        Commands::Context { season, episode } => {
            cli::query::context(&state, *season, *episode, cli.json).await
        }
        Commands::Stats => cli::stats::stats(&state, cli.json).await,
        Commands::Health => cli::stats::health(&state, cli.json).await,
        Commands::Reset { force } => cli::reset::run(&state, *force, cli.json).await,
        Commands::Completions { .. } => unreachable!("handled above"),
    };

    lorekeep_observe::tracing_setup::shutdown_tracing();
    result
}
