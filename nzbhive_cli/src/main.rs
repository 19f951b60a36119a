use clap::Parser;
use owo_colors::OwoColorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nzbhive_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Search {
            query,
            kind,
            category,
            tvdbid,
            imdbid,
            season,
            episode,
            offset,
            limit,
            min_size,
            max_size,
            max_age,
            no_cache,
        } => {
            commands::search::run(commands::search::SearchArgs {
                query,
                kind,
                category,
                tvdbid,
                imdbid,
                season,
                episode,
                offset,
                limit,
                min_size,
                max_size,
                max_age,
                no_cache,
            })
            .await
        }
        Commands::Stats { query } => commands::stats::run(&query).await,
        Commands::Indexers => commands::indexers::run().await,
        Commands::Decode { guid } => commands::decode::run(&guid).await,
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        process::exit(1);
    }
}
