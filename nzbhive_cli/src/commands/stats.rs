use std::sync::Arc;

use comfy_table::{presets::UTF8_FULL, Cell, Table};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use nzbhive_core::search::{SearchRequest, SearchType};
use nzbhive_core::{ConfigStore, HttpFetcher, SearchEngine};

use crate::commands::Result;

/// Probe every enabled indexer with an uncached search and report the
/// per-indexer outcome statistics.
pub async fn run(query: &str) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("Invalid progress template"),
    );
    spinner.set_message("Probing indexers...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let config = ConfigStore::new_default().load();
    let engine = SearchEngine::new(config, Arc::new(HttpFetcher::new()));
    let request = SearchRequest::new(SearchType::General).with_query(query);
    let outcome = engine.search(false, &request).await;
    spinner.finish_and_clear();

    match outcome {
        Ok(_) => {}
        Err(nzbhive_core::error::SearchError::AllProvidersFailed { attempted }) => {
            eprintln!(
                "{}: all {} indexers failed during the probe",
                "Warning".yellow().bold(),
                attempted
            );
        }
        Err(e) => return Err(e.into()),
    }

    let stats = engine.stats();
    if stats.is_empty() {
        println!("No indexers were attempted.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Indexer",
        "Attempts",
        "Success rate",
        "Avg response",
        "Results",
        "Result share",
    ]);

    for snapshot in stats {
        table.add_row(vec![
            Cell::new(&snapshot.indexer),
            Cell::new(snapshot.attempts),
            Cell::new(format!("{:.0}%", snapshot.success_rate * 100.0)),
            Cell::new(format!("{:.0} ms", snapshot.avg_response_ms)),
            Cell::new(snapshot.results),
            Cell::new(format!("{:.0}%", snapshot.result_share * 100.0)),
        ]);
    }

    println!("{table}");
    Ok(())
}
