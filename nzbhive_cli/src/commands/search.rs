use std::sync::Arc;

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use nzbhive_core::search::{SearchRequest, SearchType};
use nzbhive_core::{ConfigStore, HttpFetcher, SearchEngine};

use crate::cli::SearchKind;
use crate::commands::{human_size, parse_size_arg, CommandError, Result};

pub struct SearchArgs {
    pub query: Option<String>,
    pub kind: SearchKind,
    pub category: Option<String>,
    pub tvdbid: Option<String>,
    pub imdbid: Option<String>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub offset: usize,
    pub limit: usize,
    pub min_size: Option<String>,
    pub max_size: Option<String>,
    pub max_age: Option<i64>,
    pub no_cache: bool,
}

pub async fn run(args: SearchArgs) -> Result<()> {
    let request = build_request(&args)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("Invalid progress template"),
    );
    spinner.set_message("Searching indexers...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let config = ConfigStore::new_default().load();
    let engine = SearchEngine::new(config, Arc::new(HttpFetcher::new()));
    let response = engine.search(!args.no_cache, &request).await;
    spinner.finish_and_clear();

    let response = match response {
        Ok(response) => response,
        Err(nzbhive_core::error::SearchError::AllProvidersFailed { attempted }) => {
            eprintln!(
                "{}: all {} indexers failed or timed out - service degraded, try again later",
                "Warning".yellow().bold(),
                attempted
            );
            return Ok(());
        }
        Err(e) => return Err(CommandError::Search(e)),
    };

    if response.results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Title", "Size", "Age", "Indexers"]);

    for result in &response.results {
        let age = match (result.age_days, result.age_precise) {
            (Some(days), true) => format!("{days}d"),
            (Some(days), false) => format!("~{days}d"),
            (None, _) => "-".to_string(),
        };
        let indexers = result
            .seen_on
            .iter()
            .map(|p| p.indexer.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        table.add_row(vec![
            Cell::new(&result.title),
            Cell::new(human_size(result.size_bytes)),
            Cell::new(age),
            Cell::new(indexers),
        ]);
    }

    println!("{table}");
    println!(
        "{} of {} results (offset {})",
        response.results.len(),
        response.total,
        response.offset
    );

    Ok(())
}

fn build_request(args: &SearchArgs) -> Result<SearchRequest> {
    let search_type = match args.kind {
        SearchKind::General => SearchType::General,
        SearchKind::Tv => SearchType::Tv,
        SearchKind::Movie => SearchType::Movie,
    };

    let mut request = SearchRequest::new(search_type).with_page(args.offset, args.limit);

    if let Some(query) = &args.query {
        request = request.with_query(query.clone());
    }
    if let Some(category) = &args.category {
        request = request.with_category(category.clone());
    }
    if let Some(tvdbid) = &args.tvdbid {
        request = request.with_identifier("tvdbid", tvdbid.clone());
    }
    if let Some(imdbid) = &args.imdbid {
        request = request.with_identifier("imdbid", imdbid.clone());
    }
    request = request.with_episode(args.season, args.episode);

    let min_size = args.min_size.as_deref().map(parse_size_arg).transpose()?;
    let max_size = args.max_size.as_deref().map(parse_size_arg).transpose()?;
    request = request.with_size_bounds(min_size, max_size);
    request = request.with_age_bounds(None, args.max_age);

    Ok(request)
}
