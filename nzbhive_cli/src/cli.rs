use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "nzbhive",
    about = "Meta search across NZB indexers",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchKind {
    General,
    Tv,
    Movie,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search all enabled indexers and print the merged result list
    Search {
        /// Free-text query (optional for identifier-based tv/movie searches)
        query: Option<String>,

        /// Search type
        #[arg(long = "type", value_enum, default_value = "general")]
        kind: SearchKind,

        /// Category filter (passed to indexers that support it)
        #[arg(long)]
        category: Option<String>,

        /// TVDB show id (tv searches)
        #[arg(long)]
        tvdbid: Option<String>,

        /// IMDB movie id (movie searches)
        #[arg(long)]
        imdbid: Option<String>,

        #[arg(long)]
        season: Option<u32>,

        #[arg(long)]
        episode: Option<u32>,

        #[arg(long, default_value_t = 0)]
        offset: usize,

        #[arg(long, default_value_t = 50)]
        limit: usize,

        /// Minimum size, e.g. 700MB or 1.5GB
        #[arg(long)]
        min_size: Option<String>,

        /// Maximum size, e.g. 8GB
        #[arg(long)]
        max_size: Option<String>,

        /// Maximum age in days
        #[arg(long)]
        max_age: Option<i64>,

        /// Bypass the result cache for this search
        #[arg(long)]
        no_cache: bool,
    },

    /// Run a probe search and report per-indexer performance statistics
    Stats {
        /// Query used to probe every enabled indexer
        query: String,
    },

    /// List the configured indexers
    Indexers,

    /// Decode a composite result guid back to (indexer, local id)
    Decode {
        guid: String,
    },
}
