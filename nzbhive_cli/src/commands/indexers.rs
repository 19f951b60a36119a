use comfy_table::{presets::UTF8_FULL, Cell, Table};

use nzbhive_core::{ConfigStore, IndexerKind};

use crate::commands::Result;

pub async fn run() -> Result<()> {
    let config = ConfigStore::new_default().load();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Name", "Kind", "Enabled", "Timeout"]);

    for indexer in &config.indexers {
        let kind = match &indexer.kind {
            IndexerKind::Binsearch => "binsearch".to_string(),
            IndexerKind::Nzbclub => "nzbclub".to_string(),
            IndexerKind::Nzbindex => "nzbindex".to_string(),
            IndexerKind::Newznab { base_url, .. } => format!("newznab ({base_url})"),
        };
        table.add_row(vec![
            Cell::new(&indexer.name),
            Cell::new(kind),
            Cell::new(if indexer.enabled { "yes" } else { "no" }),
            Cell::new(format!("{} ms", indexer.timeout_ms)),
        ]);
    }

    println!("{table}");
    Ok(())
}
