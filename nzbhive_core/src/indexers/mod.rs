//! Indexer adapter implementations.
//!
//! One module per supported indexer. Adapters are constructed from
//! configuration at load time; which implementation backs a configured
//! indexer is decided by its `kind`, never by runtime probing.

pub mod binsearch;
pub mod newznab;
pub mod nzbclub;
pub mod nzbindex;

pub use binsearch::BinsearchAdapter;
pub use newznab::NewznabAdapter;
pub use nzbclub::NzbclubAdapter;
pub use nzbindex::NzbindexAdapter;

use std::sync::Arc;

use crate::config::{HiveConfig, IndexerKind};
use crate::{IndexerAdapter, IndexerRegistry};

/// Build the adapter registry for a configuration. Disabled indexers are
/// registered too - the orchestrator filters on the enabled flag so a config
/// toggle does not require a rebuild.
pub fn build_registry(config: &HiveConfig) -> IndexerRegistry {
    let mut registry = IndexerRegistry::new();

    for indexer in &config.indexers {
        let adapter: Arc<dyn IndexerAdapter> = match &indexer.kind {
            IndexerKind::Binsearch => Arc::new(BinsearchAdapter::new(
                indexer.name.clone(),
                indexer.max_results,
            )),
            IndexerKind::Nzbclub => Arc::new(NzbclubAdapter::new(
                indexer.name.clone(),
                indexer.max_results,
            )),
            IndexerKind::Nzbindex => Arc::new(NzbindexAdapter::new(
                indexer.name.clone(),
                indexer.max_results,
            )),
            IndexerKind::Newznab { base_url, api_key } => Arc::new(NewznabAdapter::new(
                indexer.name.clone(),
                base_url.clone(),
                api_key.clone(),
                indexer.max_results,
            )),
        };
        registry.register(adapter);
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexerConfig;

    #[test]
    fn test_builtin_registry() {
        let registry = build_registry(&HiveConfig::builtin());
        assert_eq!(registry.len(), 3);
        assert!(registry.get("binsearch").is_some());
        assert!(registry.get("nzbclub").is_some());
        assert!(registry.get("nzbindex").is_some());
    }

    #[test]
    fn test_newznab_instances_keep_config_names() {
        let mut config = HiveConfig::builtin();
        config.indexers.push(IndexerConfig::new(
            "dognzb",
            IndexerKind::Newznab {
                base_url: "https://api.dognzb.example".to_string(),
                api_key: None,
            },
        ));
        config.indexers.push(IndexerConfig::new(
            "nzbs-org",
            IndexerKind::Newznab {
                base_url: "https://nzbs.example".to_string(),
                api_key: Some("key".to_string()),
            },
        ));

        let registry = build_registry(&config);
        assert_eq!(registry.len(), 5);
        assert!(registry.get("dognzb").is_some());
        assert!(registry.get("nzbs-org").is_some());
    }
}
