//! Unified service container for docdex
//!
//! Provides shared access to all core services.

use crate::core::config::Config;
use crate::core::content::ProcessorRegistry;
use crate::core::error::Result;
use crate::core::index::{SearchIndex, TantivySearchIndex};
use crate::core::ingest::IngestService;
use crate::core::search::SearchService;
use crate::core::store::{DocumentStore, FsDocumentStore};
use std::sync::Arc;

/// Unified services container
///
/// All embedders use this same struct for service access.
#[derive(Clone)]
pub struct Services {
    /// Document persistence
    pub store: Arc<dyn DocumentStore>,

    /// Search index backend
    pub index: Arc<dyn SearchIndex>,

    /// Content processors keyed by content type
    pub registry: Arc<ProcessorRegistry>,

    /// Ingestion orchestrator
    pub ingest: Arc<IngestService>,

    /// Search service
    pub search: Arc<SearchService>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl Services {
    /// Create services from configuration, opening (or creating) the
    /// index and document store on disk
    pub fn new(config: Config) -> Result<Self> {
        config.log_config();

        let store: Arc<dyn DocumentStore> =
            Arc::new(FsDocumentStore::new(config.storage.data_dir.clone()));
        let index: Arc<dyn SearchIndex> =
            Arc::new(TantivySearchIndex::open_or_create(&config.storage.index_dir)?);
        let registry = Arc::new(ProcessorRegistry::with_defaults());

        let ingest = Arc::new(IngestService::new(
            Arc::clone(&store),
            Arc::clone(&index),
            Arc::clone(&registry),
        ));

        let search = Arc::new(SearchService::new(
            Arc::clone(&index),
            Arc::clone(&store),
            Arc::clone(&registry),
            config.search.default_limit,
            config.search.max_limit,
            config.search.max_query_length,
        ));

        Ok(Self {
            store,
            index,
            registry,
            ingest,
            search,
            config: Arc::new(config),
        })
    }
}
