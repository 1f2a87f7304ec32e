//! Search layer: query compilation, execution, and anchor resolution.

pub mod anchors;
pub mod query;

use std::sync::Arc;
use std::time::Instant;

use crate::core::content::ProcessorRegistry;
use crate::core::error::{DocdexError, Result};
use crate::core::index::{IndexHit, SearchIndex};
use crate::core::store::DocumentStore;
use crate::core::types::{SearchOpts, SearchResult, SearchResults};

/// Search orchestrator.
///
/// Compiles the input, runs it against the backend, then resolves a
/// heading anchor for each content hit. Anchor resolution is
/// best-effort: any failure leaves the hit's anchor empty and the hit is
/// still returned.
pub struct SearchService {
    index: Arc<dyn SearchIndex>,
    store: Arc<dyn DocumentStore>,
    registry: Arc<ProcessorRegistry>,
    default_limit: usize,
    max_limit: usize,
    max_query_length: usize,
}

impl SearchService {
    pub fn new(
        index: Arc<dyn SearchIndex>,
        store: Arc<dyn DocumentStore>,
        registry: Arc<ProcessorRegistry>,
        default_limit: usize,
        max_limit: usize,
        max_query_length: usize,
    ) -> Self {
        Self {
            index,
            store,
            registry,
            default_limit,
            max_limit,
            max_query_length,
        }
    }

    /// Execute a free-text search; rejects queries over the configured
    /// length limit
    pub async fn search(&self, input: &str, opts: SearchOpts) -> Result<SearchResults> {
        let started = Instant::now();

        // length counted in characters, matching the wire's UTF-8 text
        if input.chars().count() > self.max_query_length {
            return Err(DocdexError::InvalidQuery(format!(
                "query exceeds {} characters",
                self.max_query_length
            )));
        }

        let compiled = query::compile(input);
        let limit = opts.effective_limit(self.default_limit, self.max_limit);
        let raw = self.index.search(&compiled, limit, opts.offset).await?;
        let total = raw.total;

        let mut hits = Vec::with_capacity(raw.hits.len());
        for hit in raw.hits {
            let anchor = self.resolve_hit_anchor(&hit).await;
            hits.push(SearchResult {
                id: hit.id,
                repo: hit.repo,
                path: hit.path,
                title: hit.title,
                title_fragments: hit.title_fragments,
                content_fragments: hit.content_fragments,
                score: hit.score,
                anchor,
            });
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(
            query = %input,
            total,
            returned = hits.len(),
            duration_ms,
            "search complete"
        );

        Ok(SearchResults {
            hits,
            total,
            duration_ms,
        })
    }

    /// Resolve the anchor for one hit; empty on any failure.
    ///
    /// Title-only hits (no content fragments) link to the page top.
    async fn resolve_hit_anchor(&self, hit: &IndexHit) -> String {
        let Some(fragment) = hit.content_fragments.first() else {
            return String::new();
        };

        let document = match self.store.get(&hit.repo, &hit.path).await {
            Ok(d) => d,
            Err(e) => {
                tracing::debug!(id = %hit.id, error = %e, "anchor resolution: document fetch failed");
                return String::new();
            }
        };

        let processor = self.registry.get(document.content_type);
        let headings = processor.extract_headings(&document.content);
        let plain = processor.to_plain_text(&document.content);

        match anchors::resolve_anchor(&plain, &headings, fragment) {
            Some(anchor) => anchor,
            None => {
                tracing::debug!(id = %hit.id, "anchor resolution: fragment not located");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::content::ContentType;
    use crate::core::index::TantivySearchIndex;
    use crate::core::store::{DocumentStore, MemoryDocumentStore};
    use crate::core::types::Document;
    use chrono::Utc;

    fn doc(path: &str, content: &str) -> Document {
        Document {
            repo: "o/r".to_string(),
            path: path.to_string(),
            title: "T".to_string(),
            content: content.to_string(),
            commit_sha: "abc".to_string(),
            content_type: ContentType::Markdown,
            updated_at: Utc::now(),
        }
    }

    async fn service_with(docs: Vec<Document>) -> SearchService {
        let store = Arc::new(MemoryDocumentStore::new());
        let index = Arc::new(TantivySearchIndex::in_memory().unwrap());
        let registry = Arc::new(ProcessorRegistry::with_defaults());

        for d in docs {
            let processor = registry.get(d.content_type);
            let plain = processor.to_plain_text(&d.content);
            let mut stored = d.clone();
            stored.title = processor.extract_title(&d.content);
            if stored.title.is_empty() {
                stored.title = stored.path.clone();
            }
            store.save(&stored).await.unwrap();
            index.index(&stored, &plain).await.unwrap();
        }

        SearchService::new(index, store, registry, 10, 100, 500)
    }

    #[tokio::test]
    async fn test_search_resolves_anchor_to_section() {
        let svc = service_with(vec![doc(
            "guide.md",
            "# Guide\n\nintro text\n\n## Setup\n\nInstall the binary first.\n\n## Usage\n\nRun it.",
        )])
        .await;

        let results = svc.search("install", SearchOpts::default()).await.unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(results.hits[0].anchor, "setup");
        assert_eq!(results.hits[0].id, "o/r/guide.md");
    }

    #[tokio::test]
    async fn test_search_preamble_hit_links_to_page_top() {
        let svc = service_with(vec![doc(
            "guide.md",
            "Preamble mentions quartz here.\n\n# Guide\n\n## Setup\n\nbody",
        )])
        .await;

        let results = svc.search("quartz", SearchOpts::default()).await.unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(results.hits[0].anchor, "");
    }

    #[tokio::test]
    async fn test_search_over_length_query_rejected() {
        let svc = service_with(vec![doc("guide.md", "# Guide\n\nbody")]).await;

        let long_input = "a".repeat(501);
        let err = svc
            .search(&long_input, SearchOpts::default())
            .await
            .unwrap_err();
        assert!(err.is_bad_request());
        assert!(err.to_string().contains("500"));

        // exactly at the limit still executes
        let at_limit = "a".repeat(500);
        assert!(svc.search(&at_limit, SearchOpts::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_search_empty_input_matches_nothing() {
        let svc = service_with(vec![doc("guide.md", "# Guide\n\nbody")]).await;

        let results = svc.search("   ", SearchOpts::default()).await.unwrap();
        assert_eq!(results.total, 0);
        assert!(results.hits.is_empty());
    }

    #[tokio::test]
    async fn test_search_missing_stored_doc_degrades_to_empty_anchor() {
        let svc = service_with(vec![doc(
            "guide.md",
            "# Guide\n\n## Setup\n\nInstall the binary first.",
        )])
        .await;

        // simulate drift: the index knows the doc, the store lost it
        svc.store.delete("o/r", "guide.md").await.unwrap();

        let results = svc.search("install", SearchOpts::default()).await.unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(results.hits[0].anchor, "");
    }

    #[tokio::test]
    async fn test_search_limit_coerced() {
        let mut docs = Vec::new();
        for i in 0..15 {
            docs.push(doc(
                &format!("d{i}.md"),
                &format!("# Doc {i}\n\ncommon marker text"),
            ));
        }
        let svc = service_with(docs).await;

        // limit 0 coerces to the default of 10
        let results = svc
            .search("marker", SearchOpts { limit: 0, offset: 0 })
            .await
            .unwrap();
        assert_eq!(results.total, 15);
        assert_eq!(results.hits.len(), 10);

        // oversized limit caps at the max
        let results = svc
            .search("marker", SearchOpts { limit: 1000, offset: 0 })
            .await
            .unwrap();
        assert_eq!(results.hits.len(), 15);
    }
}
