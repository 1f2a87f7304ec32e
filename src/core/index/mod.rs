//! Search index layer.
//!
//! [`SearchIndex`] is the capability contract the ingestion orchestrator
//! and search service drive; [`TantivySearchIndex`] is the Tantivy-backed
//! implementation.

mod tantivy;

pub use self::tantivy::{create_schema, TantivySearchIndex};

use async_trait::async_trait;

use crate::core::error::Result;
use crate::core::search::query::CompiledQuery;
use crate::core::types::Document;

/// Marker wrapped around the matched term inside a fragment
pub const HIGHLIGHT_PRE: &str = "<mark>";
pub const HIGHLIGHT_POST: &str = "</mark>";

/// Marker prepended to fragments that do not start at the beginning of
/// the source text
pub const ELLIPSIS: &str = "\u{2026}";

/// A raw hit returned by the search backend, before anchor resolution
#[derive(Debug, Clone)]
pub struct IndexHit {
    pub id: String,
    pub repo: String,
    pub path: String,
    pub title: String,
    pub score: f32,
    /// Highlighted snippets from the title field
    pub title_fragments: Vec<String>,
    /// Highlighted snippets from the content field
    pub content_fragments: Vec<String>,
}

/// Hits plus the total match count
#[derive(Debug, Clone, Default)]
pub struct IndexSearchResults {
    pub hits: Vec<IndexHit>,
    pub total: usize,
}

/// Capability contract for the search backend.
///
/// Implementations own their concurrency discipline; the core drives
/// them one call at a time per operation.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Index (or re-index) a document's plain text under its ID
    async fn index(&self, doc: &Document, plain_text: &str) -> Result<()>;

    /// Remove a document by ID; removing an absent ID is not an error
    async fn remove(&self, doc_id: &str) -> Result<()>;

    /// Execute a compiled query with pagination
    async fn search(&self, query: &CompiledQuery, limit: usize, offset: usize)
        -> Result<IndexSearchResults>;

    /// List all document IDs indexed for a repository
    async fn list_by_repo(&self, repo: &str) -> Result<Vec<String>>;
}
