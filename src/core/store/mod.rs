//! Document store layer.
//!
//! [`DocumentStore`] is the capability contract for document
//! persistence; the engine ships a filesystem implementation and an
//! in-memory one for tests and embedders.

mod fs;
mod memory;

pub use fs::FsDocumentStore;
pub use memory::MemoryDocumentStore;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::core::types::{Document, DocumentMeta, RepoInfo};

/// Capability contract for document persistence.
///
/// Implementations own their concurrency discipline. `delete` is
/// idempotent by contract: deleting a non-existent path is not an
/// error — the ingestion delete and sync paths rely on this.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or overwrite a document
    async fn save(&self, doc: &Document) -> Result<()>;

    /// Fetch a document; `DocumentNotFound` when absent
    async fn get(&self, repo: &str, path: &str) -> Result<Document>;

    /// Remove a document; succeeds when the path does not exist
    async fn delete(&self, repo: &str, path: &str) -> Result<()>;

    /// List metadata for all documents in a repository, sorted by path
    async fn list(&self, repo: &str) -> Result<Vec<DocumentMeta>>;

    /// Summaries of all repositories with stored documents
    async fn list_repos(&self) -> Result<Vec<RepoInfo>>;
}
