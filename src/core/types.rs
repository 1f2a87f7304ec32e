//! Core data types for the docdex engine.
//!
//! This module defines the domain structures shared across ingestion,
//! storage, indexing, and search, plus the wire shapes consumed and
//! produced at the (external) HTTP boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::content::ContentType;

/// A stored documentation file.
///
/// The document ID is always `{repo}/{path}`, recomputed via [`Document::id`]
/// and never stored as an independent field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Owning repository, e.g. `acme/widgets`
    #[serde(rename = "Repo")]
    pub repo: String,

    /// Path of the file within the repository
    #[serde(rename = "Path")]
    pub path: String,

    /// Extracted title (falls back to the path on upsert)
    #[serde(rename = "Title")]
    pub title: String,

    /// Raw source content
    #[serde(rename = "Content")]
    pub content: String,

    /// Commit the content was taken from
    #[serde(rename = "CommitSHA")]
    pub commit_sha: String,

    /// Processor the content is handled by
    #[serde(rename = "ContentType")]
    pub content_type: ContentType,

    /// Last upsert time
    #[serde(rename = "UpdatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Document ID: `{repo}/{path}`
    pub fn id(&self) -> String {
        format!("{}/{}", self.repo, self.path)
    }

    /// Metadata view without the body content
    pub fn meta(&self) -> DocumentMeta {
        DocumentMeta {
            repo: self.repo.clone(),
            path: self.path.clone(),
            title: self.title.clone(),
            commit_sha: self.commit_sha.clone(),
            content_type: self.content_type,
            updated_at: self.updated_at,
        }
    }
}

/// Document metadata without body content, used for listings and
/// sync comparisons
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    #[serde(rename = "Repo")]
    pub repo: String,
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "CommitSHA")]
    pub commit_sha: String,
    #[serde(rename = "ContentType")]
    pub content_type: ContentType,
    #[serde(rename = "UpdatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl DocumentMeta {
    /// Document ID: `{repo}/{path}`
    pub fn id(&self) -> String {
        format!("{}/{}", self.repo, self.path)
    }
}

/// Repository summary returned by store listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoInfo {
    #[serde(rename = "Name")]
    pub name: String,

    /// Number of stored documents
    #[serde(rename = "Documents")]
    pub documents: usize,

    /// Most recent document update
    #[serde(rename = "UpdatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Per-document action within an ingest batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestAction {
    #[default]
    Upsert,
    Delete,
    /// Any unrecognized action value; skipped with a warning, never an error
    #[serde(other)]
    Unknown,
}

/// A single file within an ingest batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestDocument {
    #[serde(rename = "Path")]
    pub path: String,

    #[serde(rename = "Content", default)]
    pub content: String,

    #[serde(rename = "Action", default)]
    pub action: IngestAction,

    /// Optional explicit content type; empty means "resolve from the content"
    #[serde(rename = "ContentType", default)]
    pub content_type: Option<String>,
}

/// Ingest batch for one repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    #[serde(rename = "Repo")]
    pub repo: String,

    #[serde(rename = "CommitSHA", default)]
    pub commit_sha: String,

    #[serde(rename = "Documents", default)]
    pub documents: Vec<IngestDocument>,

    /// When true, treat the batch as the authoritative document set for the
    /// repo: stored paths not re-supplied as upserts are removed, and
    /// orphaned index entries are cleaned up
    #[serde(rename = "Sync", default)]
    pub sync: bool,
}

/// Aggregate counts returned from an ingest batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResponse {
    #[serde(rename = "Indexed")]
    pub indexed: usize,

    #[serde(rename = "Deleted")]
    pub deleted: usize,
}

/// A heading within a document, in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Slugged anchor ID, unique within the document
    #[serde(rename = "ID")]
    pub id: String,

    /// Heading text as rendered
    #[serde(rename = "Text")]
    pub text: String,

    /// Heading level (1-6)
    #[serde(rename = "Level")]
    pub level: u32,
}

/// Search pagination options
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SearchOpts {
    /// Maximum hits to return; values <= 0 coerce to the configured default
    #[serde(rename = "Limit", default)]
    pub limit: i64,

    #[serde(rename = "Offset", default)]
    pub offset: usize,
}

impl Default for SearchOpts {
    fn default() -> Self {
        Self {
            limit: 0,
            offset: 0,
        }
    }
}

impl SearchOpts {
    /// Coerce the wire limit into a usable page size
    pub fn effective_limit(&self, default: usize, max: usize) -> usize {
        if self.limit <= 0 {
            default
        } else {
            (self.limit as usize).min(max)
        }
    }
}

/// A single search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Repo")]
    pub repo: String,
    #[serde(rename = "Path")]
    pub path: String,
    #[serde(rename = "Title")]
    pub title: String,

    /// Highlighted snippets from the title field
    #[serde(rename = "TitleFragments")]
    pub title_fragments: Vec<String>,

    /// Highlighted snippets from the content field
    #[serde(rename = "ContentFragments")]
    pub content_fragments: Vec<String>,

    #[serde(rename = "Score")]
    pub score: f32,

    /// Heading ID the hit deep-links to; empty links to the page top
    #[serde(rename = "Anchor")]
    pub anchor: String,
}

/// Full search response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    #[serde(rename = "Hits")]
    pub hits: Vec<SearchResult>,

    /// Total matching documents (not just the returned page)
    #[serde(rename = "Total")]
    pub total: usize,

    /// Search duration in milliseconds
    #[serde(rename = "Duration")]
    pub duration_ms: u64,
}
