//! Ingestion orchestration.
//!
//! Drives upsert/delete/sync batches against the document store and the
//! search index, keeping the two consistent:
//!
//! - upserts write the store first, then the index; any failure aborts
//!   the batch immediately
//! - deletes remove from the index first, then the store, with a
//!   best-effort compensating re-index when the store delete fails
//! - sync reconciliation removes stored paths not re-supplied as
//!   upserts, then cleans up orphaned index entries
//!
//! Already-committed writes are never rolled back on failure or
//! cancellation; re-running an identical batch converges to the same
//! end state.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::core::content::{resolve_content_type, ContentType, ProcessorRegistry};
use crate::core::error::{DocdexError, Result};
use crate::core::index::SearchIndex;
use crate::core::store::DocumentStore;
use crate::core::types::{Document, IngestAction, IngestDocument, IngestRequest, IngestResponse};

/// Outcome of the compensating re-index attempted after a failed
/// store delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompensationOutcome {
    /// Document was re-fetched and re-indexed; it stays searchable
    Reindexed,
    /// Compensation itself failed; logged, never propagated
    Failed,
}

/// Outcome of the two-step delete state machine:
/// remove-from-index -> delete-from-store -> (on failure) re-index.
///
/// Structured so callers and tests can assert on the primary error and
/// the compensation result independently.
#[derive(Debug)]
pub enum DeleteOutcome {
    Removed,
    /// Index removal failed; the store was never touched
    IndexRemoveFailed(DocdexError),
    /// Store delete failed after index removal; the original error is
    /// what the caller sees regardless of compensation
    StoreDeleteFailed {
        error: DocdexError,
        compensation: CompensationOutcome,
    },
}

impl DeleteOutcome {
    /// Collapse into a `Result`, surfacing the primary error
    pub fn into_result(self) -> Result<()> {
        match self {
            DeleteOutcome::Removed => Ok(()),
            DeleteOutcome::IndexRemoveFailed(e) => Err(e),
            DeleteOutcome::StoreDeleteFailed { error, .. } => Err(error),
        }
    }
}

/// Ingestion orchestrator.
///
/// Holds no mutable state of its own; concurrency discipline belongs to
/// the injected store and index.
pub struct IngestService {
    store: Arc<dyn DocumentStore>,
    index: Arc<dyn SearchIndex>,
    registry: Arc<ProcessorRegistry>,
}

impl IngestService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        index: Arc<dyn SearchIndex>,
        registry: Arc<ProcessorRegistry>,
    ) -> Self {
        Self {
            store,
            index,
            registry,
        }
    }

    /// Process an ingest batch for one repository.
    ///
    /// Aborts on the first per-document failure; counts are aggregates
    /// across explicit actions and sync reconciliation.
    pub async fn ingest_documents(&self, request: &IngestRequest) -> Result<IngestResponse> {
        let mut indexed = 0usize;
        let mut deleted = 0usize;

        for doc in &request.documents {
            match doc.action {
                IngestAction::Upsert => {
                    if self.upsert(request, doc).await? {
                        indexed += 1;
                    }
                }
                IngestAction::Delete => {
                    self.delete_document(&request.repo, &doc.path)
                        .await
                        .into_result()?;
                    deleted += 1;
                }
                IngestAction::Unknown => {
                    tracing::warn!(
                        repo = %request.repo,
                        path = %doc.path,
                        "unknown ingest action, skipping document"
                    );
                }
            }
        }

        if request.sync {
            deleted = self.reconcile(request, deleted).await?;
        }

        tracing::info!(
            repo = %request.repo,
            indexed,
            deleted,
            sync = request.sync,
            "ingest batch complete"
        );

        Ok(IngestResponse { indexed, deleted })
    }

    /// Upsert one document; `Ok(false)` when the file is skipped as
    /// non-documentation
    async fn upsert(&self, request: &IngestRequest, doc: &IngestDocument) -> Result<bool> {
        let content_type = match doc.content_type.as_deref() {
            // present but unknown values normalize to markdown; the
            // persisted type must always match a registered processor
            Some(s) if !s.is_empty() => {
                Some(ContentType::parse(s).unwrap_or(ContentType::Markdown))
            }
            _ => resolve_content_type(&doc.path, &doc.content),
        };
        let Some(content_type) = content_type else {
            tracing::warn!(
                repo = %request.repo,
                path = %doc.path,
                "not documentation, skipping file"
            );
            return Ok(false);
        };

        let processor = self.registry.get(content_type);
        let mut title = processor.extract_title(&doc.content);
        if title.is_empty() {
            title = doc.path.clone();
        }

        let document = Document {
            repo: request.repo.clone(),
            path: doc.path.clone(),
            title,
            content: doc.content.clone(),
            commit_sha: request.commit_sha.clone(),
            content_type,
            updated_at: Utc::now(),
        };

        self.store
            .save(&document)
            .await
            .map_err(|e| wrap_store(&doc.path, e))?;

        let plain_text = processor.to_plain_text(&document.content);
        self.index
            .index(&document, &plain_text)
            .await
            .map_err(|e| wrap_index(&doc.path, e))?;

        tracing::debug!(id = %document.id(), "document upserted");
        Ok(true)
    }

    /// Two-step delete with compensating repair.
    ///
    /// Index first: if the subsequent store delete fails, the document
    /// is merely un-searchable-but-still-stored, a state sync can
    /// repair later. The reverse order could leave a document gone from
    /// the store while still surfacing in search.
    pub async fn delete_document(&self, repo: &str, path: &str) -> DeleteOutcome {
        let doc_id = format!("{repo}/{path}");

        if let Err(e) = self.index.remove(&doc_id).await {
            return DeleteOutcome::IndexRemoveFailed(wrap_index(path, e));
        }

        if let Err(e) = self.store.delete(repo, path).await {
            let compensation = self.compensate_reindex(repo, path).await;
            return DeleteOutcome::StoreDeleteFailed {
                error: wrap_store(path, e),
                compensation,
            };
        }

        DeleteOutcome::Removed
    }

    /// Best-effort re-index after a failed store delete; errors are
    /// logged and swallowed
    async fn compensate_reindex(&self, repo: &str, path: &str) -> CompensationOutcome {
        let document = match self.store.get(repo, path).await {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(
                    repo, path, error = %e,
                    "compensating re-index could not re-fetch document"
                );
                return CompensationOutcome::Failed;
            }
        };

        let processor = self.registry.get(document.content_type);
        let plain_text = processor.to_plain_text(&document.content);
        match self.index.index(&document, &plain_text).await {
            Ok(()) => CompensationOutcome::Reindexed,
            Err(e) => {
                tracing::warn!(
                    repo, path, error = %e,
                    "compensating re-index failed"
                );
                CompensationOutcome::Failed
            }
        }
    }

    /// Sync reconciliation: the batch is the authoritative document set
    /// for the repo.
    ///
    /// Stage 1 removes stored paths not re-supplied as upserts (explicit
    /// deletes are already handled and intentionally excluded — sync
    /// never undeletes). Stage 2 removes orphaned index entries left by
    /// prior partial failures, touching only the index.
    ///
    /// Takes and returns the running deletion count so the first error
    /// preserves the count accumulated so far.
    async fn reconcile(&self, request: &IngestRequest, mut deleted: usize) -> Result<usize> {
        let upserted: HashSet<&str> = request
            .documents
            .iter()
            .filter(|d| d.action == IngestAction::Upsert)
            .map(|d| d.path.as_str())
            .collect();

        let metas = self
            .store
            .list(&request.repo)
            .await
            .map_err(|e| DocdexError::sync(deleted, e))?;
        for meta in metas {
            if upserted.contains(meta.path.as_str()) {
                continue;
            }
            tracing::debug!(id = %meta.id(), "sync: removing stale document");
            match self.delete_document(&request.repo, &meta.path).await.into_result() {
                Ok(()) => deleted += 1,
                Err(e) => return Err(DocdexError::sync(deleted, e)),
            }
        }

        let ids = self
            .index
            .list_by_repo(&request.repo)
            .await
            .map_err(|e| DocdexError::sync(deleted, e))?;
        let id_prefix = format!("{}/", request.repo);
        for id in ids {
            let Some(path) = id.strip_prefix(&id_prefix) else {
                continue;
            };
            if upserted.contains(path) {
                continue;
            }
            // orphan: index entry with no stored counterpart; removed
            // from the index only
            tracing::debug!(id = %id, "sync: removing orphaned index entry");
            self.index
                .remove(&id)
                .await
                .map_err(|e| DocdexError::sync(deleted, e))?;
            deleted += 1;
        }

        Ok(deleted)
    }
}

fn wrap_store(path: &str, e: DocdexError) -> DocdexError {
    match e {
        DocdexError::StoreFailure { .. } | DocdexError::InvalidPath(_) => e,
        other => DocdexError::store(path, other.to_string()),
    }
}

fn wrap_index(path: &str, e: DocdexError) -> DocdexError {
    match e {
        DocdexError::IndexFailure { .. } => e,
        other => DocdexError::index(path, other.to_string()),
    }
}
