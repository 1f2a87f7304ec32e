//! In-memory document store for tests and lightweight embedding.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::core::error::{DocdexError, Result};
use crate::core::types::{Document, DocumentMeta, RepoInfo};

use super::DocumentStore;

/// Volatile store backed by a `HashMap` keyed on (repo, path)
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    docs: RwLock<HashMap<(String, String), Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents, across all repos
    pub fn len(&self) -> usize {
        self.docs.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_err() -> DocdexError {
    DocdexError::store("<memory>", "store lock poisoned")
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn save(&self, doc: &Document) -> Result<()> {
        let mut docs = self.docs.write().map_err(|_| lock_err())?;
        docs.insert((doc.repo.clone(), doc.path.clone()), doc.clone());
        Ok(())
    }

    async fn get(&self, repo: &str, path: &str) -> Result<Document> {
        let docs = self.docs.read().map_err(|_| lock_err())?;
        docs.get(&(repo.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| DocdexError::DocumentNotFound(format!("{repo}/{path}")))
    }

    async fn delete(&self, repo: &str, path: &str) -> Result<()> {
        let mut docs = self.docs.write().map_err(|_| lock_err())?;
        docs.remove(&(repo.to_string(), path.to_string()));
        Ok(())
    }

    async fn list(&self, repo: &str) -> Result<Vec<DocumentMeta>> {
        let docs = self.docs.read().map_err(|_| lock_err())?;
        let mut metas: Vec<DocumentMeta> = docs
            .values()
            .filter(|d| d.repo == repo)
            .map(|d| d.meta())
            .collect();
        metas.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(metas)
    }

    async fn list_repos(&self) -> Result<Vec<RepoInfo>> {
        let docs = self.docs.read().map_err(|_| lock_err())?;
        let mut repos: HashMap<&str, RepoInfo> = HashMap::new();
        for doc in docs.values() {
            repos
                .entry(doc.repo.as_str())
                .and_modify(|info| {
                    info.documents += 1;
                    if doc.updated_at > info.updated_at {
                        info.updated_at = doc.updated_at;
                    }
                })
                .or_insert_with(|| RepoInfo {
                    name: doc.repo.clone(),
                    documents: 1,
                    updated_at: doc.updated_at,
                });
        }
        let mut out: Vec<RepoInfo> = repos.into_values().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::content::ContentType;
    use chrono::Utc;

    fn doc(repo: &str, path: &str) -> Document {
        Document {
            repo: repo.to_string(),
            path: path.to_string(),
            title: "T".to_string(),
            content: String::new(),
            commit_sha: "abc".to_string(),
            content_type: ContentType::Markdown,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_get_delete() {
        let store = MemoryDocumentStore::new();
        store.save(&doc("o/r", "a.md")).await.unwrap();
        assert_eq!(store.len(), 1);

        let fetched = store.get("o/r", "a.md").await.unwrap();
        assert_eq!(fetched.id(), "o/r/a.md");

        store.delete("o/r", "a.md").await.unwrap();
        store.delete("o/r", "a.md").await.unwrap(); // idempotent
        assert!(store.is_empty());
        assert!(store.get("o/r", "a.md").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_scoped_and_sorted() {
        let store = MemoryDocumentStore::new();
        store.save(&doc("o/r", "b.md")).await.unwrap();
        store.save(&doc("o/r", "a.md")).await.unwrap();
        store.save(&doc("x/y", "c.md")).await.unwrap();

        let metas = store.list("o/r").await.unwrap();
        let paths: Vec<&str> = metas.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["a.md", "b.md"]);

        let repos = store.list_repos().await.unwrap();
        assert_eq!(repos.len(), 2);
    }
}
