//! Filesystem document store.
//!
//! One JSON file per document:
//!
//! ```text
//! {root}/repos/
//! ├── {org}/{repo}/
//! │   ├── docs/guide.md.json
//! │   └── api/openapi.yaml.json
//! ```
//!
//! Repo and path components are validated against traversal before any
//! filesystem access.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::core::error::{DocdexError, Result};
use crate::core::types::{Document, DocumentMeta, RepoInfo};

use super::DocumentStore;

/// Filesystem-backed document store
#[derive(Debug)]
pub struct FsDocumentStore {
    root: PathBuf,
}

impl FsDocumentStore {
    /// Create a store rooted at the given directory
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn repos_dir(&self) -> PathBuf {
        self.root.join("repos")
    }

    fn repo_dir(&self, repo: &str) -> Result<PathBuf> {
        validate_component(repo)?;
        Ok(self.repos_dir().join(repo))
    }

    fn doc_file(&self, repo: &str, path: &str) -> Result<PathBuf> {
        validate_component(path)?;
        Ok(self.repo_dir(repo)?.join(format!("{path}.json")))
    }
}

/// Reject empty, absolute, and traversal-bearing repo/path values
fn validate_component(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(DocdexError::InvalidPath("empty path".to_string()));
    }
    let path = Path::new(value);
    let safe = path
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !safe {
        return Err(DocdexError::InvalidPath(value.to_string()));
    }
    Ok(())
}

fn read_document(file: &Path) -> Result<Document> {
    let contents = fs::read_to_string(file)?;
    Ok(serde_json::from_str(&contents)?)
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn save(&self, doc: &Document) -> Result<()> {
        let file = self.doc_file(&doc.repo, &doc.path)?;
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(doc)?;
        fs::write(&file, contents)?;
        Ok(())
    }

    async fn get(&self, repo: &str, path: &str) -> Result<Document> {
        let file = self.doc_file(repo, path)?;
        if !file.exists() {
            return Err(DocdexError::DocumentNotFound(format!("{repo}/{path}")));
        }
        read_document(&file)
    }

    async fn delete(&self, repo: &str, path: &str) -> Result<()> {
        let file = self.doc_file(repo, path)?;
        match fs::remove_file(&file) {
            Ok(()) => Ok(()),
            // idempotent by contract
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, repo: &str) -> Result<Vec<DocumentMeta>> {
        let dir = self.repo_dir(repo)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut metas = Vec::new();
        for entry in WalkDir::new(&dir).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let doc = read_document(entry.path())?;
            metas.push(doc.meta());
        }

        metas.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(metas)
    }

    async fn list_repos(&self) -> Result<Vec<RepoInfo>> {
        let dir = self.repos_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut repos: HashMap<String, RepoInfo> = HashMap::new();
        for entry in WalkDir::new(&dir).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let doc = read_document(entry.path())?;
            repos
                .entry(doc.repo.clone())
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
