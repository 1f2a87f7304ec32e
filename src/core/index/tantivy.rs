//! Tantivy-backed search index.
//!
//! Wraps Tantivy for indexing document plain text and executing
//! compiled queries, including snippet generation with highlight
//! markers.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use tantivy::collector::{Count, DocSetCollector, TopDocs};
use tantivy::query::{
    BooleanQuery, BoostQuery, EmptyQuery, FuzzyTermQuery, PhraseQuery, Query, TermQuery,
};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value, STORED, STRING, TEXT};
use tantivy::snippet::SnippetGenerator;
use tantivy::{doc, Index, IndexWriter, TantivyDocument, Term};

use crate::core::error::{DocdexError, Result};
use crate::core::search::query::{CompiledQuery, MatchKind, SearchField, SubQuery};
use crate::core::types::Document;

use super::{IndexHit, IndexSearchResults, SearchIndex, ELLIPSIS, HIGHLIGHT_POST, HIGHLIGHT_PRE};

const WRITER_HEAP_BYTES: usize = 50_000_000;
const TITLE_FRAGMENT_CHARS: usize = 100;
const CONTENT_FRAGMENT_CHARS: usize = 150;

/// Create the Tantivy schema for document indexing
///
/// Fields:
/// - id: document ID `{repo}/{path}` (STRING | STORED)
/// - repo: owning repository (STRING | STORED)
/// - path: file path within the repo (STRING | STORED)
/// - title: extracted title (TEXT | STORED)
/// - content: processor plain text (TEXT | STORED)
/// - updated_at: timestamp (Date | STORED)
pub fn create_schema() -> Schema {
    let mut builder = Schema::builder();

    builder.add_text_field("id", STRING | STORED);
    builder.add_text_field("repo", STRING | STORED);
    builder.add_text_field("path", STRING | STORED);

    builder.add_text_field("title", TEXT | STORED);
    builder.add_text_field("content", TEXT | STORED);

    builder.add_date_field("updated_at", STORED);

    builder.build()
}

#[derive(Debug, Clone, Copy)]
struct DocFields {
    id: Field,
    repo: Field,
    path: Field,
    title: Field,
    content: Field,
    updated_at: Field,
}

impl DocFields {
    fn resolve(schema: &Schema) -> Result<Self> {
        let get = |name: &str| {
            schema
                .get_field(name)
                .map_err(|e| DocdexError::SearchFailed(format!("Missing {name} field: {e}")))
        };
        Ok(Self {
            id: get("id")?,
            repo: get("repo")?,
            path: get("path")?,
            title: get("title")?,
            content: get("content")?,
            updated_at: get("updated_at")?,
        })
    }
}

/// Tantivy search index wrapper
pub struct TantivySearchIndex {
    index: Index,
    fields: DocFields,
    writer: Mutex<IndexWriter>,
}

impl std::fmt::Debug for TantivySearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TantivySearchIndex").finish()
    }
}

impl TantivySearchIndex {
    /// Create a new index at the given path
    pub fn create(index_dir: &Path) -> Result<Self> {
        let schema = create_schema();
        std::fs::create_dir_all(index_dir)?;

        let index = Index::create_in_dir(index_dir, schema)
            .map_err(|e| DocdexError::SearchFailed(format!("Failed to create index: {e}")))?;
        Self::wrap(index)
    }

    /// Open an existing index
    pub fn open(index_dir: &Path) -> Result<Self> {
        let index = Index::open_in_dir(index_dir)
            .map_err(|e| DocdexError::SearchFailed(format!("Failed to open index: {e}")))?;
        Self::wrap(index)
    }

    /// Open the index at the path, creating it when absent
    pub fn open_or_create(index_dir: &Path) -> Result<Self> {
        if index_dir.join("meta.json").exists() {
            Self::open(index_dir)
        } else {
            Self::create(index_dir)
        }
    }

    /// Volatile in-RAM index, used by tests and embedders
    pub fn in_memory() -> Result<Self> {
        Self::wrap(Index::create_in_ram(create_schema()))
    }

    fn wrap(index: Index) -> Result<Self> {
        let fields = DocFields::resolve(&index.schema())?;
        let writer = index
            .writer(WRITER_HEAP_BYTES)
            .map_err(|e| DocdexError::SearchFailed(format!("Failed to create writer: {e}")))?;
        Ok(Self {
            index,
            fields,
            writer: Mutex::new(writer),
        })
    }

    fn lower_query(&self, compiled: &CompiledQuery) -> Box<dyn Query> {
        if compiled.matches_nothing() {
            // deliberate match-nothing policy for empty input
            return Box::new(EmptyQuery);
        }

        let per_term: Vec<Box<dyn Query>> = compiled
            .terms
            .iter()
            .map(|term| {
                let clauses: Vec<Box<dyn Query>> = term
                    .clauses
                    .iter()
                    .filter_map(|clause| self.lower_clause(clause))
                    .collect();
                Box::new(BooleanQuery::union(clauses)) as Box<dyn Query>
            })
            .collect();

        Box::new(BooleanQuery::intersection(per_term))
    }

    fn lower_clause(&self, clause: &SubQuery) -> Option<Box<dyn Query>> {
        let field = match clause.field {
            SearchField::Title => self.fields.title,
            SearchField::Content => self.fields.content,
        };

        let inner: Box<dyn Query> = match clause.kind {
            MatchKind::Phrase | MatchKind::Exact => {
                let mut terms: Vec<Term> = analyzer_tokens(&clause.text)
                    .into_iter()
                    .map(|tok| Term::from_field_text(field, &tok))
                    .collect();
                match terms.len() {
                    0 => return None,
                    1 => Box::new(TermQuery::new(
                        terms.pop()?,
                        IndexRecordOption::WithFreqsAndPositions,
                    )),
                    _ => Box::new(PhraseQuery::new(terms)),
                }
            }
            MatchKind::Prefix => {
                let tok = analyzer_tokens(&clause.text).into_iter().next()?;
                Box::new(FuzzyTermQuery::new_prefix(
                    Term::from_field_text(field, &tok),
                    0,
                    true,
                ))
            }
            MatchKind::Fuzzy { distance } => {
                let tok = analyzer_tokens(&clause.text).into_iter().next()?;
                Box::new(FuzzyTermQuery::new(
                    Term::from_field_text(field, &tok),
                    distance,
                    true,
                ))
            }
        };

        Some(Box::new(BoostQuery::new(inner, clause.boost)))
    }
}

/// Tokenize the way the default analyzer does: split on
/// non-alphanumeric, lowercase
fn analyzer_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

fn extract_text(doc: &TantivyDocument, field: Field) -> String {
    doc.get_first(field)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

/// Render a snippet as a marked-up fragment.
///
/// Highlighted ranges are wrapped in the highlight markers; fragments
/// that do not start at the beginning of the source get a leading
/// ellipsis marker.
fn snippet_fragment(snippet: &tantivy::snippet::Snippet, source: &str) -> Option<String> {
    let fragment = snippet.fragment();
    if fragment.is_empty() || snippet.highlighted().is_empty() {
        return None;
    }

    let mut out = String::with_capacity(fragment.len() + 32);
    if !source.starts_with(fragment) {
        out.push_str(ELLIPSIS);
    }

    let mut cursor = 0usize;
    for range in snippet.highlighted() {
        if range.start < cursor || range.end > fragment.len() {
            continue;
        }
        out.push_str(&fragment[cursor..range.start]);
        out.push_str(HIGHLIGHT_PRE);
        out.push_str(&fragment[range.start..range.end]);
        out.push_str(HIGHLIGHT_POST);
        cursor = range.end;
    }
    out.push_str(&fragment[cursor..]);

    Some(out)
}

#[async_trait]
impl SearchIndex for TantivySearchIndex {
    async fn index(&self, doc: &Document, plain_text: &str) -> Result<()> {
        let id = doc.id();
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| DocdexError::index(&doc.path, "index writer lock poisoned"))?;

        // upsert: drop any previous generation of this document first
        writer.delete_term(Term::from_field_text(self.fields.id, &id));

        writer
            .add_document(doc!(
                self.fields.id => id.as_str(),
                self.fields.repo => doc.repo.as_str(),
                self.fields.path => doc.path.as_str(),
                self.fields.title => doc.title.as_str(),
                self.fields.content => plain_text,
                self.fields.updated_at => tantivy::DateTime::from_timestamp_secs(
                    doc.updated_at.timestamp()
                ),
            ))
            .map_err(|e| DocdexError::index(&doc.path, format!("Failed to add document: {e}")))?;

        writer
            .commit()
            .map_err(|e| DocdexError::index(&doc.path, format!("Failed to commit: {e}")))?;
        Ok(())
    }

    async fn remove(&self, doc_id: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| DocdexError::index(doc_id, "index writer lock poisoned"))?;

        writer.delete_term(Term::from_field_text(self.fields.id, doc_id));
        writer
            .commit()
            .map_err(|e| DocdexError::index(doc_id, format!("Failed to commit: {e}")))?;
        Ok(())
    }

    async fn search(
        &self,
        query: &CompiledQuery,
        limit: usize,
        offset: usize,
    ) -> Result<IndexSearchResults> {
        let reader = self
            .index
            .reader()
            .map_err(|e| DocdexError::SearchFailed(format!("Failed to create reader: {e}")))?;
        let searcher = reader.searcher();

        let lowered = self.lower_query(query);
        let collector = (TopDocs::with_limit(limit.max(1)).and_offset(offset), Count);
        let (top_docs, total) = searcher
            .search(&lowered, &collector)
            .map_err(|e| DocdexError::SearchFailed(format!("Search failed: {e}")))?;

        let mut title_gen = SnippetGenerator::create(&searcher, &*lowered, self.fields.title)
            .map_err(|e| DocdexError::SearchFailed(format!("Snippet setup failed: {e}")))?;
        title_gen.set_max_num_chars(TITLE_FRAGMENT_CHARS);
        let mut content_gen = SnippetGenerator::create(&searcher, &*lowered, self.fields.content)
            .map_err(|e| DocdexError::SearchFailed(format!("Snippet setup failed: {e}")))?;
        content_gen.set_max_num_chars(CONTENT_FRAGMENT_CHARS);

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| DocdexError::SearchFailed(format!("Failed to retrieve document: {e}")))?;

            let title = extract_text(&doc, self.fields.title);
            let content = extract_text(&doc, self.fields.content);

            let title_fragments = snippet_fragment(&title_gen.snippet_from_doc(&doc), &title)
                .into_iter()
                .collect();
            let content_fragments = snippet_fragment(&content_gen.snippet_from_doc(&doc), &content)
                .into_iter()
                .collect();

            hits.push(IndexHit {
                id: extract_text(&doc, self.fields.id),
                repo: extract_text(&doc, self.fields.repo),
                path: extract_text(&doc, self.fields.path),
                title,
                score,
                title_fragments,
                content_fragments,
            });
        }

        Ok(IndexSearchResults { hits, total })
    }

    async fn list_by_repo(&self, repo: &str) -> Result<Vec<String>> {
        let reader = self
            .index
            .reader()
            .map_err(|e| DocdexError::SearchFailed(format!("Failed to create reader: {e}")))?;
        let searcher = reader.searcher();

        let query = TermQuery::new(
            Term::from_field_text(self.fields.repo, repo),
            IndexRecordOption::Basic,
        );
        let addresses = searcher
            .search(&query, &DocSetCollector)
            .map_err(|e| DocdexError::SearchFailed(format!("Search failed: {e}")))?;

        let mut ids = Vec::with_capacity(addresses.len());
        for address in addresses {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| DocdexError::SearchFailed(format!("Failed to retrieve document: {e}")))?;
            ids.push(extract_text(&doc, self.fields.id));
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::content::ContentType;
    use crate::core::search::query::compile;
    use chrono::Utc;
    use tempfile::tempdir;

    fn test_doc(repo: &str, path: &str, title: &str) -> Document {
        Document {
            repo: repo.to_string(),
            path: path.to_string(),
            title: title.to_string(),
            content: String::new(),
            commit_sha: "abc123".to_string(),
            content_type: ContentType::Markdown,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_schema_has_all_fields() {
        let schema = create_schema();
        for name in ["id", "repo", "path", "title", "content", "updated_at"] {
            assert!(schema.get_field(name).is_ok(), "missing field {name}");
        }
    }

    #[test]
    fn test_create_and_open_index() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("index");

        let index = TantivySearchIndex::create(&dir).unwrap();
        drop(index);

        assert!(TantivySearchIndex::open(&dir).is_ok());
        assert!(TantivySearchIndex::open_or_create(&dir).is_ok());
    }

    #[tokio::test]
    async fn test_index_and_search_basic() {
        let index = TantivySearchIndex::in_memory().unwrap();
        index
            .index(
                &test_doc("o/r", "a.md", "Deployment Guide"),
                "How to deploy the service to production.\n",
            )
            .await
            .unwrap();

        let results = index.search(&compile("deploy"), 10, 0).await.unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(results.hits[0].id, "o/r/a.md");
        assert_eq!(results.hits[0].title, "Deployment Guide");
        assert!(results.hits[0].score > 0.0);
    }

    #[tokio::test]
    async fn test_reindex_replaces_previous_generation() {
        let index = TantivySearchIndex::in_memory().unwrap();
        let doc = test_doc("o/r", "a.md", "First");
        index.index(&doc, "alpha content\n").await.unwrap();
        index.index(&doc, "bravo content\n").await.unwrap();

        let results = index.search(&compile("alpha"), 10, 0).await.unwrap();
        assert_eq!(results.total, 0);
        let results = index.search(&compile("bravo"), 10, 0).await.unwrap();
        assert_eq!(results.total, 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let index = TantivySearchIndex::in_memory().unwrap();
        index
            .index(&test_doc("o/r", "a.md", "T"), "some text\n")
            .await
            .unwrap();

        index.remove("o/r/a.md").await.unwrap();
        index.remove("o/r/a.md").await.unwrap(); // absent: still ok

        let results = index.search(&compile("text"), 10, 0).await.unwrap();
        assert_eq!(results.total, 0);
    }

    #[tokio::test]
    async fn test_list_by_repo_scopes_to_repo() {
        let index = TantivySearchIndex::in_memory().unwrap();
        index
            .index(&test_doc("o/r", "a.md", "A"), "alpha\n")
            .await
            .unwrap();
        index
            .index(&test_doc("o/r", "b.md", "B"), "bravo\n")
            .await
            .unwrap();
        index
            .index(&test_doc("other/repo", "c.md", "C"), "charlie\n")
            .await
            .unwrap();

        let ids = index.list_by_repo("o/r").await.unwrap();
        assert_eq!(ids, vec!["o/r/a.md".to_string(), "o/r/b.md".to_string()]);
    }

    #[tokio::test]
    async fn test_match_nothing_query_returns_empty() {
        let index = TantivySearchIndex::in_memory().unwrap();
        index
            .index(&test_doc("o/r", "a.md", "T"), "anything at all\n")
            .await
            .unwrap();

        let results = index.search(&compile("   "), 10, 0).await.unwrap();
        assert_eq!(results.total, 0);
        assert!(results.hits.is_empty());
    }

    #[tokio::test]
    async fn test_conjunction_requires_all_terms() {
        let index = TantivySearchIndex::in_memory().unwrap();
        index
            .index(&test_doc("o/r", "a.md", "T"), "alpha bravo\n")
            .await
            .unwrap();
        index
            .index(&test_doc("o/r", "b.md", "T"), "alpha only\n")
            .await
            .unwrap();

        let results = index.search(&compile("alpha bravo"), 10, 0).await.unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(results.hits[0].id, "o/r/a.md");
    }

    #[tokio::test]
    async fn test_phrase_requires_adjacency() {
        let index = TantivySearchIndex::in_memory().unwrap();
        index
            .index(&test_doc("o/r", "a.md", "T"), "getting started today\n")
            .await
            .unwrap();
        index
            .index(&test_doc("o/r", "b.md", "T"), "started getting nowhere\n")
            .await
            .unwrap();

        let results = index
            .search(&compile("\"getting started\""), 10, 0)
            .await
            .unwrap();
        assert_eq!(results.total, 1);
        assert_eq!(results.hits[0].id, "o/r/a.md");
    }

    #[tokio::test]
    async fn test_fuzzy_matches_typo() {
        let index = TantivySearchIndex::in_memory().unwrap();
        index
            .index(&test_doc("o/r", "a.md", "T"), "kubernetes deployment\n")
            .await
            .unwrap();

        // one edit away, term length >= 7 allows distance 2
        let results = index.search(&compile("kubernets"), 10, 0).await.unwrap();
        assert_eq!(results.total, 1);
    }

    #[tokio::test]
    async fn test_prefix_matches() {
        let index = TantivySearchIndex::in_memory().unwrap();
        index
            .index(&test_doc("o/r", "a.md", "T"), "configuration reference\n")
            .await
            .unwrap();

        let results = index.search(&compile("conf"), 10, 0).await.unwrap();
        assert_eq!(results.total, 1);
    }

    #[tokio::test]
    async fn test_content_fragment_has_highlight_marker() {
        let index = TantivySearchIndex::in_memory().unwrap();
        index
            .index(
                &test_doc("o/r", "a.md", "Guide"),
                "Long introduction line.\nThe needle sits in this sentence.\n",
            )
            .await
            .unwrap();

        let results = index.search(&compile("needle"), 10, 0).await.unwrap();
        let hit = &results.hits[0];
        assert_eq!(hit.content_fragments.len(), 1);
        let fragment = &hit.content_fragments[0];
        assert!(fragment.contains(&format!("{HIGHLIGHT_PRE}needle{HIGHLIGHT_POST}")));
    }

    #[tokio::test]
    async fn test_title_boost_outranks_content_match() {
        let index = TantivySearchIndex::in_memory().unwrap();
        index
            .index(
                &test_doc("o/r", "title-hit.md", "Authentication"),
                "something unrelated\n",
            )
            .await
            .unwrap();
        index
            .index(
                &test_doc("o/r", "content-hit.md", "Other"),
                "authentication mentioned in passing\n",
            )
            .await
            .unwrap();

        let results = index.search(&compile("authentication"), 10, 0).await.unwrap();
        assert_eq!(results.total, 2);
        assert_eq!(results.hits[0].path, "title-hit.md");
    }

    #[tokio::test]
    async fn test_pagination_offset() {
        let index = TantivySearchIndex::in_memory().unwrap();
        for i in 0..5 {
            index
                .index(
                    &test_doc("o/r", &format!("doc{i}.md"), "T"),
                    "common token\n",
                )
                .await
                .unwrap();
        }

        let page1 = index.search(&compile("common"), 2, 0).await.unwrap();
        let page2 = index.search(&compile("common"), 2, 2).await.unwrap();
        assert_eq!(page1.total, 5);
        assert_eq!(page1.hits.len(), 2);
        assert_eq!(page2.hits.len(), 2);
        assert_ne!(page1.hits[0].id, page2.hits[0].id);
    }

    #[test]
    fn test_analyzer_tokens() {
        assert_eq!(analyzer_tokens("Getting-Started"), vec!["getting", "started"]);
        assert_eq!(analyzer_tokens("API"), vec!["api"]);
        assert!(analyzer_tokens("$$$").is_empty());
    }
}
