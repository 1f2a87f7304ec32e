//! Docdex - Documentation Ingestion and Search Engine
//!
//! A full-text documentation search engine using BM25 via Tantivy,
//! with section-level deep links. Repositories push their docs as
//! ingest batches; searches return highlighted fragments resolved
//! back to the heading section they came from.
//!
//! # Architecture
//!
//! All logic lives under **core** (transport-agnostic):
//!
//! - config, error, types, xdg
//! - content (content-type resolution, markdown and OpenAPI processors)
//! - store (document persistence, one JSON file per document)
//! - index (Tantivy schema, query lowering, snippets)
//! - ingest (upsert/delete/sync orchestration with compensating repair)
//! - search (query compilation, execution, anchor resolution)
//! - services (unified service container)
//!
//! # Key Features
//!
//! - BM25 search via Tantivy (no vector embeddings)
//! - Multi-strategy queries (phrase, exact, prefix, fuzzy) with
//!   title-over-content weighting
//! - Store and index kept consistent through ordered writes and
//!   compensating repair, with sync reconciliation as the backstop
//! - Anchor resolution deep-links hits to the matching heading

// Core domain logic (transport-agnostic)
pub mod core;

// Re-export commonly used types for convenience
pub use core::config::Config;
pub use core::error::{DocdexError, Result};
pub use core::services::Services;
pub use core::types::*;
