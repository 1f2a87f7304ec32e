//! Core domain logic (transport-agnostic)
//!
//! This module contains all business logic that is independent
//! of whatever surface embeds the engine (HTTP, CLI, etc).
//!
//! # Architecture
//!
//! - **config**: Configuration loading (TOML + environment)
//! - **error**: Error types and Result alias
//! - **types**: Domain data structures
//! - **xdg**: XDG directory handling
//! - **content**: Content-type resolution and processors
//! - **store**: Document persistence
//! - **index**: Tantivy search backend
//! - **ingest**: Ingestion orchestration (upsert/delete/sync)
//! - **search**: Query compilation and anchor resolution
//! - **services**: Unified service container

pub mod config;
pub mod content;
pub mod error;
pub mod index;
pub mod ingest;
pub mod search;
pub mod services;
pub mod store;
pub mod types;
pub mod xdg;

// Re-export key types for convenience
pub use config::Config;
pub use error::{DocdexError, Result};
pub use services::Services;
