//! Content processor capability contract and dispatch table.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::error::{DocdexError, Result};
use crate::core::types::Heading;

use super::{ContentType, MarkdownProcessor, OpenApiProcessor};

/// Capability contract for a content format.
///
/// `to_plain_text` output is what gets indexed and later re-derived for
/// anchor resolution; implementations must be stable and reproducible
/// for the same input.
pub trait ContentProcessor: Send + Sync {
    /// Render source to HTML along with the headings present in it
    fn render_html(&self, src: &str) -> Result<(String, Vec<Heading>)>;

    /// Extract a document title; empty when the source has none
    fn extract_title(&self, src: &str) -> String;

    /// Derive the indexable plain text
    fn to_plain_text(&self, src: &str) -> String;

    /// Ordered heading list, possibly empty when the format has no
    /// heading concept
    fn extract_headings(&self, src: &str) -> Vec<Heading>;
}

/// Content type -> processor table with markdown as the mandatory
/// fallback.
///
/// Construction fails fast without a markdown entry: its absence is a
/// configuration error, not a runtime condition to tolerate.
pub struct ProcessorRegistry {
    markdown: Arc<dyn ContentProcessor>,
    processors: HashMap<ContentType, Arc<dyn ContentProcessor>>,
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("content_types", &self.processors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProcessorRegistry {
    /// Build a registry from an explicit table; errors without a
    /// markdown entry
    pub fn new(processors: HashMap<ContentType, Arc<dyn ContentProcessor>>) -> Result<Self> {
        let markdown = processors
            .get(&ContentType::Markdown)
            .cloned()
            .ok_or_else(|| {
                DocdexError::ConfigError(
                    "processor registry requires a markdown entry".to_string(),
                )
            })?;
        Ok(Self {
            markdown,
            processors,
        })
    }

    /// Registry with the built-in markdown and OpenAPI processors
    pub fn with_defaults() -> Self {
        let mut processors: HashMap<ContentType, Arc<dyn ContentProcessor>> = HashMap::new();
        let markdown: Arc<dyn ContentProcessor> = Arc::new(MarkdownProcessor);
        processors.insert(ContentType::Markdown, Arc::clone(&markdown));
        processors.insert(ContentType::OpenApi, Arc::new(OpenApiProcessor));
        Self {
            markdown,
            processors,
        }
    }

    /// Look up the processor for a content type; unregistered types
    /// resolve to the markdown entry
    pub fn get(&self, content_type: ContentType) -> &Arc<dyn ContentProcessor> {
        self.processors.get(&content_type).unwrap_or(&self.markdown)
    }
}
