//! Content classification and processing.
//!
//! This module classifies raw documentation content and dispatches it
//! to a content processor:
//!
//! - **ContentType**: closed enumeration of supported formats
//! - **resolve_content_type**: path/extension gate + content sniffing
//! - **ProcessorRegistry**: content type -> processor table with markdown
//!   as the mandatory fallback
//! - **MarkdownProcessor** / **OpenApiProcessor**: format implementations

mod markdown;
mod openapi;
mod registry;

pub use markdown::MarkdownProcessor;
pub use openapi::OpenApiProcessor;
pub use registry::{ContentProcessor, ProcessorRegistry};

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Supported content formats.
///
/// The persisted value on a document always matches a registered
/// processor; unknown inputs normalize to [`ContentType::Markdown`]
/// before a document is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Markdown,
    OpenApi,
}

impl ContentType {
    /// Parse a content type string; `None` for empty or unknown values
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "markdown" => Some(ContentType::Markdown),
            "openapi" => Some(ContentType::OpenApi),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Markdown => "markdown",
            ContentType::OpenApi => "openapi",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify raw content by path extension plus content sniffing.
///
/// Files whose extension is not `.yaml`/`.yml`/`.json` are markdown.
/// YAML/JSON files are parsed and checked for a top-level `openapi` or
/// `swagger` key; anything else returns `None` — arbitrary config files
/// must not be indexed as prose, so the caller skips them.
pub fn resolve_content_type(path: &str, content: &str) -> Option<ContentType> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let is_json = match ext.as_deref() {
        Some("json") => true,
        Some("yaml") | Some("yml") => false,
        _ => return Some(ContentType::Markdown),
    };

    let value: serde_json::Value = if is_json || content.trim_start().starts_with('{') {
        serde_json::from_str(content).ok()?
    } else {
        serde_yaml::from_str(content).ok()?
    };

    let map = value.as_object()?;
    if map.contains_key("openapi") || map.contains_key("swagger") {
        Some(ContentType::OpenApi)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_config_extension_is_markdown() {
        assert_eq!(
            resolve_content_type("docs/guide.md", "# Hi"),
            Some(ContentType::Markdown)
        );
        assert_eq!(
            resolve_content_type("README", "plain text"),
            Some(ContentType::Markdown)
        );
        assert_eq!(
            resolve_content_type("notes.TXT", "notes"),
            Some(ContentType::Markdown)
        );
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        assert_eq!(
            resolve_content_type("api.YAML", "openapi: 3.0.0\ninfo:\n  title: T"),
            Some(ContentType::OpenApi)
        );
    }

    #[test]
    fn test_openapi_json() {
        let src = r#"{"openapi": "3.0.0", "info": {"title": "Petstore"}}"#;
        assert_eq!(
            resolve_content_type("api.json", src),
            Some(ContentType::OpenApi)
        );
    }

    #[test]
    fn test_swagger_yaml() {
        let src = "swagger: \"2.0\"\ninfo:\n  title: Legacy\n";
        assert_eq!(
            resolve_content_type("api.yaml", src),
            Some(ContentType::OpenApi)
        );
    }

    #[test]
    fn test_json_content_in_yaml_file() {
        // A .yml file that actually holds JSON still sniffs correctly
        let src = r#"{"swagger": "2.0"}"#;
        assert_eq!(
            resolve_content_type("api.yml", src),
            Some(ContentType::OpenApi)
        );
    }

    #[test]
    fn test_plain_config_yaml_is_skipped() {
        let src = "log_level: debug\nport: 8080\n";
        assert_eq!(resolve_content_type("config.yaml", src), None);
    }

    #[test]
    fn test_parse_failure_is_skipped() {
        assert_eq!(resolve_content_type("broken.json", "{not json"), None);
    }

    #[test]
    fn test_non_mapping_yaml_is_skipped() {
        assert_eq!(resolve_content_type("list.yaml", "- a\n- b\n"), None);
    }

    #[test]
    fn test_content_type_parse_roundtrip() {
        assert_eq!(ContentType::parse("markdown"), Some(ContentType::Markdown));
        assert_eq!(ContentType::parse("openapi"), Some(ContentType::OpenApi));
        assert_eq!(ContentType::parse(""), None);
        assert_eq!(ContentType::parse("asciidoc"), None);
    }
}
