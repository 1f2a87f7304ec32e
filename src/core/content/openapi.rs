//! OpenAPI (v2/v3) content processor.
//!
//! Specs arrive as JSON or YAML; both parse into a `serde_json::Value`
//! and are walked from there. Map iteration order is sorted, so plain
//! text and headings are reproducible across runs.

use serde_json::Value;

use crate::core::error::Result;
use crate::core::types::Heading;

use super::markdown::Slugger;
use super::registry::ContentProcessor;

const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// OpenAPI processor for API reference documents
#[derive(Debug, Default)]
pub struct OpenApiProcessor;

fn parse(src: &str) -> Option<Value> {
    if src.trim_start().starts_with('{') {
        serde_json::from_str(src).ok()
    } else {
        serde_yaml::from_str(src).ok()
    }
}

fn info_str(value: &Value, key: &str) -> String {
    value
        .get("info")
        .and_then(|i| i.get(key))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn path_headings(value: &Value) -> Vec<Heading> {
    let mut slugger = Slugger::new();
    let mut headings = Vec::new();
    if let Some(paths) = value.get("paths").and_then(|p| p.as_object()) {
        for path in paths.keys() {
            headings.push(Heading {
                id: slugger.slug(path),
                text: path.clone(),
                level: 2,
            });
        }
    }
    headings
}

impl ContentProcessor for OpenApiProcessor {
    fn render_html(&self, src: &str) -> Result<(String, Vec<Heading>)> {
        let Some(value) = parse(src) else {
            return Ok((String::new(), Vec::new()));
        };

        let headings = path_headings(&value);
        let mut out = String::new();
        let title = info_str(&value, "title");
        if !title.is_empty() {
            out.push_str(&format!("<h1>{}</h1>\n", escape(&title)));
        }
        let description = info_str(&value, "description");
        if !description.is_empty() {
            out.push_str(&format!("<p>{}</p>\n", escape(&description)));
        }

        if let Some(paths) = value.get("paths").and_then(|p| p.as_object()) {
            for (heading, (path, item)) in headings.iter().zip(paths.iter()) {
                out.push_str(&format!(
                    "<h2 id=\"{}\"><code>{}</code></h2>\n",
                    heading.id,
                    escape(path)
                ));
                if let Some(ops) = item.as_object() {
                    for method in HTTP_METHODS {
                        let Some(op) = ops.get(method) else { continue };
                        let summary = op
                            .get("summary")
                            .and_then(|s| s.as_str())
                            .unwrap_or_default();
                        out.push_str(&format!(
                            "<p><strong>{}</strong> {}</p>\n",
                            method.to_uppercase(),
                            escape(summary)
                        ));
                    }
                }
            }
        }

        Ok((out, headings))
    }

    fn extract_title(&self, src: &str) -> String {
        parse(src).map(|v| info_str(&v, "title")).unwrap_or_default()
    }

    fn to_plain_text(&self, src: &str) -> String {
        let Some(value) = parse(src) else {
            return String::new();
        };

        let mut out = String::new();
        let mut push_line = |s: &str| {
            if !s.is_empty() {
                out.push_str(s);
                out.push('\n');
            }
        };

        push_line(&info_str(&value, "title"));
        push_line(&info_str(&value, "description"));

        if let Some(paths) = value.get("paths").and_then(|p| p.as_object()) {
            for (path, item) in paths {
                push_line(path);
                let Some(ops) = item.as_object() else { continue };
                for method in HTTP_METHODS {
                    let Some(op) = ops.get(method) else { continue };
                    for key in ["summary", "description", "operationId"] {
                        if let Some(text) = op.get(key).and_then(|v| v.as_str()) {
                            push_line(text);
                        }
                    }
                }
            }
        }

        out
    }

    fn extract_headings(&self, src: &str) -> Vec<Heading> {
        parse(src).map(|v| path_headings(&v)).unwrap_or_default()
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
