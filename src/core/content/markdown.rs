//! Markdown content processor.
//!
//! Built on pulldown-cmark event streams. Plain text extraction is
//! deterministic: the exact same text is produced at index time and
//! again at anchor-resolution time, so byte offsets computed against
//! it stay valid.

use std::collections::HashMap;

use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};

use crate::core::error::Result;
use crate::core::types::Heading;

use super::registry::ContentProcessor;

/// Markdown processor; the universal fallback format
#[derive(Debug, Default)]
pub struct MarkdownProcessor;

fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH
}

/// Generates GitHub-style heading slugs, unique within one document.
///
/// Duplicate heading text gets `-1`, `-2`, ... suffixes in document order.
pub(crate) struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    pub(crate) fn new() -> Self {
        Self {
            seen: HashMap::new(),
        }
    }

    pub(crate) fn slug(&mut self, text: &str) -> String {
        let base = slugify(text);
        let count = self.seen.entry(base.clone()).or_insert(0);
        let slug = if *count == 0 {
            base.clone()
        } else {
            format!("{base}-{count}")
        };
        *count += 1;
        slug
    }
}

fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            out.push(if ch == '_' { '_' } else { '-' });
        }
        // other punctuation is dropped
    }
    out
}

/// Collect headings in document order with slugged IDs
fn collect_headings(src: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut slugger = Slugger::new();
    let mut current: Option<(u32, String)> = None;

    for event in Parser::new_ext(src, parser_options()) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some((level as u32, String::new()));
            }
            Event::Text(t) | Event::Code(t) => {
                if let Some((_, buf)) = current.as_mut() {
                    buf.push_str(&t);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text)) = current.take() {
                    let id = slugger.slug(&text);
                    headings.push(Heading { id, text, level });
                }
            }
            _ => {}
        }
    }

    headings
}

impl ContentProcessor for MarkdownProcessor {
    fn render_html(&self, src: &str) -> Result<(String, Vec<Heading>)> {
        let headings = collect_headings(src);
        let mut next = 0usize;

        // Second pass: swap heading open/close tags for versions carrying
        // the slugged id attribute
        let events = Parser::new_ext(src, parser_options()).map(|event| match event {
            Event::Start(Tag::Heading { level, .. }) => {
                let id = headings
                    .get(next)
                    .map(|h| h.id.as_str())
                    .unwrap_or_default();
                next += 1;
                Event::Html(format!("<h{} id=\"{}\">", level as u32, id).into())
            }
            Event::End(TagEnd::Heading(level)) => {
                Event::Html(format!("</h{}>\n", level as u32).into())
            }
            other => other,
        });

        let mut out = String::with_capacity(src.len() * 2);
        html::push_html(&mut out, events);
        Ok((out, headings))
    }

    fn extract_title(&self, src: &str) -> String {
        collect_headings(src)
            .into_iter()
            .find(|h| h.level == 1)
            .map(|h| h.text)
            .unwrap_or_default()
    }

    fn to_plain_text(&self, src: &str) -> String {
        let mut out = String::with_capacity(src.len());
        for event in Parser::new_ext(src, parser_options()) {
            match event {
                Event::Text(t) => out.push_str(&t),
                Event::Code(t) => out.push_str(&t),
                Event::SoftBreak | Event::HardBreak => out.push('\n'),
                Event::End(
                    TagEnd::Paragraph
                    | TagEnd::Heading(_)
                    | TagEnd::Item
                    | TagEnd::CodeBlock
                    | TagEnd::TableRow,
                ) => {
                    if !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
                Event::End(TagEnd::TableCell) => out.push(' '),
                _ => {}
            }
        }
        out
    }

    fn extract_headings(&self, src: &str) -> Vec<Heading> {
        collect_headings(src)
    }
}
