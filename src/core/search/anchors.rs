//! Anchor resolution: mapping a highlighted search fragment back to the
//! heading section it belongs to.
//!
//! All offsets are byte offsets into the document's plain text — the
//! exact text the processor produced at index time. The case-insensitive
//! fallback folds rune-by-rune; characters whose case folding changes the
//! rune count are out of scope and report no match.

use crate::core::index::{ELLIPSIS, HIGHLIGHT_POST, HIGHLIGHT_PRE};
use crate::core::types::Heading;

/// Context bytes kept in front of the marked term when locating it
const LOCATOR_CONTEXT_BYTES: usize = 120;

/// An (offset, heading ID) pair marking where a section starts in the
/// plain text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBoundary {
    pub offset: usize,
    pub heading_id: String,
}

/// Build section boundaries for a document.
///
/// Each heading's text is located by scanning forward from just past the
/// previous boundary's match. This skips body-text occurrences of
/// heading-like phrases and disambiguates duplicate heading titles by
/// document order. Headings whose text cannot be located are dropped,
/// as are headings with an empty ID or text.
pub fn build_boundaries(plain: &str, headings: &[Heading]) -> Vec<SectionBoundary> {
    let mut boundaries = Vec::with_capacity(headings.len());
    let mut cursor = 0usize;

    for heading in headings {
        if heading.id.is_empty() || heading.text.is_empty() {
            continue;
        }
        if cursor > plain.len() {
            break;
        }
        if let Some(rel) = plain[cursor..].find(&heading.text) {
            let offset = cursor + rel;
            boundaries.push(SectionBoundary {
                offset,
                heading_id: heading.id.clone(),
            });
            cursor = offset + heading.text.len();
        }
    }

    boundaries
}

/// Resolve the heading anchor for one highlighted fragment.
///
/// Returns `None` when the fragment cannot be located in the plain text
/// (resolution fails for the hit); `Some("")` when the document has no
/// usable headings or the match sits in the preamble before the first
/// one.
pub fn resolve_anchor(plain: &str, headings: &[Heading], fragment: &str) -> Option<String> {
    let boundaries = build_boundaries(plain, headings);
    if boundaries.is_empty() {
        return Some(String::new());
    }

    let cleaned = clean_fragment(fragment)?;
    let term_offset = locate_term(plain, &cleaned)?;

    let anchor = boundaries
        .iter()
        .rev()
        .find(|b| b.offset <= term_offset)
        .map(|b| b.heading_id.clone())
        .unwrap_or_default();
    Some(anchor)
}

/// A fragment with highlight markers stripped and the byte range of the
/// first marked term within the cleaned text
#[derive(Debug)]
struct CleanedFragment {
    text: String,
    term_start: usize,
    term_end: usize,
}

/// Strip highlight markers and the leading ellipsis artifact.
///
/// Returns `None` for fragments carrying no marked term.
fn clean_fragment(fragment: &str) -> Option<CleanedFragment> {
    let mut text = String::with_capacity(fragment.len());
    let mut term_start = None;
    let mut term_end = None;
    // Walk marker-by-marker, copying text between them
    let mut rest = fragment;
    loop {
        let pre = rest.find(HIGHLIGHT_PRE);
        let post = rest.find(HIGHLIGHT_POST);
        let (pos, marker) = match (pre, post) {
            (Some(a), Some(b)) if a < b => (a, HIGHLIGHT_PRE),
            (Some(a), None) => (a, HIGHLIGHT_PRE),
            (_, Some(b)) => (b, HIGHLIGHT_POST),
            (None, None) => break,
        };
        text.push_str(&rest[..pos]);
        if marker == HIGHLIGHT_PRE {
            if term_start.is_none() {
                term_start = Some(text.len());
            }
        } else if term_start.is_some() && term_end.is_none() {
            term_end = Some(text.len());
        }
        rest = &rest[pos + marker.len()..];
    }
    text.push_str(rest);

    let term_start = term_start?;
    let term_end = term_end.unwrap_or(text.len());
    if term_start >= term_end {
        return None;
    }

    let cut = leading_cut(&text, term_start);
    Some(CleanedFragment {
        text: text[cut..].to_string(),
        term_start: term_start - cut,
        term_end: term_end - cut,
    })
}

/// Bytes to drop from the front of a cleaned fragment.
///
/// A leading ellipsis marker is stripped; if the character after it is a
/// lowercase ASCII letter with no boundary in between, the fragment was
/// cut mid-word and the partial word is dropped along with trailing
/// whitespace. The cut never reaches into the marked term.
fn leading_cut(text: &str, term_start: usize) -> usize {
    let Some(after) = text.strip_prefix(ELLIPSIS) else {
        return 0;
    };
    let mut cut = ELLIPSIS.len();

    if after.starts_with(|c: char| c.is_ascii_lowercase()) {
        let partial_end = after
            .find(char::is_whitespace)
            .map(|i| {
                // also swallow the whitespace run after the partial word
                i + after[i..]
                    .chars()
                    .take_while(|c| c.is_whitespace())
                    .map(char::len_utf8)
                    .sum::<usize>()
            })
            .unwrap_or(after.len());
        cut += partial_end;
    }

    cut.min(term_start)
}

/// Locate the marked term's byte offset in the plain text.
///
/// Tries a locator of (up to the last 120 bytes of context preceding the
/// term) + (the term) verbatim, then case-insensitively, then falls back
/// to the bare term alone (verbatim, then case-insensitive).
fn locate_term(plain: &str, cleaned: &CleanedFragment) -> Option<usize> {
    let ctx_start = context_start(&cleaned.text, cleaned.term_start);
    let locator = &cleaned.text[ctx_start..cleaned.term_end];
    let term_delta = cleaned.term_start - ctx_start;

    if let Some(off) = plain.find(locator) {
        return Some(off + term_delta);
    }
    if let Some(off) = find_case_insensitive(plain, locator) {
        return Some(off + term_delta);
    }

    let term = &cleaned.text[cleaned.term_start..cleaned.term_end];
    if let Some(off) = plain.find(term) {
        return Some(off);
    }
    find_case_insensitive(plain, term)
}

/// Largest char-boundary start offset keeping at most
/// [`LOCATOR_CONTEXT_BYTES`] of context before the term
fn context_start(text: &str, term_start: usize) -> usize {
    let mut start = term_start.saturating_sub(LOCATOR_CONTEXT_BYTES);
    while !text.is_char_boundary(start) {
        start += 1;
    }
    start
}

/// Case-insensitive substring search, folding rune-by-rune.
///
/// Returns a byte offset into `haystack`. Folds that change the rune
/// count do not match.
fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    for (start, _) in haystack.char_indices() {
        let mut hay = haystack[start..].chars();
        let mut matched = true;
        for nc in needle.chars() {
            match hay.next() {
                Some(hc) if fold_eq(hc, nc) => {}
                _ => {
                    matched = false;
                    break;
                }
            }
        }
        if matched {
            return Some(start);
        }
    }
    None
}

fn fold_eq(a: char, b: char) -> bool {
    if a == b {
        return true;
    }
    let mut la = a.to_lowercase();
    let mut lb = b.to_lowercase();
    let fa = la.next();
    let fb = lb.next();
    // single-rune folds only
    fa == fb && la.next().is_none() && lb.next().is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(id: &str, text: &str) -> Heading {
        Heading {
            id: id.to_string(),
            text: text.to_string(),
            level: 2,
        }
    }

    const PLAIN: &str = "Introduction\nBody A\nSetup\nBody B";

    fn headings() -> Vec<Heading> {
        vec![
            heading("introduction", "Introduction"),
            heading("setup", "Setup"),
        ]
    }

    #[test]
    fn test_boundaries_in_order() {
        let b = build_boundaries(PLAIN, &headings());
        assert_eq!(b.len(), 2);
        assert_eq!(b[0].heading_id, "introduction");
        assert_eq!(b[0].offset, 0);
        assert_eq!(b[1].heading_id, "setup");
        assert_eq!(b[1].offset, 20);
    }

    #[test]
    fn test_boundaries_skip_unlocatable_heading() {
        let mut hs = headings();
        hs.insert(1, heading("ghost", "Not In The Text"));
        let b = build_boundaries(PLAIN, &hs);
        assert_eq!(b.len(), 2);
        assert_eq!(b[1].heading_id, "setup");
    }

    #[test]
    fn test_boundaries_drop_empty_id_or_text() {
        let hs = vec![
            heading("", "Introduction"),
            heading("setup", "Setup"),
            heading("empty", ""),
        ];
        let b = build_boundaries(PLAIN, &hs);
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].heading_id, "setup");
    }

    #[test]
    fn test_duplicate_heading_text_anchors_by_document_order() {
        let plain = "Config\nfirst part here\nConfig\nsecond part here";
        let hs = vec![heading("config", "Config"), heading("config-1", "Config")];
        let b = build_boundaries(plain, &hs);
        assert_eq!(b.len(), 2);
        assert!(b[1].offset > b[0].offset);

        let anchor = resolve_anchor(plain, &hs, "second <mark>part</mark> here");
        assert_eq!(anchor.as_deref(), Some("config-1"));
    }

    #[test]
    fn test_match_in_body_b_anchors_to_setup() {
        let anchor = resolve_anchor(PLAIN, &headings(), "Body <mark>B</mark>");
        assert_eq!(anchor.as_deref(), Some("setup"));
    }

    #[test]
    fn test_match_in_body_a_anchors_to_introduction() {
        let anchor = resolve_anchor(PLAIN, &headings(), "Body <mark>A</mark>");
        assert_eq!(anchor.as_deref(), Some("introduction"));
    }

    #[test]
    fn test_match_in_preamble_is_empty_anchor() {
        let plain = "preamble text\nIntroduction\nBody A\nSetup\nBody B";
        let anchor = resolve_anchor(plain, &headings(), "<mark>preamble</mark> text");
        assert_eq!(anchor.as_deref(), Some(""));
    }

    #[test]
    fn test_no_headings_is_noop() {
        let anchor = resolve_anchor(PLAIN, &[], "Body <mark>B</mark>");
        assert_eq!(anchor.as_deref(), Some(""));
    }

    #[test]
    fn test_unlocatable_fragment_fails() {
        let anchor = resolve_anchor(PLAIN, &headings(), "nothing <mark>matches</mark> this");
        assert_eq!(anchor, None);
    }

    #[test]
    fn test_fragment_without_marker_fails() {
        let anchor = resolve_anchor(PLAIN, &headings(), "Body B");
        assert_eq!(anchor, None);
    }

    #[test]
    fn test_leading_ellipsis_partial_word_ignored() {
        let plain = "Introduction\nThe configuration of the system lives here\nSetup\nBody B";
        let hs = headings();
        // Fragment cut mid-word: "…tion of the system" — the partial word
        // must not defeat the locator
        let anchor = resolve_anchor(plain, &hs, "…tion of the <mark>system</mark> lives");
        assert_eq!(anchor.as_deref(), Some("introduction"));
    }

    #[test]
    fn test_leading_ellipsis_on_word_boundary_kept() {
        let plain = "Introduction\nBody A\nSetup\nexact Context here";
        // "Context" is capitalized: not a mid-word cut, context survives
        let anchor = resolve_anchor(plain, &headings(), "…Context <mark>here</mark>");
        assert_eq!(anchor.as_deref(), Some("setup"));
    }

    #[test]
    fn test_case_insensitive_fallback() {
        let anchor = resolve_anchor(PLAIN, &headings(), "BODY <mark>b</mark>");
        assert_eq!(anchor.as_deref(), Some("setup"));
    }

    #[test]
    fn test_bare_term_fallback() {
        // Context is wrong but the bare marked term exists in Body A;
        // first occurrence wins
        let anchor = resolve_anchor(PLAIN, &headings(), "wrong context <mark>Body</mark>");
        assert_eq!(anchor.as_deref(), Some("introduction"));
    }

    #[test]
    fn test_find_case_insensitive_multibyte_safe() {
        assert_eq!(find_case_insensitive("über Über", "ÜBER"), Some(0));
        assert_eq!(find_case_insensitive("abc", "Z"), None);
        // ß folds to "ss" (two runes): out of scope, no match
        assert_eq!(find_case_insensitive("straße", "STRASSE"), None);
    }

    #[test]
    fn test_long_context_clamped_to_120_bytes() {
        let long_ctx = "x".repeat(200);
        let plain = format!("Introduction\nBody A\nSetup\n{long_ctx} needle end");
        let fragment = format!("{long_ctx} <mark>needle</mark>");
        let anchor = resolve_anchor(&plain, &headings(), &fragment);
        assert_eq!(anchor.as_deref(), Some("setup"));
    }
}
