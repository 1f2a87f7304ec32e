//! Query compilation.
//!
//! Turns free-text user input into a backend-neutral, weighted
//! multi-strategy query. Each term compiles to a disjunction of
//! sub-queries (exact, prefix, fuzzy, phrase, against title and
//! content); all terms are combined conjunctively, so every term must
//! match via at least one of its own variants.
//!
//! Empty or whitespace-only input compiles to a query that matches
//! nothing. This is deliberate policy, not an accidental "match all".

/// Field a sub-query targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Title,
    Content,
}

/// Matching strategy for a sub-query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Exact phrase match, token sequence in order
    Phrase,
    /// Analyzed single-term match
    Exact,
    /// Prefix match on a lower-cased term
    Prefix,
    /// Approximate match within an edit distance
    Fuzzy { distance: u8 },
}

/// One weighted sub-query
#[derive(Debug, Clone, PartialEq)]
pub struct SubQuery {
    pub field: SearchField,
    pub kind: MatchKind,
    pub text: String,
    pub boost: f32,
}

/// How a term was written in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    Word,
    Phrase,
}

/// A parsed term and the disjunction of sub-queries built for it
#[derive(Debug, Clone, PartialEq)]
pub struct TermQueries {
    pub kind: TermKind,
    pub term: String,
    pub clauses: Vec<SubQuery>,
}

/// Compiled query: a conjunction of per-term disjunctions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledQuery {
    pub terms: Vec<TermQueries>,
}

impl CompiledQuery {
    /// True when the query matches no documents at all
    pub fn matches_nothing(&self) -> bool {
        self.terms.is_empty()
    }
}

// Boost weights, title/content pairs
const PHRASE_BOOST: (f32, f32) = (10.0, 5.0);
const EXACT_BOOST: (f32, f32) = (6.0, 3.0);
const PREFIX_BOOST: (f32, f32) = (3.0, 1.5);
const FUZZY_BOOST: (f32, f32) = (1.0, 0.5);

// Fuzzy matching kicks in at 4 chars; wide terms allow 2 edits
const FUZZY_MIN_LEN: usize = 4;
const FUZZY_WIDE_LEN: usize = 7;

/// Compile free-text input into a [`CompiledQuery`]
pub fn compile(input: &str) -> CompiledQuery {
    let terms = tokenize(input)
        .into_iter()
        .map(|(kind, term)| {
            let clauses = match kind {
                TermKind::Phrase => phrase_clauses(&term),
                TermKind::Word => word_clauses(&term),
            };
            TermQueries {
                kind,
                term,
                clauses,
            }
        })
        .collect();

    CompiledQuery { terms }
}

/// Parse input left-to-right into phrase and word terms.
///
/// A double-quoted run is a phrase (verbatim, case-preserving); an
/// unterminated opening quote consumes the remainder as one phrase; an
/// empty phrase is discarded.
fn tokenize(input: &str) -> Vec<(TermKind, String)> {
    let mut terms = Vec::new();
    let mut chars = input.char_indices();

    while let Some((start, ch)) = chars.next() {
        if ch.is_whitespace() {
            continue;
        }

        if ch == '"' {
            let phrase_start = start + ch.len_utf8();
            let mut end = input.len();
            for (i, c) in chars.by_ref() {
                if c == '"' {
                    end = i;
                    break;
                }
            }
            let phrase = &input[phrase_start..end];
            if !phrase.is_empty() {
                terms.push((TermKind::Phrase, phrase.to_string()));
            }
            continue;
        }

        let mut end = input.len();
        for (i, c) in chars.by_ref() {
            if c.is_whitespace() {
                end = i;
                break;
            }
        }
        terms.push((TermKind::Word, input[start..end].to_string()));
    }

    terms
}

fn phrase_clauses(term: &str) -> Vec<SubQuery> {
    vec![
        SubQuery {
            field: SearchField::Title,
            kind: MatchKind::Phrase,
            text: term.to_string(),
            boost: PHRASE_BOOST.0,
        },
        SubQuery {
            field: SearchField::Content,
            kind: MatchKind::Phrase,
            text: term.to_string(),
            boost: PHRASE_BOOST.1,
        },
    ]
}

fn word_clauses(term: &str) -> Vec<SubQuery> {
    let lower = term.to_lowercase();
    let mut clauses = vec![
        SubQuery {
            field: SearchField::Title,
            kind: MatchKind::Exact,
            text: term.to_string(),
            boost: EXACT_BOOST.0,
        },
        SubQuery {
            field: SearchField::Content,
            kind: MatchKind::Exact,
            text: term.to_string(),
            boost: EXACT_BOOST.1,
        },
        SubQuery {
            field: SearchField::Title,
            kind: MatchKind::Prefix,
            text: lower.clone(),
            boost: PREFIX_BOOST.0,
        },
        SubQuery {
            field: SearchField::Content,
            kind: MatchKind::Prefix,
            text: lower.clone(),
            boost: PREFIX_BOOST.1,
        },
    ];

    let len = term.chars().count();
    if len >= FUZZY_MIN_LEN {
        let distance = if len >= FUZZY_WIDE_LEN { 2 } else { 1 };
        clauses.push(SubQuery {
            field: SearchField::Title,
            kind: MatchKind::Fuzzy { distance },
            text: lower.clone(),
            boost: FUZZY_BOOST.0,
        });
        clauses.push(SubQuery {
            field: SearchField::Content,
            kind: MatchKind::Fuzzy { distance },
            text: lower,
            boost: FUZZY_BOOST.1,
        });
    }

    clauses
}
