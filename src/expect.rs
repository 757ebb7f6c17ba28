//! Expectation parser.
//!
//! Turns a free-text expectation block into an [`ExpectationRule`]. The grammar
//! is line oriented and forgiving: each line matches at most one pattern, in
//! this order, and anything unrecognized is skipped.
//!
//! | pattern                                   | effect                              |
//! |-------------------------------------------|-------------------------------------|
//! | contains `argument` and `:`               | names after the colon are collected |
//! | starts with `takes` + a number            | sets the argument count             |
//! | contains `return`                         | text after the last `return`        |
//! | contains `no exception`/`should not raise`| forbids exceptions                  |
//! | contains `must call`                      | appends to `must_call`              |
//!
//! Keywords match case-insensitively. Leading list bullets (`-`, `*`, `•`) are ignored.

use std::collections::BTreeSet;
use std::fmt;

use crate::program::PrimitiveKind;

/// Expected category of the return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnKind {
    Primitive(PrimitiveKind),
    /// Free-text description that names no known primitive.
    Described(String),
}

impl ReturnKind {
    fn parse(text: &str) -> Self {
        match PrimitiveKind::parse(text) {
            Some(kind) => ReturnKind::Primitive(kind),
            None => ReturnKind::Described(text.to_string()),
        }
    }

    pub fn primitive(&self) -> Option<PrimitiveKind> {
        match self {
            ReturnKind::Primitive(kind) => Some(*kind),
            ReturnKind::Described(_) => None,
        }
    }
}

impl fmt::Display for ReturnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnKind::Primitive(kind) => write!(f, "{}", kind),
            ReturnKind::Described(text) => write!(f, "{}", text),
        }
    }
}

/// Structured form of an expectation block. Rebuilt on every lint pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectationRule {
    pub argument_names: BTreeSet<String>,
    pub argument_count: Option<usize>,
    pub return_kind: Option<ReturnKind>,
    pub forbids_exceptions: bool,
    /// Informational only; never verified by execution.
    pub must_call: Vec<String>,
}

impl ExpectationRule {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

const BULLETS: &[char] = &['-', '*', '•'];

/// Parse an expectation block. Never fails; unparseable text yields an empty rule.
pub fn parse(text: &str) -> ExpectationRule {
    let mut rule = ExpectationRule::default();

    for raw in text.lines() {
        let line = raw.trim().trim_start_matches(BULLETS).trim_start();
        if line.is_empty() {
            continue;
        }
        // ASCII lowering keeps byte offsets aligned with `line`, so names can be
        // sliced out of the original text with their case intact.
        let lower = line.to_ascii_lowercase();

        if lower.contains("argument") && lower.contains(':') {
            if let Some((_, names)) = line.split_once(':') {
                rule.argument_names.extend(
                    names
                        .split(|c: char| c == ',' || c.is_whitespace())
                        .filter(|s| !s.is_empty())
                        .map(str::to_string),
                );
            }
        } else if lower.starts_with("takes") {
            if let Some(n) = lower
                .split_whitespace()
                .find(|tok| tok.chars().all(|c| c.is_ascii_digit()))
                .and_then(|tok| tok.parse().ok())
            {
                rule.argument_count = Some(n);
            }
        } else if let Some(pos) = lower.rfind("return") {
            let tail = &lower[pos + "return".len()..];
            let tail = strip_plural(tail).trim_start_matches(':').trim();
            if !tail.is_empty() {
                rule.return_kind = Some(ReturnKind::parse(tail));
            }
        } else if lower.contains("no exception") || lower.contains("should not raise") {
            rule.forbids_exceptions = true;
        } else if let Some(pos) = lower.rfind("must call") {
            let target = line[pos + "must call".len()..].trim();
            if !target.is_empty() {
                rule.must_call.push(target.to_string());
            }
        }
    }

    rule
}

/// `returns int` reads the same as `return int`.
fn strip_plural(tail: &str) -> &str {
    match tail.strip_prefix('s') {
        Some(rest) if rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || c == ':') => {
            rest
        }
        _ => tail,
    }
}
