//! Per-line classification and dialect scoring.
//!
//! Each dialect encodes nesting differently. The simple dialect indents with
//! plain whitespace; the verbose dialect prefixes every field with a `|-`
//! marker whose column carries the level. Both are classified here so the
//! dialect parsers can branch on a [`LineKind`] without rescanning text.

use crate::dialect::Dialect;
use crate::error::ConnectivityFailure;

/// Vendor phrases meaning the server could not be queried, lowercase.
///
/// Checked in order; the first hit decides the reason.
const CONNECTIVITY_MARKERS: &[(&str, ConnectivityFailure)] = &[
    (
        "failed to resolve the server host",
        ConnectivityFailure::HostUnresolved,
    ),
    ("error[3]", ConnectivityFailure::HostUnresolved),
    ("error[5]", ConnectivityFailure::TimedOut),
    (
        "license server machine is down or not responding",
        ConnectivityFailure::Unreachable,
    ),
    ("cannot connect", ConnectivityFailure::Unreachable),
    ("unable to connect", ConnectivityFailure::Unreachable),
];

/// Verbose-dialect field marker.
const FIELD_MARKER: &str = "|-";

/// Role of a single dump line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Simple dialect `Users of <code>: ...` line.
    ProductHeader,
    /// Simple dialect checkout line nested under a product.
    UserDetail,
    /// Verbose dialect `Feature Information` header.
    FeatureBoundary,
    /// Verbose dialect `License Information` header.
    LicenseBoundary,
    /// Verbose dialect field. Section headers without a colon have no value.
    KeyValue { key: String, value: Option<String> },
    /// Anything the dialect does not care about.
    Noise,
    /// The line reports that the server could not be reached.
    Error(ConnectivityFailure),
}

/// A line's indentation level and role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub level: usize,
    pub kind: LineKind,
}

impl ClassifiedLine {
    fn new(level: usize, kind: LineKind) -> Self {
        Self { level, kind }
    }
}

/// Returns the connectivity failure reported by `line`, if any.
pub fn connectivity_failure(line: &str) -> Option<ConnectivityFailure> {
    let lower = line.to_ascii_lowercase();
    CONNECTIVITY_MARKERS
        .iter()
        .find(|(marker, _)| lower.contains(marker))
        .map(|(_, reason)| *reason)
}

/// Classifies `line` under the given dialect's conventions.
pub fn classify_line(dialect: Dialect, line: &str) -> ClassifiedLine {
    match dialect {
        Dialect::Simple => classify_simple(line),
        Dialect::Verbose => classify_verbose(line),
    }
}

/// Classifies a simple-dialect line. Level is leading whitespace / 2.
fn classify_simple(line: &str) -> ClassifiedLine {
    let level = whitespace_level(line);
    if let Some(reason) = connectivity_failure(line) {
        return ClassifiedLine::new(level, LineKind::Error(reason));
    }

    let kind = match level {
        0 if line.contains("Users of") => LineKind::ProductHeader,
        2 if !line.trim().is_empty() => LineKind::UserDetail,
        _ => LineKind::Noise,
    };
    ClassifiedLine::new(level, kind)
}

/// Classifies a verbose-dialect line. Level is (marker column - 1) / 2.
fn classify_verbose(line: &str) -> ClassifiedLine {
    let marker = line.find(FIELD_MARKER);
    let level = marker.map_or(0, marker_level);
    if let Some(reason) = connectivity_failure(line) {
        return ClassifiedLine::new(level, LineKind::Error(reason));
    }
    if marker.is_none() {
        return ClassifiedLine::new(level, LineKind::Noise);
    }

    let (key, value) = split_field(line);
    let kind = match (key.as_str(), &value) {
        ("Feature Information", None) => LineKind::FeatureBoundary,
        ("License Information", None) => LineKind::LicenseBoundary,
        _ => LineKind::KeyValue { key, value },
    };
    ClassifiedLine::new(level, kind)
}

fn whitespace_level(line: &str) -> usize {
    line.chars().take_while(|ch| ch.is_whitespace()).count() / 2
}

fn marker_level(column: usize) -> usize {
    column.saturating_sub(1) / 2
}

/// Splits `|- Key : "value"` into a trimmed key and an unquoted value.
fn split_field(line: &str) -> (String, Option<String>) {
    let (raw_key, raw_value) = match line.split_once(':') {
        Some((key, value)) => (key, Some(value)),
        None => (line, None),
    };

    let key = raw_key.replace("|- ", "").replace(FIELD_MARKER, "");
    let value = raw_value.map(|value| value.replace('"', "").trim().to_string());
    (key.trim().to_string(), value)
}

/// Weighted likelihood that a dump was produced by a given dialect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DialectScore {
    pub dialect: Dialect,
    pub score: f64,
}

/// Scores `text` against both dialects, highest first.
pub fn score_dialects(text: &str) -> Vec<DialectScore> {
    let mut simple = 0.0;
    let mut verbose = 0.0;

    if text.contains("Users of ") {
        simple += 0.5;
    }
    if text.contains("licenses issued") || text.contains("license issued") {
        simple += 0.3;
    }
    if text.contains("License server status:") || text.contains("lmstat") {
        simple += 0.2;
    }

    let marker_lines = text
        .lines()
        .filter(|line| line.trim_start().starts_with(FIELD_MARKER))
        .count();
    if marker_lines > 0 {
        verbose += 0.4;
    }
    if text.contains("Feature Information") {
        verbose += 0.4;
    }
    if text.contains("Maximum concurrent user(s)") {
        verbose += 0.2;
    }

    let mut scores = vec![
        DialectScore {
            dialect: Dialect::Simple,
            score: simple,
        },
        DialectScore {
            dialect: Dialect::Verbose,
            score: verbose,
        },
    ];
    scores.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scores
}

/// Picks the most likely dialect for `text`, or `None` when nothing in it
/// looks like either dialect.
pub fn detect_dialect(text: &str) -> Option<Dialect> {
    score_dialects(text)
        .first()
        .filter(|score| score.score > 0.0)
        .map(|score| score.dialect)
}
