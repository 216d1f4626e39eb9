// src/sheet/columns.rs

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Semantic columns we know how to find in a sheet header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnKind {
    Date,
    Time,
    GroupLink,
}

/// Header synonyms per kind. A header matches when any synonym occurs in it,
/// ignoring case. Add a kind here and `locate` picks it up.
pub static SYNONYMS: &[(ColumnKind, &[&str])] = &[
    (ColumnKind::Date, &["date", "dates", "day", "schedule"]),
    (ColumnKind::Time, &["time", "timing", "hours"]),
    (ColumnKind::GroupLink, &["whatsapp"]),
];

static MATCHERS: Lazy<Vec<(ColumnKind, Regex)>> = Lazy::new(|| {
    SYNONYMS
        .iter()
        .map(|(kind, words)| {
            let alternation = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            let re = Regex::new(&format!("(?i)({})", alternation))
                .expect("synonym table should compile to a regex");
            (*kind, re)
        })
        .collect()
});

fn matcher(kind: ColumnKind) -> Option<&'static Regex> {
    MATCHERS.iter().find(|(k, _)| *k == kind).map(|(_, re)| re)
}

/// Index of the first header (left to right) matching `kind`.
pub fn locate(headers: &[String], kind: ColumnKind) -> Option<usize> {
    let re = matcher(kind)?;
    headers
        .iter()
        .position(|h| re.is_match(&h.trim().to_lowercase()))
}

/// Resolved column indices for one header row. Kinds that did not match are absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnMap {
    indices: BTreeMap<ColumnKind, usize>,
}

impl ColumnMap {
    /// Resolve every kind in `kinds` against `headers`.
    pub fn from_headers(headers: &[String], kinds: &[ColumnKind]) -> Self {
        let indices = kinds
            .iter()
            .filter_map(|&kind| locate(headers, kind).map(|idx| (kind, idx)))
            .collect();
        Self { indices }
    }

    /// The schedule pair: date and time.
    pub fn schedule(headers: &[String]) -> Self {
        Self::from_headers(headers, &[ColumnKind::Date, ColumnKind::Time])
    }

    pub fn get(&self, kind: ColumnKind) -> Option<usize> {
        self.indices.get(&kind).copied()
    }

    pub fn date(&self) -> Option<usize> {
        self.get(ColumnKind::Date)
    }

    pub fn time(&self) -> Option<usize> {
        self.get(ColumnKind::Time)
    }

    /// True when no requested column was found.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Cell for `kind` in `row`, or "" when the column is unresolved or the row is short.
    pub fn cell<'a>(&self, row: &'a [String], kind: ColumnKind) -> &'a str {
        self.get(kind)
            .and_then(|idx| row.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }
}
