// src/fetch/resolver.rs

use std::{fmt, time::Duration};
use tokio::time::timeout;
use tracing::{debug, instrument};
use url::Url;

use super::CsvSource;
use crate::sheet::{parse_csv, ColumnKind, ColumnMap, RawTable};

pub const DEFAULT_PER_URL_TIMEOUT: Duration = Duration::from_secs(10);

/// The first candidate that produced a usable table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub url: Url,
    pub table: RawTable,
    pub columns: ColumnMap,
}

/// Why a candidate URL was passed over. None of these are fatal.
#[derive(Debug)]
enum Skip {
    Fetch(anyhow::Error),
    TimedOut(Duration),
    TooFewRows(usize),
    NoKnownColumns,
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Skip::Fetch(e) => write!(f, "fetch failed: {:#}", e),
            Skip::TimedOut(d) => write!(f, "no response within {:?}", d),
            Skip::TooFewRows(n) => write!(f, "only {} row(s)", n),
            Skip::NoKnownColumns => f.write_str("header matches no known column"),
        }
    }
}

/// Walks candidate export URLs strictly in order and returns the first table
/// whose header resolves at least one of the wanted columns.
pub struct SourceResolver<S> {
    source: S,
    urls: Vec<Url>,
    kinds: Vec<ColumnKind>,
    per_url_timeout: Duration,
}

impl<S: CsvSource> SourceResolver<S> {
    pub fn new(source: S, urls: Vec<Url>, kinds: &[ColumnKind]) -> Self {
        Self {
            source,
            urls,
            kinds: kinds.to_vec(),
            per_url_timeout: DEFAULT_PER_URL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, per_url_timeout: Duration) -> Self {
        self.per_url_timeout = per_url_timeout;
        self
    }

    /// `None` once every candidate has been tried without success.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve(&self) -> Option<Resolved> {
        for url in &self.urls {
            match self.try_candidate(url).await {
                Ok(resolved) => {
                    debug!(%url, rows = resolved.table.len(), "candidate accepted");
                    return Some(resolved);
                }
                Err(skip) => debug!(%url, reason = %skip, "candidate skipped"),
            }
        }
        debug!(tried = self.urls.len(), "no candidate produced a usable table");
        None
    }

    async fn try_candidate(&self, url: &Url) -> Result<Resolved, Skip> {
        let body = match timeout(self.per_url_timeout, self.source.fetch_text(url)).await {
            Err(_) => return Err(Skip::TimedOut(self.per_url_timeout)),
            Ok(Err(e)) => return Err(Skip::Fetch(e)),
            Ok(Ok(body)) => body,
        };

        let table = parse_csv(&body);
        if table.len() < 2 {
            return Err(Skip::TooFewRows(table.len()));
        }

        let columns = ColumnMap::from_headers(table.header().unwrap_or(&[]), &self.kinds);
        if columns.is_empty() {
            return Err(Skip::NoKnownColumns);
        }

        Ok(Resolved {
            url: url.clone(),
            table,
            columns,
        })
    }
}
