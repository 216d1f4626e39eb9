// src/fetch/mod.rs

use anyhow::{Context, Result};
use reqwest::{header, Client};
use std::future::Future;
use tracing::debug;
use url::Url;

pub mod resolver;
pub mod urls;

#[cfg(test)]
pub(crate) mod testing;

pub use resolver::{Resolved, SourceResolver};
pub use urls::PublishedSheet;

/// Something that hands back the body of a CSV export.
pub trait CsvSource: Send + Sync {
    fn fetch_text(&self, url: &Url) -> impl Future<Output = Result<String>> + Send;
}

/// Plain HTTP GET with caching disabled.
#[derive(Clone, Debug, Default)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl CsvSource for HttpSource {
    async fn fetch_text(&self, url: &Url) -> Result<String> {
        debug!("Fetching CSV from {}", url);
        self.client
            .get(url.clone())
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::PRAGMA, "no-cache")
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", url))?
            .text()
            .await
            .with_context(|| format!("Reading text from {}", url))
    }
}
