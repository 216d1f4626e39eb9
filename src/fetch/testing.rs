use anyhow::{anyhow, Result};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use url::Url;

use super::CsvSource;

#[derive(Clone, Debug)]
pub enum Reply {
    Body(String),
    Status(u16),
    Slow(Duration, String),
}

/// In-memory CSV source keyed by URL. Unknown URLs fail like a refused connection.
#[derive(Clone, Default)]
pub struct StaticSource {
    replies: HashMap<String, Reply>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, reply: Reply) -> Self {
        self.replies.insert(url.to_string(), reply);
        self
    }

    pub fn body(self, url: &str, body: &str) -> Self {
        self.with(url, Reply::Body(body.to_string()))
    }

    /// URLs fetched so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl CsvSource for StaticSource {
    async fn fetch_text(&self, url: &Url) -> Result<String> {
        self.requested.lock().unwrap().push(url.to_string());
        match self.replies.get(url.as_str()).cloned() {
            Some(Reply::Body(b)) => Ok(b),
            Some(Reply::Status(code)) => Err(anyhow!("HTTP status {} for {}", code, url)),
            Some(Reply::Slow(delay, b)) => {
                tokio::time::sleep(delay).await;
                Ok(b)
            }
            None => Err(anyhow!("connection refused: {}", url)),
        }
    }
}

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}
