// src/lead/attribution.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, info};
use url::Url;

/// Storage key the landing page has always used for saved campaign tags.
pub const STORE_KEY: &str = "lead_utms";

/// Campaign tags carried on the landing URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attribution {
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
    pub utm_content: String,
    pub utm_term: String,
    pub fclid: String,
}

impl Attribution {
    pub fn from_url(url: &Url) -> Self {
        let mut out = Self::default();
        for (k, v) in url.query_pairs() {
            let slot = match k.as_ref() {
                "utm_source" => &mut out.utm_source,
                "utm_medium" => &mut out.utm_medium,
                "utm_campaign" => &mut out.utm_campaign,
                "utm_content" => &mut out.utm_content,
                "utm_term" => &mut out.utm_term,
                "fclid" => &mut out.fclid,
                _ => continue,
            };
            // first occurrence wins, like URLSearchParams.get
            if slot.is_empty() {
                *slot = v.into_owned();
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().iter().all(|(_, v)| v.is_empty())
    }

    /// Field-wise: keep ours when non-empty, otherwise take `stored`.
    pub fn or(self, stored: &Attribution) -> Self {
        fn pick(ours: String, theirs: &str) -> String {
            if ours.is_empty() {
                theirs.to_string()
            } else {
                ours
            }
        }
        Self {
            utm_source: pick(self.utm_source, &stored.utm_source),
            utm_medium: pick(self.utm_medium, &stored.utm_medium),
            utm_campaign: pick(self.utm_campaign, &stored.utm_campaign),
            utm_content: pick(self.utm_content, &stored.utm_content),
            utm_term: pick(self.utm_term, &stored.utm_term),
            fclid: pick(self.fclid, &stored.fclid),
        }
    }

    /// In the order the payment page expects them.
    pub fn pairs(&self) -> [(&'static str, &str); 6] {
        [
            ("utm_source", self.utm_source.as_str()),
            ("utm_medium", self.utm_medium.as_str()),
            ("utm_campaign", self.utm_campaign.as_str()),
            ("utm_content", self.utm_content.as_str()),
            ("utm_term", self.utm_term.as_str()),
            ("fclid", self.fclid.as_str()),
        ]
    }
}

/// First-touch attribution persisted as a small JSON file.
#[derive(Debug, Clone)]
pub struct AttributionStore {
    path: PathBuf,
}

impl AttributionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/lead_utms.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{}.json", STORE_KEY)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read tags off `page_url`, persist them if nothing was saved before,
    /// and return them with gaps filled from the saved copy.
    pub fn capture(&self, page_url: &Url) -> Result<Attribution> {
        let from_url = Attribution::from_url(page_url);

        let saved = match fs::read_to_string(&self.path) {
            Ok(s) => Some(s),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()))
            }
        };

        if saved.is_none() && !from_url.is_empty() {
            self.save(&from_url)?;
            info!(path = %self.path.display(), "saved first-touch attribution");
        }

        match saved.as_deref().map(|s| serde_json::from_str::<Attribution>(s)) {
            None => Ok(from_url),
            Some(Ok(stored)) => Ok(from_url.or(&stored)),
            Some(Err(e)) => {
                debug!(error = %e, "ignoring unreadable saved attribution");
                Ok(from_url)
            }
        }
    }

    fn save(&self, attribution: &Attribution) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;
        }
        let json = serde_json::to_string(attribution)?;
        fs::write(&self.path, json).with_context(|| format!("writing {}", self.path.display()))
    }
}
