// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};
use url::Url;

use crate::fetch::PublishedSheet;

/// Env var naming a YAML config file.
pub const CONFIG_ENV: &str = "FEED_CONFIG";
/// Looked for in the working directory when `FEED_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "workshop_feed.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FeedConfig {
    pub sheet: SheetConfig,
    pub fetch: FetchConfig,
    pub lead: LeadConfig,
    pub pixel: PixelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// The "publish to web" link, tab selected by its `#gid=` fragment.
    pub published_url: String,
    pub group_link_fallback: String,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            published_url: "https://docs.google.com/spreadsheets/d/e/2PACX-1vRBEUzUQQ_karr8w7rEIXcrHK9Gei6cz8medP-8vct1T48Lzx1l3Jg0kJGTLL6myJyR9EaevuPKlp1s/pubhtml#gid=393232430".into(),
            group_link_fallback: "https://join.blackelephant.in/be-whatsapp".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub per_url_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            per_url_timeout_secs: 10,
        }
    }
}

impl FetchConfig {
    pub fn per_url_timeout(&self) -> Duration {
        Duration::from_secs(self.per_url_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadConfig {
    pub webhook_url: String,
    pub payment_url: String,
    /// Directory holding the saved first-touch attribution.
    pub state_dir: PathBuf,
    pub webhook_timeout_secs: u64,
}

impl Default for LeadConfig {
    fn default() -> Self {
        Self {
            webhook_url: "https://offbeatn8n.coachswastik.com/webhook/chirag-form".into(),
            payment_url: "https://pages.razorpay.com/pl_RYpzYm54vRK5Dl/view".into(),
            state_dir: PathBuf::from("state"),
            webhook_timeout_secs: 10,
        }
    }
}

impl LeadConfig {
    pub fn webhook_url(&self) -> Result<Url> {
        Url::parse(&self.webhook_url).with_context(|| format!("parsing webhook_url {}", self.webhook_url))
    }

    pub fn payment_url(&self) -> Result<Url> {
        Url::parse(&self.payment_url).with_context(|| format!("parsing payment_url {}", self.payment_url))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelConfig {
    pub pixel_id: String,
    pub endpoint: String,
    pub access_token: Option<String>,
    pub ready_timeout_ms: u64,
}

impl Default for PixelConfig {
    fn default() -> Self {
        Self {
            pixel_id: "842595278262482".into(),
            endpoint: "https://graph.facebook.com/v18.0".into(),
            access_token: None,
            ready_timeout_ms: 5000,
        }
    }
}

impl PixelConfig {
    pub fn endpoint(&self) -> Result<Url> {
        Url::parse(&self.endpoint).with_context(|| format!("parsing pixel endpoint {}", self.endpoint))
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

impl FeedConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing feed config YAML")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        Self::from_yaml_str(&text).with_context(|| format!("in {:?}", path))
    }

    /// Explicit path, else `$FEED_CONFIG`, else `./workshop_feed.yaml` if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            info!(path = %path.display(), "loading config");
            return Self::from_file(path);
        }
        if let Ok(path) = env::var(CONFIG_ENV) {
            info!(%path, "loading config from {}", CONFIG_ENV);
            return Self::from_file(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            info!(path = %local.display(), "loading config");
            return Self::from_file(local);
        }
        debug!("no config file; using built-in defaults");
        Ok(Self::default())
    }

    pub fn published_sheet(&self) -> Result<PublishedSheet> {
        PublishedSheet::from_link(&self.sheet.published_url)
    }
}
