// src/lead/submit.rs

use anyhow::{bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument, warn};
use url::Url;

use super::attribution::Attribution;

/// What the registration form collects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub profession: String,
}

/// Digits only, at most ten of them.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).take(10).collect()
}

impl Lead {
    /// Copy with the phone reduced to what the form field accepts.
    pub fn normalized(&self) -> Lead {
        Lead {
            phone: normalize_phone(&self.phone),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("profession", &self.profession),
        ] {
            if value.trim().is_empty() {
                bail!("{} is required", field);
            }
        }
        if !self.email.contains('@') {
            bail!("email {:?} is not an address", self.email);
        }
        if normalize_phone(&self.phone).is_empty() {
            bail!("phone {:?} has no digits", self.phone);
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    #[serde(flatten)]
    lead: &'a Lead,
    #[serde(flatten)]
    attribution: &'a Attribution,
    page_url: &'a str,
    ts: String,
}

/// Posts a lead to the automation webhook and hands back the payment page to send the visitor to.
#[derive(Clone, Debug)]
pub struct LeadSubmitter {
    client: Client,
    webhook_url: Url,
    payment_url: Url,
    webhook_timeout: Duration,
}

impl LeadSubmitter {
    pub fn new(client: Client, webhook_url: Url, payment_url: Url) -> Self {
        Self {
            client,
            webhook_url,
            payment_url,
            webhook_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_webhook_timeout(mut self, timeout: Duration) -> Self {
        self.webhook_timeout = timeout;
        self
    }

    /// Validate, notify the webhook (best effort), return the payment redirect.
    #[instrument(level = "info", skip_all, fields(email = %lead.email))]
    pub async fn submit(
        &self,
        lead: &Lead,
        attribution: &Attribution,
        page_url: &Url,
    ) -> Result<Url> {
        let lead = lead.normalized();
        lead.validate()?;

        // the visitor goes to payment whether or not the webhook took it
        match self.post_webhook(&lead, attribution, page_url).await {
            Ok(()) => info!("lead posted to webhook"),
            Err(e) => warn!(error = %format!("{:#}", e), "webhook post failed; continuing to payment"),
        }

        Ok(self.payment_redirect(&lead, attribution))
    }

    async fn post_webhook(&self, lead: &Lead, attribution: &Attribution, page_url: &Url) -> Result<()> {
        let payload = WebhookPayload {
            lead,
            attribution,
            page_url: page_url.as_str(),
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        self.client
            .post(self.webhook_url.clone())
            .timeout(self.webhook_timeout)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("POST {} failed", self.webhook_url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", self.webhook_url))?;
        Ok(())
    }

    /// Payment page URL prefilled with the lead and its attribution.
    pub fn payment_redirect(&self, lead: &Lead, attribution: &Attribution) -> Url {
        let mut url = self.payment_url.clone();
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("name", &lead.name)
                .append_pair("email", &lead.email)
                .append_pair("phone", &normalize_phone(&lead.phone))
                .append_pair("profession", &lead.profession);
            for (k, v) in attribution.pairs() {
                q.append_pair(k, v);
            }
        }
        url
    }
}
