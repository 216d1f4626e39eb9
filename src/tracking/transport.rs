// src/tracking/transport.rs

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::json;
use std::future::Future;
use tracing::debug;
use url::Url;

use super::PixelEvent;

/// Where pixel events go.
pub trait PixelTransport: Send + Sync {
    fn send(&self, pixel_id: &str, event: &PixelEvent) -> impl Future<Output = Result<()>> + Send;
}

/// Server-side events endpoint: `POST {endpoint}/{pixel_id}/events`.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
    access_token: Option<String>,
}

impl HttpTransport {
    pub fn new(client: Client, endpoint: Url, access_token: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            access_token,
        }
    }

    pub fn events_url(&self, pixel_id: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("pixel endpoint {} cannot take a path", self.endpoint))?
            .pop_if_empty()
            .extend([pixel_id, "events"]);
        Ok(url)
    }
}

impl PixelTransport for HttpTransport {
    async fn send(&self, pixel_id: &str, event: &PixelEvent) -> Result<()> {
        let url = self.events_url(pixel_id)?;
        let mut body = json!({
            "data": [{
                "event_name": event.name,
                "event_time": event.event_time,
                "action_source": "website",
                "custom_data": event.params,
            }]
        });
        if let Some(token) = &self.access_token {
            body["access_token"] = json!(token);
        }

        debug!(%url, event = %event.name, "sending pixel event");
        self.client
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", url))?;
        Ok(())
    }
}
