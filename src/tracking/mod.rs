// src/tracking/mod.rs
//
// Pixel tracking as a process-wide service. `initialize` runs the one-time
// setup (the PageView that registers the visit) exactly once no matter how
// many callers race it; later callers wait on the one in flight. Readiness
// can be awaited with a deadline instead of polling.

use anyhow::{bail, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};
use tokio::sync::{watch, OnceCell};
use tracing::{debug, info, instrument};

pub mod transport;

pub use transport::{HttpTransport, PixelTransport};

pub const PAGE_VIEW: &str = "PageView";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PixelEvent {
    pub name: String,
    pub params: Map<String, Value>,
    /// Unix seconds.
    pub event_time: i64,
}

impl PixelEvent {
    pub fn new(name: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            params,
            event_time: Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Ready,
    NotAvailable,
}

pub struct Tracker<T> {
    pixel_id: String,
    transport: T,
    init: OnceCell<()>,
    ready: watch::Sender<bool>,
    closed: AtomicBool,
}

impl<T: PixelTransport> Tracker<T> {
    pub fn new(pixel_id: impl Into<String>, transport: T) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            pixel_id: pixel_id.into(),
            transport,
            init: OnceCell::new(),
            ready,
            closed: AtomicBool::new(false),
        }
    }

    pub fn pixel_id(&self) -> &str {
        &self.pixel_id
    }

    pub fn is_ready(&self) -> bool {
        self.init.initialized() && !self.is_closed()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// One-time setup. Safe to call any number of times, from any number of
    /// tasks. A failed attempt leaves the tracker uninitialised so a later
    /// call can try again.
    #[instrument(level = "debug", skip(self), fields(pixel_id = %self.pixel_id))]
    pub async fn initialize(&self) -> Result<()> {
        if self.is_closed() {
            bail!("tracker for pixel {} is closed", self.pixel_id);
        }
        self.init
            .get_or_try_init(|| async {
                info!(pixel_id = %self.pixel_id, "initializing pixel");
                self.transport
                    .send(&self.pixel_id, &PixelEvent::new(PAGE_VIEW, Map::new()))
                    .await?;
                self.ready.send_replace(true);
                Ok::<(), anyhow::Error>(())
            })
            .await?;
        Ok(())
    }

    /// Send `event`, initializing first if needed. `Ok(false)` once closed.
    pub async fn track(&self, event: &str, params: Map<String, Value>) -> Result<bool> {
        if self.is_closed() {
            debug!(event, "tracker closed; dropping event");
            return Ok(false);
        }
        self.initialize().await?;
        self.transport
            .send(&self.pixel_id, &PixelEvent::new(event, params))
            .await?;
        debug!(event, "tracked");
        Ok(true)
    }

    /// Resolve once initialized, or `NotAvailable` when `timeout` passes first.
    pub async fn wait_ready(&self, timeout: Duration) -> Availability {
        let mut rx = self.ready.subscribe();
        let ready = matches!(
            tokio::time::timeout(timeout, rx.wait_for(|r| *r)).await,
            Ok(Ok(_))
        );
        if ready && !self.is_closed() {
            Availability::Ready
        } else {
            Availability::NotAvailable
        }
    }

    /// Teardown: later `track` calls are dropped and readiness reads false.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.ready.send_replace(false);
        info!(pixel_id = %self.pixel_id, "tracker closed");
    }
}

static GLOBAL: once_cell::sync::OnceCell<Tracker<HttpTransport>> = once_cell::sync::OnceCell::new();

/// Install the process-wide tracker. The first install wins; later calls get
/// the already-installed instance back.
pub fn install(tracker: Tracker<HttpTransport>) -> &'static Tracker<HttpTransport> {
    GLOBAL.get_or_init(|| tracker)
}

pub fn global() -> Option<&'static Tracker<HttpTransport>> {
    GLOBAL.get()
}
