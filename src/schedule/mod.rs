// src/schedule/mod.rs

use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, instrument};

use crate::fetch::{CsvSource, PublishedSheet, Resolved, SourceResolver};
use crate::sheet::{clean_text, ColumnKind};

pub mod group_link;

pub use group_link::GroupLinkLoader;

/// Shown in place of a value we could not load.
pub const PLACEHOLDER: &str = "—";
pub const LOADING_LABEL: &str = "Loading…";

/// What the workshop-details block should show for date and time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    Loading,
    Ready { date: String, time: String },
    Unavailable,
}

impl DisplayState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DisplayState::Loading)
    }

    /// (date label, time label), with placeholders for anything missing.
    pub fn labels(&self) -> (String, String) {
        fn or_placeholder(s: &str) -> String {
            if s.is_empty() {
                PLACEHOLDER.to_string()
            } else {
                s.to_string()
            }
        }

        match self {
            DisplayState::Loading => (LOADING_LABEL.to_string(), LOADING_LABEL.to_string()),
            DisplayState::Ready { date, time } => (or_placeholder(date), or_placeholder(time)),
            DisplayState::Unavailable => (PLACEHOLDER.to_string(), PLACEHOLDER.to_string()),
        }
    }
}

impl From<Option<Resolved>> for DisplayState {
    fn from(resolved: Option<Resolved>) -> Self {
        let Some(resolved) = resolved else {
            return DisplayState::Unavailable;
        };
        let Some(row) = resolved.table.first_populated_row() else {
            return DisplayState::Unavailable;
        };
        DisplayState::Ready {
            date: clean_text(resolved.columns.cell(row, ColumnKind::Date)),
            time: clean_text(resolved.columns.cell(row, ColumnKind::Time)),
        }
    }
}

/// Loads the workshop date/time from the published sheet, once.
pub struct ScheduleLoader<S> {
    resolver: SourceResolver<S>,
}

impl<S: CsvSource + 'static> ScheduleLoader<S> {
    pub fn new(source: S, sheet: &PublishedSheet, per_url_timeout: Duration) -> Self {
        let resolver = SourceResolver::new(
            source,
            sheet.schedule_urls(),
            &[ColumnKind::Date, ColumnKind::Time],
        )
        .with_timeout(per_url_timeout);
        Self { resolver }
    }

    pub fn from_resolver(resolver: SourceResolver<S>) -> Self {
        Self { resolver }
    }

    /// Resolve to a terminal state. Never errors: failure is `Unavailable`.
    #[instrument(level = "info", skip(self))]
    pub async fn load(&self) -> DisplayState {
        let state = DisplayState::from(self.resolver.resolve().await);
        match &state {
            DisplayState::Ready { date, time } => info!(%date, %time, "schedule ready"),
            _ => info!("schedule unavailable"),
        }
        state
    }

    /// Run the load in the background; the session starts out `Loading`.
    pub fn spawn(self) -> ScheduleSession {
        let (tx, rx) = watch::channel(DisplayState::Loading);
        let task = tokio::spawn(async move {
            let state = self.load().await;
            // the view went away while we were fetching
            if tx.is_closed() {
                debug!("schedule session dropped; discarding result");
                return;
            }
            tx.send_replace(state);
        });
        ScheduleSession { state: rx, task }
    }
}

/// One rendering session's view of the schedule. Dropping it cancels the load.
pub struct ScheduleSession {
    state: watch::Receiver<DisplayState>,
    task: JoinHandle<()>,
}

impl ScheduleSession {
    pub fn current(&self) -> DisplayState {
        self.state.borrow().clone()
    }

    /// Wait for the terminal state.
    pub async fn settled(&mut self) -> DisplayState {
        match self.state.wait_for(DisplayState::is_terminal).await {
            Ok(state) => state.clone(),
            Err(_) => DisplayState::Unavailable,
        }
    }
}

impl Drop for ScheduleSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}
