use std::time::Duration;
use tracing::info;

use crate::fetch::{CsvSource, PublishedSheet, SourceResolver};
use crate::sheet::ColumnKind;

/// Community group invite shown on the thank-you page. Read from the sheet's
/// `whatsapp` column, falling back to a fixed link.
pub struct GroupLinkLoader<S> {
    resolver: SourceResolver<S>,
    fallback: String,
}

impl<S: CsvSource> GroupLinkLoader<S> {
    pub fn new(
        source: S,
        sheet: &PublishedSheet,
        fallback: impl Into<String>,
        per_url_timeout: Duration,
    ) -> Self {
        let resolver = SourceResolver::new(source, sheet.group_link_urls(), &[ColumnKind::GroupLink])
            .with_timeout(per_url_timeout);
        Self::from_resolver(resolver, fallback)
    }

    pub fn from_resolver(resolver: SourceResolver<S>, fallback: impl Into<String>) -> Self {
        Self {
            resolver,
            fallback: fallback.into(),
        }
    }

    pub async fn load(&self) -> String {
        let link = self.resolver.resolve().await.and_then(|resolved| {
            let row = resolved.table.first_populated_row()?;
            let raw = resolved.columns.cell(row, ColumnKind::GroupLink).trim();
            (!raw.is_empty()).then(|| raw.to_string())
        });

        match link {
            Some(link) => {
                info!(%link, "group link from sheet");
                link
            }
            None => {
                info!(fallback = %self.fallback, "group link fallback");
                self.fallback.clone()
            }
        }
    }
}
