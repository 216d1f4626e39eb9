// src/fetch/urls.rs

use anyhow::{anyhow, Context, Result};
use url::{form_urlencoded, Url};

/// A spreadsheet published to the web, addressed by its `pub` endpoint and
/// (optionally) the tab we care about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedSheet {
    pub_url: Url,
    gid: Option<String>,
}

impl PublishedSheet {
    /// Build from the link the sheet UI hands out, e.g.
    /// `https://docs.google.com/spreadsheets/d/e/<id>/pubhtml#gid=393232430`.
    pub fn from_link(link: &str) -> Result<Self> {
        let mut url = Url::parse(link).with_context(|| format!("parsing sheet link {}", link))?;

        let gid = url.fragment().and_then(|f| {
            form_urlencoded::parse(f.as_bytes())
                .find(|(k, _)| k == "gid")
                .map(|(_, v)| v.into_owned())
        });

        let path = url.path().trim_end_matches('/').to_string();
        let base = path
            .strip_suffix("/pubhtml")
            .or_else(|| path.strip_suffix("/pub"))
            .ok_or_else(|| anyhow!("not a published sheet link: {}", link))?;
        url.set_path(&format!("{}/pub", base));
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self { pub_url: url, gid })
    }

    pub fn with_gid(mut self, gid: impl Into<String>) -> Self {
        self.gid = Some(gid.into());
        self
    }

    pub fn gid(&self) -> Option<&str> {
        self.gid.as_deref()
    }

    /// CSV export of one tab, or of the first tab when `gid` is `None`.
    pub fn csv_url(&self, gid: Option<&str>) -> Url {
        let mut url = self.pub_url.clone();
        {
            let mut q = url.query_pairs_mut();
            if let Some(gid) = gid {
                q.append_pair("gid", gid);
                q.append_pair("single", "true");
            }
            q.append_pair("output", "csv");
        }
        url
    }

    /// Candidates for the schedule tab: the configured tab, the first tab, then legacy `gid=0`.
    pub fn schedule_urls(&self) -> Vec<Url> {
        let mut urls = Vec::with_capacity(3);
        if let Some(gid) = self.gid() {
            urls.push(self.csv_url(Some(gid)));
        }
        urls.push(self.csv_url(None));
        urls.push(self.csv_url(Some("0")));
        dedup_in_order(urls)
    }

    /// Candidates for the thank-you page group link: first tab, then legacy `gid=0`.
    pub fn group_link_urls(&self) -> Vec<Url> {
        vec![self.csv_url(None), self.csv_url(Some("0"))]
    }
}

fn dedup_in_order(urls: Vec<Url>) -> Vec<Url> {
    let mut out: Vec<Url> = Vec::with_capacity(urls.len());
    for u in urls {
        if !out.contains(&u) {
            out.push(u);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINK: &str =
        "https://docs.google.com/spreadsheets/d/e/2PACX-abc/pubhtml#gid=393232430";

    #[test]
    fn test_schedule_urls_in_fallback_order() -> Result<()> {
        let sheet = PublishedSheet::from_link(LINK)?;
        assert_eq!(sheet.gid(), Some("393232430"));

        let urls: Vec<String> = sheet.schedule_urls().iter().map(Url::to_string).collect();
        assert_eq!(
            urls,
            vec![
                "https://docs.google.com/spreadsheets/d/e/2PACX-abc/pub?gid=393232430&single=true&output=csv",
                "https://docs.google.com/spreadsheets/d/e/2PACX-abc/pub?output=csv",
                "https://docs.google.com/spreadsheets/d/e/2PACX-abc/pub?gid=0&single=true&output=csv",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_group_link_urls_skip_specific_tab() -> Result<()> {
        let sheet = PublishedSheet::from_link(LINK)?;
        let urls: Vec<String> = sheet.group_link_urls().iter().map(Url::to_string).collect();
        assert_eq!(
            urls,
            vec![
                "https://docs.google.com/spreadsheets/d/e/2PACX-abc/pub?output=csv",
                "https://docs.google.com/spreadsheets/d/e/2PACX-abc/pub?gid=0&single=true&output=csv",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_link_without_gid_and_gid_zero_dedup() -> Result<()> {
        let sheet = PublishedSheet::from_link("https://docs.google.com/spreadsheets/d/e/X/pub?output=csv")?;
        assert_eq!(sheet.gid(), None);
        assert_eq!(sheet.schedule_urls().len(), 2);

        let sheet = sheet.with_gid("0");
        assert_eq!(sheet.schedule_urls().len(), 2);
        Ok(())
    }

    #[test]
    fn test_rejects_non_published_link() {
        assert!(PublishedSheet::from_link("https://docs.google.com/spreadsheets/d/abc/edit").is_err());
        assert!(PublishedSheet::from_link("not a url").is_err());
    }
}
