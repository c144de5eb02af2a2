//! Remote catalog directory listing.
//!
//! The remote catalog exposes one HTML directory index per satellite and
//! year/month. The index has no date or satellite columns; everything is
//! encoded in the subdirectory names, which later become the join key
//! against the alert catalog (see [`crate::resolve`]).

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

use crate::errors::EtlError;
use crate::satellite::Satellite;

/// Number of leading anchors on the index page that are sorting/navigation
/// chrome rather than entries; the final anchor is the parent directory.
const HEADER_ANCHORS: usize = 5;

/// Lists remote directory entries for a satellite and month.
///
/// Seam for the acquisition orchestrator so tests can substitute a canned
/// listing without network access.
#[async_trait]
pub trait RemoteLister {
    /// Returns the subdirectory names under `{base_url}/{satellite
    /// dir}/{YYYY_MM}/`, in listing order.
    async fn list_subdirs(
        &self,
        satellite: Satellite,
        year_month: &str,
    ) -> Result<Vec<String>, EtlError>;
}

/// [`RemoteLister`] backed by HTTP GET against the catalog's directory index.
pub struct HttpLister {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLister {
    /// Creates a lister rooted at `base_url` (no trailing slash).
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RemoteLister for HttpLister {
    async fn list_subdirs(
        &self,
        satellite: Satellite,
        year_month: &str,
    ) -> Result<Vec<String>, EtlError> {
        let url = format!("{}/{}/{}/", self.base_url, satellite.dir_name(), year_month);
        debug!(%url, "listing remote directory");

        let html = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| EtlError::RemoteListing { satellite, source })?
            .text()
            .await
            .map_err(|source| EtlError::RemoteListing { satellite, source })?;

        Ok(parse_directory_listing(&html))
    }
}

/// Extracts subdirectory entries from an HTML directory index.
///
/// Skips the leading header anchors and the trailing parent-directory anchor;
/// only entries whose display text contains a path separator are
/// subdirectories.
pub fn parse_directory_listing(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let anchor = Selector::parse("a").expect("static selector");

    let texts: Vec<String> = doc
        .select(&anchor)
        .map(|a| a.text().collect::<String>())
        .collect();

    let end = texts.len().saturating_sub(1).max(HEADER_ANCHORS);
    texts
        .into_iter()
        .take(end)
        .skip(HEADER_ANCHORS)
        .filter(|t| t.contains('/'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // trimmed-down copy of the catalog's index page layout
    const INDEX: &str = r#"<html><body><table>
        <tr><th><a href="?C=N;O=D">Name</a></th>
            <th><a href="?C=M;O=A">Last modified</a></th>
            <th><a href="?C=S;O=A">Size</a></th>
            <th><a href="?C=D;O=A">Description</a></th></tr>
        <tr><td><a href="/catalog/tmp/CBERS4/">Parent Directory</a></td></tr>
        <tr><td><a href="CBERS_4_AWFI_DRD_2023_05_10.13_29_30_CB11/">CBERS_4_AWFI_DRD_2023_05_10.13_29_30_CB11/</a></td></tr>
        <tr><td><a href="CBERS_4_AWFI_DRD_2023_05_13.13_48_30_CB11/">CBERS_4_AWFI_DRD_2023_05_13.13_48_30_CB11/</a></td></tr>
        <tr><td><a href="readme.txt">readme.txt</a></td></tr>
        <tr><td><a href="/catalog/tmp/">Back to root</a></td></tr>
        </table></body></html>"#;

    #[test]
    fn keeps_only_subdirectory_entries() {
        let subdirs = parse_directory_listing(INDEX);
        assert_eq!(
            subdirs,
            vec![
                "CBERS_4_AWFI_DRD_2023_05_10.13_29_30_CB11/".to_string(),
                "CBERS_4_AWFI_DRD_2023_05_13.13_48_30_CB11/".to_string(),
            ]
        );
    }

    #[test]
    fn short_page_yields_nothing() {
        assert!(parse_directory_listing("<html><body></body></html>").is_empty());
        assert!(parse_directory_listing("<a href=\"x/\">x/</a>").is_empty());
    }
}
