//! CMASK tile download.
//!
//! Items are processed strictly in listing order, one at a time, with an
//! existence probe before each fetch. Many catalog records have no published
//! tile yet; a 404 on the probe is an expected outcome, not an error.
//!
//! Failure policy: a transport failure on one item is logged and the loop
//! continues with the remaining items. The found count only reflects files
//! actually written.

use std::path::PathBuf;

use reqwest::StatusCode;
use tracing::{info, warn};

use crate::resolve::CmaskItem;

/// Downloads resolved CMASK tiles into the biome output directory.
pub struct Downloader {
    client: reqwest::Client,
    out_dir: PathBuf,
}

impl Downloader {
    /// Creates a downloader writing into `out_dir` (must already exist).
    pub fn new(client: reqwest::Client, out_dir: PathBuf) -> Self {
        Self { client, out_dir }
    }

    /// Probes and fetches every item, returning how many files were written.
    ///
    /// Downloads are idempotent by filename: an existing file of the same
    /// name is overwritten.
    pub async fn fetch_all(&self, items: &[CmaskItem]) -> u32 {
        let mut found = 0u32;
        for item in items {
            match self.fetch_one(item).await {
                Ok(true) => {
                    found += 1;
                    info!(tif = %item.tif_name, "found");
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(tif = %item.tif_name, error = %e, "download failed, continuing");
                }
            }
        }
        found
    }

    /// Probe-then-fetch for a single item. Returns `Ok(false)` when the
    /// remote tile does not exist (yet).
    async fn fetch_one(&self, item: &CmaskItem) -> Result<bool, FetchError> {
        let head = self.client.head(&item.url).send().await?;
        if head.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }

        let response = self.client.get(&item.url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let bytes = response.bytes().await?;
        std::fs::write(self.out_dir.join(&item.tif_name), &bytes)?;
        Ok(true)
    }
}

/// Per-item download failure; never aborts the batch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure on the probe or the fetch.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Non-404 error status on the fetch.
    #[error("HTTP status {0}")]
    Status(StatusCode),
    /// The payload could not be written to the output directory.
    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),
}
