//! The monthly acquisition run.
//!
//! Wires the state tracker, catalog queries, remote listing, URL resolution
//! and downloader together. The orchestrator owns every component and the
//! database connection for the duration of the run; cleanup after a failed
//! run happens here, never inside the component being cleaned up.

use chrono::{Datelike, NaiveDate};
use tracing::{info, warn};

use crate::catalog;
use crate::config::EtlConfig;
use crate::db::connection;
use crate::download::Downloader;
use crate::errors::EtlError;
use crate::listing::RemoteLister;
use crate::resolve::{self, CmaskItem};
use crate::satellite::Satellite;
use crate::state::{self, AcquisitionState, Decision, Phase};

/// Terminal summary of one acquisition invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionReport {
    /// Phase the run ended in.
    pub phase: Phase,
    /// Month that was (or would have been) processed.
    pub target_month: Option<NaiveDate>,
    /// Candidate items resolved from catalog and listing.
    pub resolved_items: usize,
    /// Files actually written.
    pub found_items: u32,
}

/// Runs the acquisition: decide, resolve, download, persist.
///
/// On failure after the download pass started, a control file created by
/// this run is removed so the next scheduled run retries the same month; a
/// control file from an earlier successful run is left untouched.
pub async fn run_acquisition<L: RemoteLister>(
    config: &EtlConfig,
    lister: &L,
    client: reqwest::Client,
) -> Result<AcquisitionReport, EtlError> {
    let biome_dir = config.ensure_biome_dir()?;
    let had_prior = state::control_file_path(&biome_dir).exists();

    let result = run_inner(config, lister, client, &biome_dir).await;

    if result.is_err() && !had_prior {
        if let Err(e) = state::remove_control_file(&biome_dir) {
            warn!(error = %e, "could not remove control file written by failed run");
        }
    }
    result
}

async fn run_inner<L: RemoteLister>(
    config: &EtlConfig,
    lister: &L,
    client: reqwest::Client,
    biome_dir: &std::path::Path,
) -> Result<AcquisitionReport, EtlError> {
    let prior = state::read_state(biome_dir);

    let mut conn = connection::connect(&config.db)?;

    // the closed-month query is skipped entirely under a forced month
    let last_closed = match config.force_month {
        Some(_) => None,
        None => catalog::last_closed_month(&mut conn, &config.catalog_table)?,
    };

    let decision = state::decide(
        config.force_month,
        config.every_day,
        prior.map(|s| s.previous_month),
        last_closed,
    );

    let target = match decision {
        Decision::Skip { phase } => {
            info!(?phase, biome = %config.biome, "nothing to acquire");
            return Ok(AcquisitionReport {
                phase,
                target_month: None,
                resolved_items: 0,
                found_items: 0,
            });
        }
        Decision::Proceed { target } => target,
    };
    info!(biome = %config.biome, month = %target.format("%Y-%m"), "acquiring CMASK tiles");

    let year_month = target.format("%Y_%m").to_string();
    let mut items: Vec<CmaskItem> = Vec::new();
    for satellite in Satellite::ALL {
        let subpaths = lister.list_subdirs(satellite, &year_month).await?;
        let records =
            catalog::scene_records(&mut conn, &config.catalog_table, satellite, target)?;
        info!(
            %satellite,
            subpaths = subpaths.len(),
            records = records.len(),
            "resolving candidate tiles"
        );
        items.extend(resolve::resolve_all(&config.base_url, &records, &subpaths));
    }

    let downloader = Downloader::new(client, biome_dir.to_path_buf());
    let found_items = downloader.fetch_all(&items).await;

    state::write_state(
        biome_dir,
        &AcquisitionState {
            previous_month: target,
            found_items,
        },
    )?;
    info!(
        year = target.year(),
        month = target.month(),
        found_items,
        "acquisition complete"
    );

    Ok(AcquisitionReport {
        phase: Phase::Processed,
        target_month: Some(target),
        resolved_items: items.len(),
        found_items,
    })
}
