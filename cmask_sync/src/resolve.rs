//! Deterministic mapping from catalog records to CMASK filenames and URLs.
//!
//! The remote listing has no date or satellite columns, only encoded
//! directory names; a subpath belongs to a record when it contains that
//! record's [`match_key`]. Resolution is pure: the same record and subpath
//! always produce the same filename and URL.

use chrono::NaiveDate;

use crate::catalog::CatalogRecord;
use crate::satellite::Satellite;

/// One downloadable CMASK tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmaskItem {
    /// Canonical tile filename.
    pub tif_name: String,
    /// Full download URL.
    pub url: String,
}

/// Join key between the alert catalog and a remote subpath:
/// `{satellite}_{sensor}_{format}_{YYYY_MM_DD}`.
pub fn match_key(satellite: Satellite, view_date: NaiveDate) -> String {
    format!(
        "{}_{}_{}_{}",
        satellite.code(),
        satellite.sensor(),
        satellite.format_tag(),
        view_date.format("%Y_%m_%d")
    )
}

/// Canonical CMASK filename for a scene observation.
pub fn tif_name(satellite: Satellite, path_row: &str, view_date: NaiveDate) -> String {
    format!(
        "{}_{}_{}_{}_L4_CMASK_GRID_SURFACE.tif",
        satellite.code(),
        satellite.sensor(),
        view_date.format("%Y%m%d"),
        path_row
    )
}

/// Builds the [`CmaskItem`] for one record under one matching subpath.
pub fn resolve(base_url: &str, record: &CatalogRecord, subpath: &str) -> CmaskItem {
    let name = tif_name(record.satellite, &record.path_row, record.view_date);
    let url = format!(
        "{}/{}/{}/{}{}_0/4_BC_{}_WGS84/{}",
        base_url,
        record.satellite.dir_name(),
        record.view_date.format("%Y_%m"),
        subpath,
        record.path_row,
        record.satellite.projection(),
        name
    );
    CmaskItem { tif_name: name, url }
}

/// Matches every record against every subpath and emits one item per match.
///
/// A record can match zero, one or many subpaths (re-processed scenes list
/// several directories for the same day); subpath listing order is kept.
pub fn resolve_all(
    base_url: &str,
    records: &[CatalogRecord],
    subpaths: &[String],
) -> Vec<CmaskItem> {
    let mut items = Vec::new();
    for record in records {
        let key = match_key(record.satellite, record.view_date);
        for subpath in subpaths {
            if subpath.contains(&key) {
                items.push(resolve(base_url, record, subpath));
            }
        }
    }
    items
}
