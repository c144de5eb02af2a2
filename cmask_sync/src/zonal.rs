//! Per-municipality cloud area from the month's non-cloud mosaic.
//!
//! Reads the persisted acquisition state to locate the mosaic, masks it to
//! each municipality polygon and updates the reporting table. All updates
//! run inside one transaction: the table either reflects the whole month or
//! is left untouched.

use std::collections::BTreeMap;

use chrono::Datelike;
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Double, Integer, Text};
use geo::MultiPolygon;
use tracing::{info, warn};

use crate::config::EtlConfig;
use crate::db::connection;
use crate::errors::EtlError;
use crate::raster::{self, RasterGrid};
use crate::state;

/// A municipality polygon with its reference area.
#[derive(Debug, Clone)]
pub struct MunicipalityZone {
    /// IBGE municipality code.
    pub municipality_id: String,
    /// Reference area of the municipality in km².
    pub total_area_km2: f64,
    /// Municipality footprint in the mosaic's coordinate system.
    pub polygon: MultiPolygon<f64>,
}

/// Terminal summary of one zonal run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZonalReport {
    /// Mosaic year.
    pub year: i32,
    /// Mosaic month.
    pub month: u32,
    /// Municipalities updated.
    pub municipalities: usize,
}

#[derive(QueryableByName)]
struct ZoneRow {
    #[diesel(sql_type = Text)]
    cod_ibge: String,
    #[diesel(sql_type = Double)]
    area_px_km: f64,
    #[diesel(sql_type = Text)]
    geom: String,
}

/// Loads the municipality zones ordered by municipality code.
fn load_zones(conn: &mut PgConnection, table: &str) -> Result<Vec<MunicipalityZone>, EtlError> {
    let sql = format!(
        "SELECT cod_ibge, area_px_km, ST_AsText(geom) AS geom \
         FROM {table} ORDER BY cod_ibge ASC"
    );
    let rows: Vec<ZoneRow> = sql_query(sql).load(conn)?;

    rows.into_iter()
        .map(|row| {
            let polygon = parse_multipolygon(&row.geom).map_err(|e| {
                EtlError::Aggregation(format!("bad geometry for {}: {e}", row.cod_ibge))
            })?;
            Ok(MunicipalityZone {
                municipality_id: row.cod_ibge,
                total_area_km2: row.area_px_km,
                polygon,
            })
        })
        .collect()
}

/// Parses a WKT POLYGON/MULTIPOLYGON into a [`MultiPolygon`].
fn parse_multipolygon(wkt: &str) -> Result<MultiPolygon<f64>, String> {
    let geometry = gdal::vector::Geometry::from_wkt(wkt).map_err(|e| e.to_string())?;
    match geometry.to_geo().map_err(|e| e.to_string())? {
        geo::Geometry::Polygon(p) => Ok(MultiPolygon(vec![p])),
        geo::Geometry::MultiPolygon(mp) => Ok(mp),
        other => Err(format!("unexpected geometry type: {other:?}")),
    }
}

/// Derives the month's cloud area for one municipality from its pixel-value
/// histogram.
///
/// Mirrors the reporting table's established semantics: the scalar is
/// overwritten per value bucket in ascending order, so a zero-only histogram
/// (fully masked / no observation) yields the full reference area and the
/// highest non-zero value present determines the result. The result is
/// clamped into `[0, total_area]`.
pub fn cloud_area_km2(counts: &BTreeMap<i64, u64>, pixel_area_km2: f64, total_area_km2: f64) -> f64 {
    let mut cloud = total_area_km2;
    for (&value, &count) in counts {
        if value > 0 {
            cloud = total_area_km2 - pixel_area_km2 * count as f64;
        } else {
            cloud = total_area_km2;
        }
    }
    if cloud < 0.0 {
        warn!(cloud, total_area_km2, "observed area exceeds reference area, clamping");
    }
    cloud.max(0.0).min(total_area_km2.max(0.0))
}

/// Runs the zonal aggregation for the month recorded by the last successful
/// acquisition run.
///
/// Aborts before any database write when the acquisition state, the mosaic
/// raster or the zonal reference rows are missing. A failure mid-loop rolls
/// the whole transaction back.
pub fn run_zonal(config: &EtlConfig) -> Result<ZonalReport, EtlError> {
    let biome_dir = config.biome_dir();

    let Some(acq) = state::read_state(&biome_dir) else {
        return Err(EtlError::Aggregation(
            "no acquisition state; run the download first".to_string(),
        ));
    };
    let (year, month) = (acq.previous_month.year(), acq.previous_month.month());

    let mosaic = raster::mosaic_path(&biome_dir, year, month);
    if !mosaic.exists() {
        return Err(EtlError::Aggregation(format!(
            "mosaic raster not found: {}",
            mosaic.display()
        )));
    }
    let grid = RasterGrid::open(&mosaic)?;
    let (res_x, res_y) = grid.resolution();
    let pixel_area = raster::pixel_area_km2(res_x, res_y);
    info!(mosaic = %mosaic.display(), pixel_area_km2 = pixel_area, "mosaic loaded");

    let mut conn = connection::connect(&config.db)?;
    let zones = load_zones(&mut conn, &config.zonal_table)?;
    if zones.is_empty() {
        return Err(EtlError::Aggregation(format!(
            "no zonal reference rows in {}",
            config.zonal_table
        )));
    }

    let update = format!(
        "UPDATE {} SET month_cloud_km2 = $1, year = $2, month = $3 WHERE cod_ibge = $4",
        config.zonal_table
    );
    conn.transaction::<_, EtlError, _>(|conn| {
        for zone in &zones {
            let counts = grid.value_counts(&zone.polygon);
            let cloud = cloud_area_km2(&counts, pixel_area, zone.total_area_km2);
            sql_query(&update)
                .bind::<Double, _>(cloud)
                .bind::<Integer, _>(year)
                .bind::<Integer, _>(month as i32)
                .bind::<Text, _>(&zone.municipality_id)
                .execute(conn)?;
        }
        Ok(())
    })?;
    info!(year, month, municipalities = zones.len(), "zonal table updated");

    Ok(ZonalReport {
        year,
        month,
        municipalities: zones.len(),
    })
}
