//! Mosaic raster access and polygon masking.
//!
//! The non-cloud mosaic is read once into memory (a monthly biome mosaic is
//! a few hundred MB at most) and masking is a pure computation over the
//! in-memory grid, so the tally logic is testable without GDAL datasets.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use gdal::Dataset;
use geo::{BoundingRect, Contains, MultiPolygon, Point};

use crate::errors::EtlError;

/// Mean earth radius used for the spherical pixel-size approximation.
const EARTH_RADIUS_M: f64 = 6_378_000.0;

/// Path of the month's non-cloud mosaic inside the biome directory,
/// `noncloud_{YYYY}{MM}_64.tif`.
pub fn mosaic_path(biome_dir: &Path, year: i32, month: u32) -> PathBuf {
    biome_dir.join(format!("noncloud_{year:04}{month:02}_64.tif"))
}

/// Physical pixel area in km² from per-axis resolutions in degrees,
/// using a spherical-earth approximation.
pub fn pixel_area_km2(res_x_deg: f64, res_y_deg: f64) -> f64 {
    let res_x_m = res_x_deg * std::f64::consts::PI / 180.0 * EARTH_RADIUS_M;
    let res_y_m = res_y_deg * std::f64::consts::PI / 180.0 * EARTH_RADIUS_M;
    (res_x_m * res_y_m).abs() / 1_000_000.0
}

/// A raster band held in memory, row-major, with its GDAL geo-transform.
///
/// The transform is assumed north-up (no shear terms), which holds for the
/// mosaics the acquisition run produces.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    /// Columns.
    pub width: usize,
    /// Rows.
    pub height: usize,
    /// GDAL geo-transform: `[x0, res_x, 0, y0, 0, res_y]`.
    pub geo: [f64; 6],
    /// Pixel values, row-major, `height * width` entries.
    pub data: Vec<f64>,
}

impl RasterGrid {
    /// Opens `path` and reads band 1 entirely.
    pub fn open(path: &Path) -> Result<Self, EtlError> {
        let dataset = Dataset::open(path)?;
        let geo = dataset.geo_transform()?;
        let (width, height) = dataset.raster_size();
        let band = dataset.rasterband(1)?;
        let buffer = band.read_as::<f64>((0, 0), (width, height), (width, height), None)?;
        let (_, data) = buffer.into_shape_and_vec();
        Ok(RasterGrid {
            width,
            height,
            geo,
            data,
        })
    }

    /// Per-axis pixel resolution in map units (degrees for these mosaics).
    pub fn resolution(&self) -> (f64, f64) {
        (self.geo[1], self.geo[5])
    }

    /// Map coordinates of the center of pixel `(col, row)`.
    fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.geo[0] + (col as f64 + 0.5) * self.geo[1],
            self.geo[3] + (row as f64 + 0.5) * self.geo[5],
        )
    }

    /// Pixel window (cols, rows) covering the polygon's bounding rectangle,
    /// clamped to the raster extent. Empty when there is no overlap.
    fn window(&self, polygon: &MultiPolygon<f64>) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
        let rect = polygon.bounding_rect()?;
        let (res_x, res_y) = self.resolution();

        let c0 = (rect.min().x - self.geo[0]) / res_x;
        let c1 = (rect.max().x - self.geo[0]) / res_x;
        let r0 = (rect.max().y - self.geo[3]) / res_y;
        let r1 = (rect.min().y - self.geo[3]) / res_y;

        let col_start = c0.min(c1).floor().max(0.0) as usize;
        let col_end = (c0.max(c1).ceil().max(0.0) as usize).min(self.width);
        let row_start = r0.min(r1).floor().max(0.0) as usize;
        let row_end = (r0.max(r1).ceil().max(0.0) as usize).min(self.height);

        if col_start >= col_end || row_start >= row_end {
            return None;
        }
        Some((col_start..col_end, row_start..row_end))
    }

    /// Masks the grid to the polygon footprint and tallies pixel-value
    /// frequencies over the cropped window.
    ///
    /// Pixels inside the window but outside the polygon count under the
    /// sentinel value 0, matching a mask-and-crop with nodata 0. Returns an
    /// empty map when the polygon does not overlap the raster at all.
    pub fn value_counts(&self, polygon: &MultiPolygon<f64>) -> BTreeMap<i64, u64> {
        let mut counts = BTreeMap::new();
        let Some((cols, rows)) = self.window(polygon) else {
            return counts;
        };

        for row in rows {
            for col in cols.clone() {
                let (x, y) = self.pixel_center(col, row);
                let value = if polygon.contains(&Point::new(x, y)) {
                    self.data[row * self.width + col] as i64
                } else {
                    0
                };
                *counts.entry(value).or_insert(0) += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    /// 0.00021813° pixels: (0.00021813 · π/180 · 6378000)² / 10⁶ km².
    #[test]
    fn pixel_area_from_degree_resolution() {
        let area = pixel_area_km2(0.00021813, -0.00021813);
        assert!((area - 5.8959604785e-4).abs() < 1e-12, "got {area}");
    }

    #[test]
    fn mosaic_path_pattern() {
        let p = mosaic_path(Path::new("/data/amazonia"), 2023, 5);
        assert_eq!(p, PathBuf::from("/data/amazonia/noncloud_202305_64.tif"));
    }

    /// 4x4 grid over [0,4]x[0,4], one unit per pixel, top-left origin.
    fn grid(data: Vec<f64>) -> RasterGrid {
        RasterGrid {
            width: 4,
            height: 4,
            geo: [0.0, 1.0, 0.0, 4.0, 0.0, -1.0],
            data,
        }
    }

    #[test]
    fn counts_inside_a_square_polygon() {
        // rows from the top: values 1,1,2,0 per column
        let g = grid(vec![
            1.0, 1.0, 1.0, 1.0, //
            1.0, 1.0, 1.0, 1.0, //
            2.0, 2.0, 2.0, 2.0, //
            0.0, 0.0, 0.0, 0.0,
        ]);
        // covers the left 2x4 block exactly
        let poly: MultiPolygon<f64> = polygon![
            (x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 4.0), (x: 0.0, y: 4.0)
        ]
        .into();

        let counts = g.value_counts(&poly);
        assert_eq!(counts.get(&1), Some(&4));
        assert_eq!(counts.get(&2), Some(&2));
        assert_eq!(counts.get(&0), Some(&2));
    }

    #[test]
    fn window_pixels_outside_polygon_are_masked_to_zero() {
        let g = grid(vec![5.0; 16]);
        // triangle covering roughly half of a 2x2 window
        let poly: MultiPolygon<f64> = polygon![
            (x: 0.0, y: 2.0), (x: 2.0, y: 2.0), (x: 0.0, y: 4.0)
        ]
        .into();

        let counts = g.value_counts(&poly);
        let masked = counts.get(&0).copied().unwrap_or(0);
        let observed = counts.get(&5).copied().unwrap_or(0);
        assert_eq!(masked + observed, 4); // full 2x2 crop window tallied
        assert!(observed >= 1);
        assert!(masked >= 1);
    }

    #[test]
    fn disjoint_polygon_yields_no_counts() {
        let g = grid(vec![1.0; 16]);
        let poly: MultiPolygon<f64> = polygon![
            (x: 100.0, y: 100.0), (x: 101.0, y: 100.0), (x: 101.0, y: 101.0)
        ]
        .into();
        assert!(g.value_counts(&poly).is_empty());
    }
}
