//! Monthly acquisition and zonal aggregation of DETER CMASK cloud rasters.
//!
//! Two runs share this library:
//! - the acquisition run ([`acquisition`]) decides whether a new publish
//!   month is ready, resolves the remote CMASK tiles for it and downloads
//!   them into the per-biome data directory;
//! - the zonal run ([`zonal`]) reads the month's non-cloud mosaic and
//!   updates per-municipality cloud areas in the reporting table.
//!
//! The cross-run handshake is the acquisition control file managed by
//! [`state`].

#![deny(missing_docs)]

pub mod acquisition;
pub mod catalog;
pub mod config;
pub mod db;
pub mod download;
pub mod errors;
pub mod listing;
pub mod raster;
pub mod resolve;
pub mod satellite;
pub mod state;
pub mod zonal;
