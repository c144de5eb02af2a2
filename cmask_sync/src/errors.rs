//! The unified error type for the `cmask_sync` crate.

use thiserror::Error;

/// Failure modes of the acquisition and zonal runs.
#[derive(Debug, Error)]
pub enum EtlError {
    /// Invalid or missing configuration (biome, table names, credentials).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection could not be established.
    #[error("Database connection failed")]
    Connection(#[from] diesel::ConnectionError),

    /// A database query failed: catalog reads, zonal reads, or the zonal
    /// update transaction. Fatal for the run.
    #[error("Database query failed")]
    Database(#[from] diesel::result::Error),

    /// The catalog returned a satellite code outside the known set.
    #[error(transparent)]
    UnknownSatellite(#[from] crate::satellite::UnknownSatellite),

    /// Remote directory listing failed for a satellite. Aborts the run.
    #[error("Remote listing failed for {satellite}: {source}")]
    RemoteListing {
        /// Satellite whose listing request failed.
        satellite: crate::satellite::Satellite,
        /// Underlying transport or parse failure.
        #[source]
        source: reqwest::Error,
    },

    /// Control-file read/write or tile write failed.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// Mosaic raster could not be opened or read.
    #[error("Raster error")]
    Raster(#[from] gdal::errors::GdalError),

    /// Zonal aggregation failed before or during the update transaction.
    #[error("Aggregation error: {0}")]
    Aggregation(String),
}

impl From<shared_utils::env::MissingEnvVarError> for EtlError {
    fn from(e: shared_utils::env::MissingEnvVarError) -> Self {
        EtlError::Config(e.to_string())
    }
}
