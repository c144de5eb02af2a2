//! Satellites feeding DETER alerts and their CMASK naming parameters.
//!
//! Each satellite carries the sensor, file format tag and projection used to
//! build CMASK filenames and download URLs. The same satellite shows up in
//! three spellings: underscored in filenames (`CBERS_4`), hyphenated in the
//! alert table (`CBERS-4`) and collapsed in remote directory names (`CBERS4`).

use std::fmt;
use std::str::FromStr;

/// A satellite whose scenes produce CMASK tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Satellite {
    /// CBERS-4, AWFI sensor, DRD format, UTM projection.
    Cbers4,
    /// CBERS-4A, WFI sensor, RAW format, UTM projection.
    Cbers4a,
    /// AMAZONIA-1, WFI sensor, RAW format, LCC projection.
    Amazonia1,
}

impl Satellite {
    /// All satellites, in the order the acquisition loop visits them.
    pub const ALL: [Satellite; 3] = [Satellite::Cbers4, Satellite::Cbers4a, Satellite::Amazonia1];

    /// Canonical underscored code used in CMASK filenames.
    pub fn code(&self) -> &'static str {
        match self {
            Satellite::Cbers4 => "CBERS_4",
            Satellite::Cbers4a => "CBERS_4A",
            Satellite::Amazonia1 => "AMAZONIA_1",
        }
    }

    /// Hyphenated form stored in the alert table's `satellite` column.
    pub fn db_code(&self) -> &'static str {
        match self {
            Satellite::Cbers4 => "CBERS-4",
            Satellite::Cbers4a => "CBERS-4A",
            Satellite::Amazonia1 => "AMAZONIA-1",
        }
    }

    /// Separator-free directory name under the remote catalog root.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Satellite::Cbers4 => "CBERS4",
            Satellite::Cbers4a => "CBERS4A",
            Satellite::Amazonia1 => "AMAZONIA1",
        }
    }

    /// Imaging sensor encoded in CMASK filenames.
    pub fn sensor(&self) -> &'static str {
        match self {
            Satellite::Cbers4 => "AWFI",
            Satellite::Cbers4a | Satellite::Amazonia1 => "WFI",
        }
    }

    /// File format tag encoded in remote subpath names.
    pub fn format_tag(&self) -> &'static str {
        match self {
            Satellite::Cbers4 => "DRD",
            Satellite::Cbers4a | Satellite::Amazonia1 => "RAW",
        }
    }

    /// Map projection directory component of the download URL.
    pub fn projection(&self) -> &'static str {
        match self {
            Satellite::Cbers4 | Satellite::Cbers4a => "UTM",
            Satellite::Amazonia1 => "LCC",
        }
    }
}

impl fmt::Display for Satellite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when a satellite code cannot be recognized.
#[derive(Debug, thiserror::Error)]
#[error("unknown satellite code: {0}")]
pub struct UnknownSatellite(pub String);

impl FromStr for Satellite {
    type Err = UnknownSatellite;

    /// Accepts both the underscored and the hyphenated spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CBERS_4" | "CBERS-4" => Ok(Satellite::Cbers4),
            "CBERS_4A" | "CBERS-4A" => Ok(Satellite::Cbers4a),
            "AMAZONIA_1" | "AMAZONIA-1" => Ok(Satellite::Amazonia1),
            other => Err(UnknownSatellite(other.to_string())),
        }
    }
}
