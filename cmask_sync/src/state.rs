//! Acquisition state: the per-biome control file and the run decision.
//!
//! The control file is the only durable cross-run artifact. It records the
//! last successfully processed publish month and how many tiles that run
//! found, and is read by both the next acquisition run (recency check) and
//! the zonal run (mosaic selection). An absent or unparsable file is treated
//! as "no prior run".

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::errors::EtlError;

/// File name of the acquisition control file inside the biome directory.
pub const CONTROL_FILE_NAME: &str = "acquisition_data_control";

/// Durable state written after a successful acquisition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionState {
    /// Publish month of the last successful run (first day of month).
    pub previous_month: NaiveDate,
    /// Number of tiles written by that run, kept for audit.
    pub found_items: u32,
}

/// Where the acquisition run stands for the current invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No prior control file (or unreadable); the first run proceeds.
    NoPriorState,
    /// The newest closed month was already processed; nothing to do.
    AwaitingClose,
    /// A new closed month (or an override) is ready to process.
    Ready,
    /// A run completed and persisted its state; folds back into
    /// [`Phase::NoPriorState`]/[`Phase::AwaitingClose`] on the next read.
    Processed,
}

/// Outcome of the run decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Download tiles for `target` this run.
    Proceed {
        /// Target publish month.
        target: NaiveDate,
    },
    /// Exit without downloading.
    Skip {
        /// Phase explaining why the run is a no-op.
        phase: Phase,
    },
}

/// Decides whether this invocation should download, and for which month.
///
/// Precedence: a forced month wins unconditionally, then the daily bypass,
/// then the normal recency check against the persisted previous month. The
/// bypass still requires a closed month to exist; it only skips the "newer
/// than last time" comparison so catch-up windows can re-run daily.
pub fn decide(
    force_month: Option<NaiveDate>,
    every_day: bool,
    previous: Option<NaiveDate>,
    last_closed: Option<NaiveDate>,
) -> Decision {
    if let Some(target) = force_month {
        return Decision::Proceed { target };
    }

    let Some(closed) = last_closed else {
        return Decision::Skip {
            phase: match previous {
                Some(_) => Phase::AwaitingClose,
                None => Phase::NoPriorState,
            },
        };
    };

    if every_day {
        return Decision::Proceed { target: closed };
    }

    match previous {
        None => Decision::Proceed { target: closed },
        Some(prev) if closed > prev => Decision::Proceed { target: closed },
        Some(_) => Decision::Skip {
            phase: Phase::AwaitingClose,
        },
    }
}

/// Path of the control file inside `biome_dir`.
pub fn control_file_path(biome_dir: &Path) -> PathBuf {
    biome_dir.join(CONTROL_FILE_NAME)
}

/// Reads the persisted acquisition state, leniently.
///
/// Returns `None` when the file is absent, unreadable or does not contain a
/// parsable `PREVIOUS_MONTH` line.
pub fn read_state(biome_dir: &Path) -> Option<AcquisitionState> {
    let path = control_file_path(biome_dir);
    let text = match fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no readable control file");
            return None;
        }
    };

    let mut previous_month = None;
    let mut found_items = 0u32;
    for line in text.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key.trim() {
            "PREVIOUS_MONTH" => {
                let value = value.trim().trim_matches('"');
                previous_month = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok();
            }
            "found_items" => {
                found_items = value.trim().parse().unwrap_or(0);
            }
            _ => {}
        }
    }

    match previous_month {
        Some(previous_month) => Some(AcquisitionState {
            previous_month,
            found_items,
        }),
        None => {
            warn!(path = %path.display(), "control file present but unparsable, ignoring");
            None
        }
    }
}

/// Atomically writes the control file (temp file in the same directory, then
/// rename), so a crash mid-write never leaves a truncated file behind.
pub fn write_state(biome_dir: &Path, state: &AcquisitionState) -> Result<(), EtlError> {
    let mut tmp = tempfile::NamedTempFile::new_in(biome_dir)?;
    writeln!(
        tmp,
        "PREVIOUS_MONTH=\"{}\"",
        state.previous_month.format("%Y-%m-%d")
    )?;
    write!(tmp, "found_items={}", state.found_items)?;
    tmp.persist(control_file_path(biome_dir))
        .map_err(|e| EtlError::Io(e.error))?;
    Ok(())
}

/// Removes the control file if present. Called from the orchestrator's
/// failure branch when a run aborted after it started writing.
pub fn remove_control_file(biome_dir: &Path) -> Result<(), EtlError> {
    let path = control_file_path(biome_dir);
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}
