//! Daily reset of the live store
//!
//! The date of the last reset is persisted in a marker file as `YYYY_MM_DD`.
//! At startup the marker is compared with today's date; a missing or stale
//! marker means the live table must be dropped and recreated.

use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

const MARKER_DATE_FORMAT: &str = "%Y_%m_%d";

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to read reset marker {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write reset marker {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Whether a store last reset on `last` must be reset on `today`
pub fn needs_reset(last: Option<NaiveDate>, today: NaiveDate) -> bool {
    last != Some(today)
}

/// Owner of the persisted `last_reset_date`
#[derive(Debug, Clone)]
pub struct LifecycleManager {
    marker_path: PathBuf,
}

impl LifecycleManager {
    pub fn new(marker_path: impl Into<PathBuf>) -> Self {
        Self {
            marker_path: marker_path.into(),
        }
    }

    pub fn marker_path(&self) -> &Path {
        &self.marker_path
    }

    /// Date recorded in the marker. Unreadable contents count as absent.
    pub fn last_reset_date(&self) -> Result<Option<NaiveDate>, LifecycleError> {
        match fs::read_to_string(&self.marker_path) {
            Ok(content) => {
                let content = content.trim();
                let date = NaiveDate::parse_from_str(content, MARKER_DATE_FORMAT).ok();
                if date.is_none() {
                    tracing::warn!(
                        content,
                        path = %self.marker_path.display(),
                        "Ignoring malformed reset marker"
                    );
                }
                Ok(date)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(LifecycleError::Read {
                path: self.marker_path.clone(),
                source,
            }),
        }
    }

    /// Persist `today` as the last reset date
    pub fn record_reset(&self, today: NaiveDate) -> Result<(), LifecycleError> {
        let write_err = |source| LifecycleError::Write {
            path: self.marker_path.clone(),
            source,
        };
        if let Some(parent) = self.marker_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        fs::write(&self.marker_path, today.format(MARKER_DATE_FORMAT).to_string())
            .map_err(write_err)
    }

    /// Decide at startup whether the live store must be reset today
    pub fn check(&self, today: NaiveDate) -> Result<bool, LifecycleError> {
        let last = self.last_reset_date()?;
        let reset = needs_reset(last, today);
        tracing::info!(
            last_reset = ?last,
            today = %today,
            reset,
            "Checked daily reset marker"
        );
        Ok(reset)
    }
}
