//! JSON export of both outage tables.
//!
//! Produces `outage_events.json` and `outage_tracker.json` as pretty-printed
//! arrays ordered by outage identifier.

use std::io;
use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use thiserror::Error;

use crate::domain::ports::{OutageStore, OutageStoreError, TrackerStore, TrackerStoreError};
use crate::domain::{StoredOutageEvent, TrackedOutage};

/// File name for the raw event export.
pub const EVENTS_FILENAME: &str = "outage_events.json";
/// File name for the lifecycle export.
pub const TRACKER_FILENAME: &str = "outage_tracker.json";

/// Errors surfaced while exporting outage tables.
#[derive(Debug, Error)]
pub enum OutageExportError {
    /// Reading the raw event table failed.
    #[error(transparent)]
    Events(#[from] OutageStoreError),
    /// Reading the lifecycle table failed.
    #[error(transparent)]
    Tracker(#[from] TrackerStoreError),
    /// Rows could not be rendered as JSON.
    #[error("failed to serialise {file}: {message}")]
    Serialise {
        /// Export file being rendered.
        file: &'static str,
        /// Serializer error text.
        message: String,
    },
    /// The output directory or a file in it could not be written.
    #[error("filesystem operation failed ({path}): {message}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error text.
        message: String,
    },
}

impl OutageExportError {
    fn io(path: impl Into<PathBuf>, error: &io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: error.to_string(),
        }
    }
}

/// Contents of both tables at the time of export.
#[derive(Debug, Clone, PartialEq)]
pub struct OutageExport {
    /// Raw events ordered by identifier.
    pub events: Vec<StoredOutageEvent>,
    /// Lifecycles ordered by identifier.
    pub tracked: Vec<TrackedOutage>,
}

/// Paths written by [`OutageExport::write_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifacts {
    /// Location of `outage_events.json`.
    pub events_path: PathBuf,
    /// Location of `outage_tracker.json`.
    pub tracker_path: PathBuf,
}

impl OutageExport {
    /// Read both tables.
    pub async fn collect(
        outage_store: &dyn OutageStore,
        tracker_store: &dyn TrackerStore,
    ) -> Result<Self, OutageExportError> {
        let events = outage_store.list_events().await?;
        let tracked = tracker_store.list_tracked().await?;
        Ok(Self { events, tracked })
    }

    /// Render the raw events as pretty JSON.
    pub fn events_json(&self) -> Result<String, OutageExportError> {
        render(&self.events, EVENTS_FILENAME)
    }

    /// Render the lifecycles as pretty JSON.
    pub fn tracker_json(&self) -> Result<String, OutageExportError> {
        render(&self.tracked, TRACKER_FILENAME)
    }

    /// Write both files into `output_dir`, creating it when missing.
    pub fn write_to(&self, output_dir: &Path) -> Result<ExportArtifacts, OutageExportError> {
        let events = self.events_json()?;
        let tracker = self.tracker_json()?;

        Dir::create_ambient_dir_all(output_dir, ambient_authority())
            .map_err(|error| OutageExportError::io(output_dir, &error))?;
        let directory = Dir::open_ambient_dir(output_dir, ambient_authority())
            .map_err(|error| OutageExportError::io(output_dir, &error))?;

        let events_path = output_dir.join(EVENTS_FILENAME);
        directory
            .write(EVENTS_FILENAME, events.as_bytes())
            .map_err(|error| OutageExportError::io(&events_path, &error))?;
        let tracker_path = output_dir.join(TRACKER_FILENAME);
        directory
            .write(TRACKER_FILENAME, tracker.as_bytes())
            .map_err(|error| OutageExportError::io(&tracker_path, &error))?;

        Ok(ExportArtifacts {
            events_path,
            tracker_path,
        })
    }
}

fn render<T: serde::Serialize>(rows: &[T], file: &'static str) -> Result<String, OutageExportError> {
    serde_json::to_string_pretty(rows).map_err(|error| OutageExportError::Serialise {
        file,
        message: error.to_string(),
    })
}
