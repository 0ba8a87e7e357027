//! Observation log for non-nominal vendor responses.
//!
//! A run's audit trail: every status or prompt observation that is not
//! the steady-state "experiment running, no prompt" pair, plus
//! lifecycle marks. The log exists for post-mortems on overnight runs,
//! so write failures degrade to a warning and never fail the run.

use chrono::Local;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

fn timestamp() -> String {
    Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Append-only, timestamped observation log.
///
/// Starts inert; [`ObservationLog::open`] attaches a file. All methods
/// are no-ops while inert, so callers record unconditionally.
#[derive(Default)]
pub struct ObservationLog {
    file: Mutex<Option<File>>,
    path: Mutex<Option<PathBuf>>,
}

impl ObservationLog {
    /// Creates an inert log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a `status_<timestamp>.log` file under `dir`, creating
    /// the directory if needed. Replaces any previously attached file.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error; callers typically degrade it
    /// to a warning and continue unrecorded.
    pub fn open(&self, dir: &Path) -> std::io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("status_{}.log", timestamp()));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        *self.file.lock() = Some(file);
        *self.path.lock() = Some(path.clone());
        debug!(path = %path.display(), "observation log opened");
        Ok(path)
    }

    /// Returns `true` while a file is attached.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.file.lock().is_some()
    }

    /// The attached file's path, if any.
    #[must_use]
    pub fn path(&self) -> Option<PathBuf> {
        self.path.lock().clone()
    }

    /// Appends one timestamped observation line.
    pub fn observe(&self, text: &str) {
        self.write_line(&format!("{} {text}", timestamp()));
    }

    /// Appends a lifecycle mark, set off from observations.
    pub fn mark(&self, label: &str) {
        self.write_line(&format!("{} ===== {label} =====", timestamp()));
    }

    /// Detaches the file, flushing it.
    pub fn close(&self) {
        if let Some(mut file) = self.file.lock().take() {
            if let Err(error) = file.flush() {
                warn!(%error, "failed to flush observation log");
            }
        }
        *self.path.lock() = None;
    }

    fn write_line(&self, line: &str) {
        let mut guard = self.file.lock();
        let Some(file) = guard.as_mut() else {
            return;
        };
        if let Err(error) = writeln!(file, "{line}") {
            warn!(%error, "failed to write observation log line");
        }
    }
}
