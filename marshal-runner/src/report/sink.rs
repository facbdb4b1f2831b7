//! Report sinks
//!
//! A sink stores a rendered report under a requested identifier and returns
//! where it ended up. The report generator never touches storage directly.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

use crate::error::ReportError;

const MAX_NAME_ATTEMPTS: usize = 1000;

/// Destination for rendered reports
pub trait ReportSink: Send + Sync {
    /// Stores `contents` under `identifier`
    ///
    /// # Returns
    /// A human-readable location (file path, object key, ...)
    fn write(&self, identifier: &str, contents: &str) -> Result<String, ReportError>;
}

/// Writes reports as files in a directory
///
/// The directory is created on first write.
#[derive(Debug, Clone)]
pub struct FileSystemSink {
    dir: PathBuf,
}

impl FileSystemSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

impl ReportSink for FileSystemSink {
    /// Never overwrites: a taken name gets a numeric suffix before the
    /// extension (`report.md`, `report_1.md`, ...)
    fn write(&self, identifier: &str, contents: &str) -> Result<String, ReportError> {
        if identifier.is_empty() || identifier.contains(['/', '\\']) {
            return Err(ReportError::Sink(format!(
                "invalid report identifier: {:?}",
                identifier
            )));
        }

        fs::create_dir_all(&self.dir)?;

        let (stem, extension) = match identifier.rfind('.') {
            Some(dot) if dot > 0 => identifier.split_at(dot),
            _ => (identifier, ""),
        };

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = if attempt == 0 {
                identifier.to_string()
            } else {
                format!("{}_{}{}", stem, attempt, extension)
            };
            let path = self.dir.join(&name);

            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };
            file.write_all(contents.as_bytes())?;

            let location = path.display().to_string();
            info!("Report saved to {}", location);
            return Ok(location);
        }

        Err(ReportError::Sink(format!(
            "no free report name for {} in {}",
            identifier,
            self.dir.display()
        )))
    }
}

/// Keeps reports in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<(String, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every stored `(identifier, contents)` pair
    pub fn reports(&self) -> Vec<(String, String)> {
        self.reports
            .lock()
            .map(|reports| reports.clone())
            .unwrap_or_default()
    }
}

impl ReportSink for MemorySink {
    fn write(&self, identifier: &str, contents: &str) -> Result<String, ReportError> {
        let mut reports = self
            .reports
            .lock()
            .map_err(|e| ReportError::Sink(format!("Failed to lock report store: {}", e)))?;
        reports.push((identifier.to_string(), contents.to_string()));
        Ok(format!("memory://{}", identifier))
    }
}
