//! Simulation history log.
use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::risk::RiskReport;
use crate::simulation::SimulationResult;
use crate::summary::SimulationSummary;

/// One logged run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub logged_at: DateTime<Utc>,
    pub mission_name: String,
    /// When the run itself completed.
    pub timestamp: DateTime<Utc>,
    pub summary: SimulationSummary,
    pub risk_analysis: RiskReport,
}

impl HistoryEntry {
    #[must_use]
    pub fn from_result(result: &SimulationResult, logged_at: DateTime<Utc>) -> Self {
        Self {
            logged_at,
            mission_name: result.mission_name.clone(),
            timestamp: result.timestamp,
            summary: result.simulation_summary.clone(),
            risk_analysis: result.risk_analysis.clone(),
        }
    }
}

/// Storage for past simulation runs.
pub trait HistoryStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Append `result` to the log.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be persisted.
    fn record(&self, result: &SimulationResult) -> Result<(), Self::Error>;

    /// Up to `limit` entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read.
    fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, Self::Error>;
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("history line {line} is corrupt: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode history entry: {0}")]
    Encode(#[source] serde_json::Error),
}

fn newest_first(mut entries: Vec<HistoryEntry>, limit: usize) -> Vec<HistoryEntry> {
    entries.sort_by(|a, b| b.logged_at.cmp(&a.logged_at));
    entries.truncate(limit);
    entries
}

/// Append-only JSON Lines file, one entry per line.
#[derive(Debug, Clone)]
pub struct JsonlHistory {
    path: PathBuf,
}

impl JsonlHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Append a prepared entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory or file cannot be written.
    pub fn append(&self, entry: &HistoryEntry) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let mut line = serde_json::to_string(entry).map_err(HistoryError::Encode)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| self.io_error(e))?;
        debug!("logged {} to {}", entry.mission_name, self.path.display());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(err)),
        };
        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| self.io_error(e))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|source| HistoryError::Corrupt {
                line: index + 1,
                source,
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }
}

impl HistoryStore for JsonlHistory {
    type Error = HistoryError;

    fn record(&self, result: &SimulationResult) -> Result<(), HistoryError> {
        self.append(&HistoryEntry::from_result(result, Utc::now()))
    }

    fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, HistoryError> {
        Ok(newest_first(self.read_all()?, limit))
    }
}

/// In-process history.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    entries: RefCell<Vec<HistoryEntry>>,
}

impl MemoryHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl HistoryStore for MemoryHistory {
    type Error = std::convert::Infallible;

    fn record(&self, result: &SimulationResult) -> Result<(), Self::Error> {
        self.entries
            .borrow_mut()
            .push(HistoryEntry::from_result(result, Utc::now()));
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, Self::Error> {
        Ok(newest_first(self.entries.borrow().clone(), limit))
    }
}
