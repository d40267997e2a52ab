//! Last-posted filing state, used to avoid publishing the same filing twice.

use crate::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// The most recently published filing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostState {
    /// SEC accession number of the filing
    pub accession_number: String,
    /// Quarter-end the filing reports on
    pub report_date: NaiveDate,
    /// When the update was published
    pub posted_at: DateTime<Utc>,
    /// Identifiers of the published messages
    #[serde(default)]
    pub output_ids: Vec<String>,
}

/// Single-record state file manager.
#[derive(Debug, Clone)]
pub struct StateManager {
    path: PathBuf,
}

impl StateManager {
    /// Create a state manager with the default path.
    pub fn new() -> Self {
        Self::with_path(Self::default_path())
    }

    /// Create a state manager with a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Get the default state file path.
    ///
    /// Default path: `~/.thirteenf/state.json`
    /// Can be overridden with `THIRTEENF_STATE_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("THIRTEENF_STATE_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".thirteenf/state.json"))
            .unwrap_or_else(|| PathBuf::from(".thirteenf-state.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The last posted filing, if any.
    ///
    /// A missing file or one that cannot be parsed reads as no state.
    pub fn last_posted(&self) -> Option<PostState> {
        if !self.path.exists() {
            return None;
        }

        match self.load() {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable state file");
                None
            }
        }
    }

    fn load(&self) -> Result<PostState> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Record a filing as posted, replacing any previous record.
    pub fn save_posted(
        &self,
        accession_number: &str,
        report_date: NaiveDate,
        output_ids: Vec<String>,
    ) -> Result<PostState> {
        let state = PostState {
            accession_number: accession_number.to_string(),
            report_date,
            posted_at: Utc::now(),
            output_ids,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&state)?;
        fs::write(&self.path, content)?;
        Ok(state)
    }

    /// Whether the given filing was the last one posted.
    pub fn is_already_posted(&self, accession_number: &str) -> bool {
        self.last_posted()
            .map(|last| last.accession_number == accession_number)
            .unwrap_or(false)
    }

    /// Remove the state file.
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}
