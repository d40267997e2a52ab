//! Filing sources.
//!
//! The analyzer only needs fully-formed `Filing` values. Fetching and parsing
//! them from the SEC lives outside this crate; `DirectorySource` reads filings
//! that were already converted to JSON.

use crate::types::Filing;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Summary of one filing in a fund's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilingMeta {
    pub accession_number: String,
    pub form_type: String,
    pub filed_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_date: Option<NaiveDate>,
}

impl From<&Filing> for FilingMeta {
    fn from(filing: &Filing) -> Self {
        Self {
            accession_number: filing.accession_number().to_string(),
            form_type: filing.form_type().to_string(),
            filed_date: filing.filed_date(),
            report_date: filing.report_date(),
        }
    }
}

/// Something that can supply a fund's 13F filings.
pub trait FilingSource {
    /// Up to `limit` 13F filings, newest first.
    fn filing_history(&self, limit: usize) -> Result<Vec<FilingMeta>>;

    /// Fetch one filing by accession number.
    fn filing(&self, accession_number: &str) -> Result<Filing>;

    /// The most recent filing.
    fn latest_filing(&self) -> Result<Filing> {
        let history = self.filing_history(1)?;
        let latest = history
            .first()
            .ok_or_else(|| Error::InsufficientData("No 13F filings found".to_string()))?;
        self.filing(&latest.accession_number)
    }

    /// The two most recent filings as `(current, previous)`.
    fn last_two_filings(&self) -> Result<(Filing, Filing)> {
        let history = self.filing_history(2)?;
        match history.as_slice() {
            [current, previous, ..] => Ok((
                self.filing(&current.accession_number)?,
                self.filing(&previous.accession_number)?,
            )),
            _ => Err(Error::InsufficientData(
                "Need at least 2 filings for comparison".to_string(),
            )),
        }
    }
}

/// Filings stored as JSON documents in a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    /// 13F filings, newest first
    filings: Vec<Filing>,
}

impl DirectorySource {
    /// Load every `*.json` filing in `dir`.
    ///
    /// Files that do not parse as a filing, or that are not 13F forms, are
    /// skipped.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let mut filings = Vec::new();

        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::load_filing(&path) {
                Ok(filing) => filings.push(filing),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable filing"),
            }
        }

        debug!(dir = %dir.display(), count = filings.len(), "loaded filings");
        Ok(Self::build(dir, filings))
    }

    /// Build a source from filings already in memory.
    pub fn from_filings(filings: Vec<Filing>) -> Self {
        Self::build(PathBuf::new(), filings)
    }

    fn build(dir: PathBuf, mut filings: Vec<Filing>) -> Self {
        filings.retain(Filing::is_13f);
        filings.sort_by(|a, b| {
            b.filed_date()
                .cmp(&a.filed_date())
                .then_with(|| b.accession_number().cmp(a.accession_number()))
        });
        Self { dir, filings }
    }

    fn load_filing(path: &Path) -> Result<Filing> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.filings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filings.is_empty()
    }
}

impl FilingSource for DirectorySource {
    fn filing_history(&self, limit: usize) -> Result<Vec<FilingMeta>> {
        Ok(self
            .filings
            .iter()
            .take(limit)
            .map(FilingMeta::from)
            .collect())
    }

    fn filing(&self, accession_number: &str) -> Result<Filing> {
        self.filings
            .iter()
            .find(|f| f.accession_number() == accession_number)
            .cloned()
            .ok_or_else(|| Error::FilingNotFound(accession_number.to_string()))
    }
}
