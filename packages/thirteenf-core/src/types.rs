//! Core data types for 13F filings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How a position's amount is expressed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ShareType {
    /// Number of shares
    #[default]
    #[serde(rename = "SH")]
    Shares,
    /// Principal amount (debt securities)
    #[serde(rename = "PRN")]
    PrincipalAmount,
}

/// Option exposure reported alongside a holding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PutCall {
    Put,
    Call,
}

/// Investment discretion reported for a holding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum InvestmentDiscretion {
    #[default]
    #[serde(rename = "SOLE")]
    Sole,
    #[serde(rename = "DFND")]
    Defined,
    #[serde(rename = "OTR")]
    Other,
}

/// Voting authority split. Not required to sum to the share count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct VotingAuthority {
    pub sole: u64,
    pub shared: u64,
    pub none: u64,
}

/// One disclosed position within a filing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holding {
    /// Name of the issuer
    pub issuer: String,
    /// Title of class (e.g. "COM", "SPONSORED ADS")
    pub title: String,
    /// CUSIP identifier, unique within a filing
    pub cusip: String,
    /// Reported value, as disclosed
    pub value: u64,
    /// Share count or principal amount
    pub shares: u64,
    #[serde(default)]
    pub share_type: ShareType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put_call: Option<PutCall>,
    #[serde(default)]
    pub investment_discretion: InvestmentDiscretion,
    #[serde(default)]
    pub voting: VotingAuthority,
}

impl Holding {
    /// Create a plain share holding with default discretion and no voting split.
    pub fn new(issuer: &str, title: &str, cusip: &str, value: u64, shares: u64) -> Self {
        Self {
            issuer: issuer.to_string(),
            title: title.to_string(),
            cusip: cusip.to_string(),
            value,
            shares,
            share_type: ShareType::default(),
            put_call: None,
            investment_discretion: InvestmentDiscretion::default(),
            voting: VotingAuthority::default(),
        }
    }

    pub fn with_share_type(mut self, share_type: ShareType) -> Self {
        self.share_type = share_type;
        self
    }

    pub fn with_put_call(mut self, put_call: PutCall) -> Self {
        self.put_call = Some(put_call);
        self
    }

    pub fn with_voting(mut self, sole: u64, shared: u64, none: u64) -> Self {
        self.voting = VotingAuthority { sole, shared, none };
        self
    }

    /// Whether this line reports an option position rather than the underlying.
    pub fn is_option(&self) -> bool {
        self.put_call.is_some()
    }
}

/// One point-in-time 13F disclosure.
///
/// Built once from parsed source data and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Filing {
    accession_number: String,
    filed_date: NaiveDate,
    #[serde(default)]
    report_date: Option<NaiveDate>,
    form_type: String,
    #[serde(default)]
    holdings: Vec<Holding>,
}

impl Filing {
    /// Create a new filing.
    pub fn new(
        accession_number: &str,
        filed_date: NaiveDate,
        report_date: Option<NaiveDate>,
        form_type: &str,
        holdings: Vec<Holding>,
    ) -> Self {
        Self {
            accession_number: accession_number.to_string(),
            filed_date,
            report_date,
            form_type: form_type.to_string(),
            holdings,
        }
    }

    pub fn accession_number(&self) -> &str {
        &self.accession_number
    }

    pub fn filed_date(&self) -> NaiveDate {
        self.filed_date
    }

    pub fn report_date(&self) -> Option<NaiveDate> {
        self.report_date
    }

    pub fn form_type(&self) -> &str {
        &self.form_type
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    /// The quarter-end the filing reports on, falling back to the filed date.
    pub fn as_of_date(&self) -> NaiveDate {
        self.report_date.unwrap_or(self.filed_date)
    }

    /// Holdings indexed by CUSIP. A repeated CUSIP keeps its last occurrence.
    pub fn holdings_by_cusip(&self) -> BTreeMap<&str, &Holding> {
        self.holdings
            .iter()
            .map(|h| (h.cusip.as_str(), h))
            .collect()
    }

    /// CUSIPs that appear more than once in this filing, sorted.
    pub fn duplicate_cusips(&self) -> Vec<&str> {
        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        for holding in &self.holdings {
            if !seen.insert(holding.cusip.as_str()) {
                duplicates.insert(holding.cusip.as_str());
            }
        }
        duplicates.into_iter().collect()
    }

    /// Total portfolio value.
    ///
    /// Duplicate CUSIPs are counted once (last occurrence), matching
    /// `holdings_by_cusip`. Saturates at `u64::MAX`.
    pub fn total_value(&self) -> u64 {
        self.holdings_by_cusip()
            .values()
            .fold(0u64, |total, h| total.saturating_add(h.value))
    }

    /// Number of holding records in the filing.
    pub fn position_count(&self) -> usize {
        self.holdings.len()
    }

    /// Whether the form type is a 13F holdings report or amendment.
    pub fn is_13f(&self) -> bool {
        self.form_type.contains("13F")
    }
}

/// API response wrapper used for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
