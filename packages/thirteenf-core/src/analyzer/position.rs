//! Single-position deltas.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of one CUSIP across two filings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    New,
    Closed,
    Increased,
    Decreased,
    Unchanged,
}

impl ChangeType {
    /// Whether this classification counts as a portfolio change.
    pub fn is_change(self) -> bool {
        !matches!(self, ChangeType::Unchanged)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::New => "new",
            ChangeType::Closed => "closed",
            ChangeType::Increased => "increased",
            ChangeType::Decreased => "decreased",
            ChangeType::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Portfolio weight of `value` within `total`, in percent.
///
/// Returns 0 for an empty (zero-value) portfolio.
pub fn portfolio_weight(value: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (value as f64 / total as f64) * 100.0
}

fn relative_change_pct(current: u64, previous: u64) -> f64 {
    if previous == 0 {
        return if current > 0 { 100.0 } else { 0.0 };
    }
    ((current as f64 - previous as f64) / previous as f64) * 100.0
}

/// The reconciliation of one CUSIP across the current and previous filing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionChange {
    pub issuer: String,
    pub title: String,
    pub cusip: String,
    pub current_shares: u64,
    pub previous_shares: u64,
    pub current_value: u64,
    pub previous_value: u64,
    /// Weight in the current filing (0-100)
    pub current_weight: f64,
    /// Weight in the previous filing (0-100)
    pub previous_weight: f64,
    pub change_type: ChangeType,
}

impl PositionChange {
    /// Absolute change in shares.
    pub fn share_change(&self) -> i128 {
        i128::from(self.current_shares) - i128::from(self.previous_shares)
    }

    /// Percentage change in shares; 100 for a position opened from zero.
    pub fn share_change_pct(&self) -> f64 {
        relative_change_pct(self.current_shares, self.previous_shares)
    }

    /// Absolute change in value.
    pub fn value_change(&self) -> i128 {
        i128::from(self.current_value) - i128::from(self.previous_value)
    }

    /// Percentage change in value; 100 for a position opened from zero.
    pub fn value_change_pct(&self) -> f64 {
        relative_change_pct(self.current_value, self.previous_value)
    }

    /// Change in portfolio weight, in percentage points.
    pub fn weight_change(&self) -> f64 {
        self.current_weight - self.previous_weight
    }
}
