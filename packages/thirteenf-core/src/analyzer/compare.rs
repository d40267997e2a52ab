//! Filing comparison and position classification.

use super::changes::PortfolioChanges;
use super::position::{portfolio_weight, ChangeType, PositionChange};
use crate::types::{Filing, Holding};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Default minimum weight change, in percentage points.
pub const DEFAULT_SIGNIFICANCE_THRESHOLD: f64 = 0.5;

/// Compares consecutive filings and classifies every position.
///
/// Deserializing goes through the same threshold check as `try_new`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AnalyzerSettings")]
pub struct PortfolioAnalyzer {
    significance_threshold: f64,
}

#[derive(Deserialize)]
struct AnalyzerSettings {
    #[serde(default = "default_threshold")]
    significance_threshold: f64,
}

fn default_threshold() -> f64 {
    DEFAULT_SIGNIFICANCE_THRESHOLD
}

impl TryFrom<AnalyzerSettings> for PortfolioAnalyzer {
    type Error = Error;

    fn try_from(settings: AnalyzerSettings) -> Result<Self> {
        Self::try_new(settings.significance_threshold)
    }
}

impl Default for PortfolioAnalyzer {
    fn default() -> Self {
        Self {
            significance_threshold: DEFAULT_SIGNIFICANCE_THRESHOLD,
        }
    }
}

impl PortfolioAnalyzer {
    /// Create an analyzer with the given significance threshold (percentage points).
    ///
    /// The threshold must be finite and non-negative.
    pub fn try_new(significance_threshold: f64) -> Result<Self> {
        if !significance_threshold.is_finite() || significance_threshold < 0.0 {
            return Err(Error::InvalidThreshold(significance_threshold));
        }
        Ok(Self {
            significance_threshold,
        })
    }

    pub fn significance_threshold(&self) -> f64 {
        self.significance_threshold
    }

    /// Compare two filings and classify every CUSIP found in either.
    ///
    /// Weights are computed against each filing's own total value. A filing
    /// with zero total value gives every holding a weight of 0.
    pub fn compare(&self, current: &Filing, previous: &Filing) -> Result<PortfolioChanges> {
        let current_by_cusip = index_holdings(current);
        let previous_by_cusip = index_holdings(previous);
        let current_total = current.total_value();
        let previous_total = previous.total_value();

        let mut changes = PortfolioChanges::new(
            current.as_of_date(),
            previous.as_of_date(),
            current_total,
            previous_total,
        );

        let all_cusips: BTreeSet<&str> = current_by_cusip
            .keys()
            .chain(previous_by_cusip.keys())
            .copied()
            .collect();

        for cusip in all_cusips {
            let change = self.analyze_position(
                current_by_cusip.get(cusip).copied(),
                previous_by_cusip.get(cusip).copied(),
                current_total,
                previous_total,
            )?;
            changes.push(change);
        }

        changes.rank();

        debug!(
            current = current.accession_number(),
            previous = previous.accession_number(),
            new = changes.new_positions().len(),
            closed = changes.closed_positions().len(),
            increased = changes.increased_positions().len(),
            decreased = changes.decreased_positions().len(),
            unchanged = changes.unchanged_positions().len(),
            "compared filings"
        );

        Ok(changes)
    }

    /// Reconcile one CUSIP's current and previous holding.
    ///
    /// Returns `Error::InvalidInput` if both sides are absent.
    pub fn analyze_position(
        &self,
        current: Option<&Holding>,
        previous: Option<&Holding>,
        current_total: u64,
        previous_total: u64,
    ) -> Result<PositionChange> {
        match (current, previous) {
            (None, None) => Err(Error::InvalidInput(
                "both current and previous holdings are absent".to_string(),
            )),
            (None, Some(prev)) => Ok(PositionChange {
                issuer: prev.issuer.clone(),
                title: prev.title.clone(),
                cusip: prev.cusip.clone(),
                current_shares: 0,
                previous_shares: prev.shares,
                current_value: 0,
                previous_value: prev.value,
                current_weight: 0.0,
                previous_weight: portfolio_weight(prev.value, previous_total),
                change_type: ChangeType::Closed,
            }),
            (Some(curr), None) => Ok(PositionChange {
                issuer: curr.issuer.clone(),
                title: curr.title.clone(),
                cusip: curr.cusip.clone(),
                current_shares: curr.shares,
                previous_shares: 0,
                current_value: curr.value,
                previous_value: 0,
                current_weight: portfolio_weight(curr.value, current_total),
                previous_weight: 0.0,
                change_type: ChangeType::New,
            }),
            (Some(curr), Some(prev)) => {
                let current_weight = portfolio_weight(curr.value, current_total);
                let previous_weight = portfolio_weight(prev.value, previous_total);
                Ok(PositionChange {
                    issuer: curr.issuer.clone(),
                    title: curr.title.clone(),
                    cusip: curr.cusip.clone(),
                    current_shares: curr.shares,
                    previous_shares: prev.shares,
                    current_value: curr.value,
                    previous_value: prev.value,
                    current_weight,
                    previous_weight,
                    change_type: self.classify(current_weight - previous_weight),
                })
            }
        }
    }

    /// Classify a held position by its weight change. Both bounds are strict.
    pub fn classify(&self, weight_change: f64) -> ChangeType {
        if weight_change > self.significance_threshold {
            ChangeType::Increased
        } else if weight_change < -self.significance_threshold {
            ChangeType::Decreased
        } else {
            ChangeType::Unchanged
        }
    }
}

fn index_holdings(filing: &Filing) -> BTreeMap<&str, &Holding> {
    let duplicates = filing.duplicate_cusips();
    if !duplicates.is_empty() {
        warn!(
            accession = filing.accession_number(),
            ?duplicates,
            "filing repeats CUSIPs, keeping the last occurrence of each"
        );
    }
    filing.holdings_by_cusip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn filing(accession: &str, report: NaiveDate, holdings: Vec<Holding>) -> Filing {
        Filing::new(accession, report, Some(report), "13F-HR", holdings)
    }

    fn holding(cusip: &str, value: u64, shares: u64) -> Holding {
        Holding::new(&format!("ISSUER {cusip}"), "COM", cusip, value, shares)
    }

    #[test]
    fn test_default_threshold() {
        let analyzer = PortfolioAnalyzer::default();
        assert_eq!(analyzer.significance_threshold(), DEFAULT_SIGNIFICANCE_THRESHOLD);
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(matches!(
            PortfolioAnalyzer::try_new(-0.1),
            Err(Error::InvalidThreshold(_))
        ));
        assert!(PortfolioAnalyzer::try_new(f64::NAN).is_err());
        assert!(PortfolioAnalyzer::try_new(0.0).is_ok());
    }

    #[test]
    fn test_deserialize_validates_threshold() {
        let negative = serde_json::from_str::<PortfolioAnalyzer>(r#"{"significance_threshold": -1.0}"#);
        assert!(negative.is_err());

        let analyzer: PortfolioAnalyzer =
            serde_json::from_str(r#"{"significance_threshold": 1.5}"#).unwrap();
        assert_eq!(analyzer.significance_threshold(), 1.5);

        let defaulted: PortfolioAnalyzer = serde_json::from_str("{}").unwrap();
        assert_eq!(defaulted, PortfolioAnalyzer::default());

        let json = serde_json::to_string(&analyzer).unwrap();
        assert_eq!(serde_json::from_str::<PortfolioAnalyzer>(&json).unwrap(), analyzer);
    }

    #[test]
    fn test_increased_position_becomes_top_buy() {
        let current = filing(
            "cur",
            date(2024, 6, 30),
            vec![holding("AAAAAAAAA", 20_000_000, 200), holding("ZZZZZZZZZ", 80_000_000, 800)],
        );
        let previous = filing(
            "prev",
            date(2024, 3, 31),
            vec![holding("AAAAAAAAA", 8_000_000, 100), holding("ZZZZZZZZZ", 72_000_000, 900)],
        );

        let changes = PortfolioAnalyzer::default().compare(&current, &previous).unwrap();
        let pos = &changes.increased_positions()[0];
        assert_eq!(pos.cusip, "AAAAAAAAA");
        assert_relative_eq!(pos.current_weight, 20.0);
        assert_relative_eq!(pos.previous_weight, 10.0);
        assert_relative_eq!(pos.weight_change(), 10.0);
        assert_eq!(changes.top_buys(1)[0].cusip, "AAAAAAAAA");
        assert_eq!(changes.decreased_positions()[0].cusip, "ZZZZZZZZZ");
    }

    #[test]
    fn test_new_position() {
        let current = filing(
            "cur",
            date(2024, 6, 30),
            vec![holding("NEWNEWNEW", 5_000_000, 50), holding("OLDOLDOLD", 45_000_000, 10)],
        );
        let previous = filing("prev", date(2024, 3, 31), vec![holding("OLDOLDOLD", 45_000_000, 10)]);

        let changes = PortfolioAnalyzer::default().compare(&current, &previous).unwrap();
        assert_eq!(changes.new_positions().len(), 1);
        let pos = &changes.new_positions()[0];
        assert_eq!(pos.change_type, ChangeType::New);
        assert_relative_eq!(pos.current_weight, 10.0);
        assert_eq!(pos.previous_weight, 0.0);
        assert_eq!(pos.previous_shares, 0);
        assert_eq!(pos.previous_value, 0);
    }

    #[test]
    fn test_closed_position() {
        let current = filing("cur", date(2024, 6, 30), vec![holding("KEEPKEEPK", 10, 1)]);
        let previous = filing(
            "prev",
            date(2024, 3, 31),
            vec![holding("KEEPKEEPK", 75, 1), holding("GONEGONEG", 25, 4)],
        );

        let changes = PortfolioAnalyzer::default().compare(&current, &previous).unwrap();
        let pos = &changes.closed_positions()[0];
        assert_eq!(pos.cusip, "GONEGONEG");
        assert_eq!(pos.current_shares, 0);
        assert_eq!(pos.current_value, 0);
        assert_eq!(pos.current_weight, 0.0);
        assert_relative_eq!(pos.previous_weight, 25.0);
        assert_eq!(pos.previous_shares, 4);
    }

    #[test]
    fn test_identical_filings_have_no_changes() {
        let holdings = vec![holding("AAAAAAAAA", 300, 3), holding("BBBBBBBBB", 700, 7)];
        let current = filing("cur", date(2024, 6, 30), holdings.clone());
        let previous = filing("prev", date(2024, 3, 31), holdings);

        let changes = PortfolioAnalyzer::default().compare(&current, &previous).unwrap();
        assert!(!changes.has_changes());
        assert_eq!(changes.change_count(), 0);
        assert_eq!(changes.unchanged_positions().len(), 2);
    }

    #[test]
    fn test_threshold_boundary_is_unchanged() {
        let analyzer = PortfolioAnalyzer::try_new(0.5).unwrap();
        assert_eq!(analyzer.classify(0.5), ChangeType::Unchanged);
        assert_eq!(analyzer.classify(-0.5), ChangeType::Unchanged);
        assert_eq!(analyzer.classify(0.5001), ChangeType::Increased);
        assert_eq!(analyzer.classify(-0.5001), ChangeType::Decreased);
    }

    #[test]
    fn test_zero_total_value_degrades_to_zero_weights() {
        let current = filing("cur", date(2024, 6, 30), vec![holding("AAAAAAAAA", 0, 10)]);
        let previous = filing("prev", date(2024, 3, 31), vec![holding("AAAAAAAAA", 0, 5)]);

        let changes = PortfolioAnalyzer::default().compare(&current, &previous).unwrap();
        let pos = &changes.unchanged_positions()[0];
        assert_eq!(pos.current_weight, 0.0);
        assert_eq!(pos.previous_weight, 0.0);
        assert_eq!(changes.total_value_change_pct(), 0.0);
    }

    #[test]
    fn test_empty_filings() {
        let current = filing("cur", date(2024, 6, 30), Vec::new());
        let previous = filing("prev", date(2024, 3, 31), Vec::new());

        let changes = PortfolioAnalyzer::default().compare(&current, &previous).unwrap();
        assert_eq!(changes.positions().count(), 0);
        assert!(!changes.has_changes());
    }

    #[test]
    fn test_both_absent_is_invalid_input() {
        let result = PortfolioAnalyzer::default().analyze_position(None, None, 100, 100);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_duplicate_cusip_last_write_wins() {
        let current = filing(
            "cur",
            date(2024, 6, 30),
            vec![holding("AAAAAAAAA", 10, 1), holding("AAAAAAAAA", 40, 4)],
        );
        let previous = filing("prev", date(2024, 3, 31), vec![holding("AAAAAAAAA", 40, 4)]);

        let changes = PortfolioAnalyzer::default().compare(&current, &previous).unwrap();
        assert_eq!(changes.current_total_value(), 40);
        let pos = changes.find("AAAAAAAAA").unwrap();
        assert_eq!(pos.current_shares, 4);
        assert_eq!(pos.change_type, ChangeType::Unchanged);
    }

    #[test]
    fn test_dates_use_report_date() {
        let current = Filing::new("cur", date(2024, 8, 14), None, "13F-HR", Vec::new());
        let previous = filing("prev", date(2024, 3, 31), Vec::new());

        let changes = PortfolioAnalyzer::default().compare(&current, &previous).unwrap();
        assert_eq!(changes.current_date(), date(2024, 8, 14));
        assert_eq!(changes.previous_date(), date(2024, 3, 31));
    }
}
