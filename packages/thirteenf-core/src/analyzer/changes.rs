//! The classified change-set for one filing pair and its ranking queries.

use super::position::{ChangeType, PositionChange};
use chrono::NaiveDate;
use serde::Serialize;
use std::borrow::Borrow;

/// Sort descending by `key`, ties broken by CUSIP so the order is total.
fn rank_desc<T, F>(positions: &mut [T], key: F)
where
    T: Borrow<PositionChange>,
    F: Fn(&PositionChange) -> f64,
{
    positions.sort_by(|a, b| {
        let (a, b): (&PositionChange, &PositionChange) = (a.borrow(), b.borrow());
        key(b).total_cmp(&key(a)).then_with(|| a.cusip.cmp(&b.cusip))
    });
}

/// All position changes between a current and a previous filing.
///
/// The five lists are disjoint by CUSIP and sorted once when the set is built.
/// Only `PortfolioAnalyzer::compare` constructs one.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PortfolioChanges {
    current_date: NaiveDate,
    previous_date: NaiveDate,
    current_total_value: u64,
    previous_total_value: u64,
    new_positions: Vec<PositionChange>,
    closed_positions: Vec<PositionChange>,
    increased_positions: Vec<PositionChange>,
    decreased_positions: Vec<PositionChange>,
    unchanged_positions: Vec<PositionChange>,
}

impl PortfolioChanges {
    pub(crate) fn new(
        current_date: NaiveDate,
        previous_date: NaiveDate,
        current_total_value: u64,
        previous_total_value: u64,
    ) -> Self {
        Self {
            current_date,
            previous_date,
            current_total_value,
            previous_total_value,
            new_positions: Vec::new(),
            closed_positions: Vec::new(),
            increased_positions: Vec::new(),
            decreased_positions: Vec::new(),
            unchanged_positions: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, change: PositionChange) {
        let list = match change.change_type {
            ChangeType::New => &mut self.new_positions,
            ChangeType::Closed => &mut self.closed_positions,
            ChangeType::Increased => &mut self.increased_positions,
            ChangeType::Decreased => &mut self.decreased_positions,
            ChangeType::Unchanged => &mut self.unchanged_positions,
        };
        list.push(change);
    }

    /// Apply the presentation order to every list.
    pub(crate) fn rank(&mut self) {
        rank_desc(&mut self.new_positions, |p| p.current_weight);
        rank_desc(&mut self.closed_positions, |p| p.previous_weight);
        rank_desc(&mut self.increased_positions, |p| p.weight_change());
        rank_desc(&mut self.decreased_positions, |p| p.weight_change().abs());
        self.unchanged_positions.sort_by(|a, b| a.cusip.cmp(&b.cusip));
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    pub fn previous_date(&self) -> NaiveDate {
        self.previous_date
    }

    pub fn current_total_value(&self) -> u64 {
        self.current_total_value
    }

    pub fn previous_total_value(&self) -> u64 {
        self.previous_total_value
    }

    /// Positions opened since the previous filing, largest current weight first.
    pub fn new_positions(&self) -> &[PositionChange] {
        &self.new_positions
    }

    /// Positions exited since the previous filing, largest previous weight first.
    pub fn closed_positions(&self) -> &[PositionChange] {
        &self.closed_positions
    }

    /// Positions whose weight rose by more than the threshold.
    pub fn increased_positions(&self) -> &[PositionChange] {
        &self.increased_positions
    }

    /// Positions whose weight fell by more than the threshold.
    pub fn decreased_positions(&self) -> &[PositionChange] {
        &self.decreased_positions
    }

    pub fn unchanged_positions(&self) -> &[PositionChange] {
        &self.unchanged_positions
    }

    /// Iterate over every classified position.
    pub fn positions(&self) -> impl Iterator<Item = &PositionChange> {
        self.new_positions
            .iter()
            .chain(&self.closed_positions)
            .chain(&self.increased_positions)
            .chain(&self.decreased_positions)
            .chain(&self.unchanged_positions)
    }

    /// Look up the change for a CUSIP.
    pub fn find(&self, cusip: &str) -> Option<&PositionChange> {
        self.positions().find(|p| p.cusip == cusip)
    }

    /// Total portfolio value change.
    pub fn total_value_change(&self) -> i128 {
        i128::from(self.current_total_value) - i128::from(self.previous_total_value)
    }

    /// Total portfolio value change percentage.
    ///
    /// Unlike per-position percentages, a zero previous total yields 0.
    pub fn total_value_change_pct(&self) -> f64 {
        if self.previous_total_value == 0 {
            return 0.0;
        }
        (self.total_value_change() as f64 / self.previous_total_value as f64) * 100.0
    }

    /// Whether any position was opened, closed, increased or decreased.
    pub fn has_changes(&self) -> bool {
        self.change_count() > 0
    }

    /// Number of opened, closed, increased and decreased positions.
    pub fn change_count(&self) -> usize {
        self.new_positions.len()
            + self.closed_positions.len()
            + self.increased_positions.len()
            + self.decreased_positions.len()
    }

    /// Top `n` new or increased positions by weight change.
    pub fn top_buys(&self, n: usize) -> Vec<&PositionChange> {
        let mut buys: Vec<&PositionChange> = self
            .new_positions
            .iter()
            .chain(&self.increased_positions)
            .collect();
        rank_desc(&mut buys, |p| p.weight_change());
        buys.truncate(n);
        buys
    }

    /// Top `n` closed or decreased positions by size of weight change.
    pub fn top_sells(&self, n: usize) -> Vec<&PositionChange> {
        let mut sells: Vec<&PositionChange> = self
            .closed_positions
            .iter()
            .chain(&self.decreased_positions)
            .collect();
        rank_desc(&mut sells, |p| p.weight_change().abs());
        sells.truncate(n);
        sells
    }

    /// Top `n` still-held positions by current weight. Closed positions are excluded.
    pub fn top_holdings(&self, n: usize) -> Vec<&PositionChange> {
        let mut held: Vec<&PositionChange> = self
            .new_positions
            .iter()
            .chain(&self.increased_positions)
            .chain(&self.decreased_positions)
            .chain(&self.unchanged_positions)
            .collect();
        rank_desc(&mut held, |p| p.current_weight);
        held.truncate(n);
        held
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pos(
        cusip: &str,
        current_weight: f64,
        previous_weight: f64,
        change_type: ChangeType,
    ) -> PositionChange {
        PositionChange {
            issuer: format!("ISSUER {cusip}"),
            title: "COM".to_string(),
            cusip: cusip.to_string(),
            current_shares: 0,
            previous_shares: 0,
            current_value: 0,
            previous_value: 0,
            current_weight,
            previous_weight,
            change_type,
        }
    }

    fn sample_changes() -> PortfolioChanges {
        let mut changes =
            PortfolioChanges::new(date(2024, 6, 30), date(2024, 3, 31), 1_200, 1_000);
        changes.push(pos("NEW000001", 3.0, 0.0, ChangeType::New));
        changes.push(pos("NEW000002", 8.0, 0.0, ChangeType::New));
        changes.push(pos("CLS000001", 0.0, 6.0, ChangeType::Closed));
        changes.push(pos("INC000001", 15.0, 10.0, ChangeType::Increased));
        changes.push(pos("INC000002", 12.0, 11.0, ChangeType::Increased));
        changes.push(pos("DEC000001", 20.0, 27.0, ChangeType::Decreased));
        changes.push(pos("DEC000002", 4.0, 5.5, ChangeType::Decreased));
        changes.push(pos("UNC000001", 30.0, 30.2, ChangeType::Unchanged));
        changes.rank();
        changes
    }

    fn cusips(list: &[&PositionChange]) -> Vec<String> {
        list.iter().map(|p| p.cusip.clone()).collect()
    }

    #[test]
    fn test_lists_are_ranked() {
        let changes = sample_changes();
        assert_eq!(changes.new_positions()[0].cusip, "NEW000002");
        assert_eq!(changes.increased_positions()[0].cusip, "INC000001");
        assert_eq!(changes.decreased_positions()[0].cusip, "DEC000001");
    }

    #[test]
    fn test_top_buys() {
        let changes = sample_changes();
        assert_eq!(
            cusips(&changes.top_buys(5)),
            vec!["NEW000002", "INC000001", "NEW000001", "INC000002"]
        );
        assert_eq!(cusips(&changes.top_buys(1)), vec!["NEW000002"]);
    }

    #[test]
    fn test_top_sells() {
        let changes = sample_changes();
        assert_eq!(
            cusips(&changes.top_sells(5)),
            vec!["DEC000001", "CLS000001", "DEC000002"]
        );
    }

    #[test]
    fn test_top_holdings_excludes_closed() {
        let changes = sample_changes();
        let top = changes.top_holdings(10);
        assert_eq!(top.len(), 7);
        assert_eq!(top[0].cusip, "UNC000001");
        assert!(top.iter().all(|p| p.change_type != ChangeType::Closed));
        assert_eq!(changes.top_holdings(0).len(), 0);
    }

    #[test]
    fn test_ties_break_by_cusip() {
        let mut changes = PortfolioChanges::new(date(2024, 6, 30), date(2024, 3, 31), 0, 0);
        changes.push(pos("BBB000000", 5.0, 0.0, ChangeType::New));
        changes.push(pos("AAA000000", 5.0, 0.0, ChangeType::New));
        changes.rank();
        assert_eq!(changes.new_positions()[0].cusip, "AAA000000");
        assert_eq!(cusips(&changes.top_buys(2)), vec!["AAA000000", "BBB000000"]);
    }

    #[test]
    fn test_counts() {
        let changes = sample_changes();
        assert!(changes.has_changes());
        assert_eq!(changes.change_count(), 7);
        assert_eq!(changes.positions().count(), 8);
        assert_eq!(
            changes.find("UNC000001").map(|p| p.change_type),
            Some(ChangeType::Unchanged)
        );
        assert!(changes.find("MISSING00").is_none());
    }

    #[test]
    fn test_total_value_change() {
        let changes = sample_changes();
        assert_eq!(changes.total_value_change(), 200);
        assert_relative_eq!(changes.total_value_change_pct(), 20.0);
    }

    #[test]
    fn test_total_value_change_beyond_i64() {
        let big = i64::MAX as u64 + 10;
        let grown = PortfolioChanges::new(date(2024, 6, 30), date(2024, 3, 31), big, 10);
        assert_eq!(grown.total_value_change(), i128::from(i64::MAX));
        assert!(grown.total_value_change_pct() > 0.0);

        let shrunk = PortfolioChanges::new(date(2024, 6, 30), date(2024, 3, 31), 0, u64::MAX);
        assert_eq!(shrunk.total_value_change(), -i128::from(u64::MAX));
        assert_relative_eq!(shrunk.total_value_change_pct(), -100.0);
    }

    #[test]
    fn test_total_value_change_from_zero_is_zero_pct() {
        let changes = PortfolioChanges::new(date(2024, 6, 30), date(2024, 3, 31), 5_000, 0);
        assert_eq!(changes.total_value_change(), 5_000);
        assert_eq!(changes.total_value_change_pct(), 0.0);
        assert!(!changes.has_changes());
    }
}
