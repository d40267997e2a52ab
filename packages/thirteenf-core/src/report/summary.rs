use super::format::{billions, signed_pct, signed_pp};
use super::Reporter;
use crate::analyzer::{ChangeType, PortfolioChanges, PositionChange};
use crate::resolver::TickerCache;

const ISSUER_WIDTH: usize = 30;

impl<C: TickerCache> Reporter<'_, C> {
    /// Multi-line human-readable summary of a change-set.
    pub fn summary(&self, changes: &PortfolioChanges) -> String {
        let mut lines = vec![
            format!(
                "{} Portfolio Changes: {} -> {}",
                self.fund_name,
                changes.previous_date(),
                changes.current_date()
            ),
            "=".repeat(60),
            String::new(),
            format!("Total Value: {}", billions(changes.current_total_value())),
            format!("Change: {}", signed_pct(changes.total_value_change_pct())),
            String::new(),
            format!("Position Changes: {}", changes.change_count()),
            format!("  - New Positions: {}", changes.new_positions().len()),
            format!("  - Closed Positions: {}", changes.closed_positions().len()),
            format!("  - Weight Increased: {}", changes.increased_positions().len()),
            format!("  - Weight Decreased: {}", changes.decreased_positions().len()),
            String::new(),
            "TOP HOLDINGS (by portfolio %):".to_string(),
        ];

        for pos in changes.top_holdings(self.top_holdings) {
            let issuer: String = pos.issuer.chars().take(ISSUER_WIDTH).collect();
            lines.push(format!(
                "  {:5.1}% | {:<width$} ({})",
                pos.current_weight,
                issuer,
                signed_pp(pos.weight_change()),
                width = ISSUER_WIDTH
            ));
        }

        let buys = changes.top_buys(self.top_moves);
        if !buys.is_empty() {
            lines.push(String::new());
            lines.push("BIGGEST WEIGHT INCREASES:".to_string());
            lines.extend(buys.into_iter().map(|pos| {
                if pos.change_type == ChangeType::New {
                    format!("  +{:.1}pp | {} (NEW)", pos.current_weight, pos.issuer)
                } else {
                    weight_move_line(pos)
                }
            }));
        }

        let sells = changes.top_sells(self.top_moves);
        if !sells.is_empty() {
            lines.push(String::new());
            lines.push("BIGGEST WEIGHT DECREASES:".to_string());
            lines.extend(sells.into_iter().map(|pos| {
                if pos.change_type == ChangeType::Closed {
                    format!("  -{:.1}pp | {} (EXITED)", pos.previous_weight, pos.issuer)
                } else {
                    weight_move_line(pos)
                }
            }));
        }

        lines.join("\n")
    }
}

fn weight_move_line(pos: &PositionChange) -> String {
    format!(
        "  {} | {} ({:.1}% -> {:.1}%)",
        signed_pp(pos.weight_change()),
        pos.issuer,
        pos.previous_weight,
        pos.current_weight
    )
}

#[cfg(test)]
mod tests {
    use crate::report::Reporter;
    use crate::resolver::TickerResolver;
    use crate::types::{Filing, Holding};
    use crate::PortfolioAnalyzer;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_summary_sections() {
        let previous = Filing::new(
            "prev",
            date(2024, 5, 15),
            Some(date(2024, 3, 31)),
            "13F-HR",
            vec![
                Holding::new("NVIDIA CORP", "COM", "67066G104", 10, 1),
                Holding::new("APPLE INC", "COM", "037833100", 90, 1),
            ],
        );
        let current = Filing::new(
            "cur",
            date(2024, 8, 14),
            Some(date(2024, 6, 30)),
            "13F-HR",
            vec![
                Holding::new("NVIDIA CORP", "COM", "67066G104", 60, 1),
                Holding::new("MICRON TECHNOLOGY INC", "COM", "595112103", 40, 1),
            ],
        );
        let changes = PortfolioAnalyzer::default().compare(&current, &previous).unwrap();
        let resolver = TickerResolver::in_memory();
        let summary = Reporter::new(&resolver, "Atreides").summary(&changes);

        assert!(summary.starts_with("Atreides Portfolio Changes: 2024-03-31 -> 2024-06-30"));
        assert!(summary.contains("=\n\nTotal Value: $0.00B\nChange: +0.0%\n\nPosition Changes: 3"));
        assert!(summary.contains("Change: +0.0%"));
        assert!(summary.contains("+40.0pp | MICRON TECHNOLOGY INC (NEW)"));
        assert!(summary.contains("+50.0pp | NVIDIA CORP (10.0% -> 60.0%)"));
        assert!(summary.contains("-90.0pp | APPLE INC (EXITED)"));
        assert!(!summary.ends_with('\n'));
    }

    #[test]
    fn test_summary_without_moves_omits_sections() {
        let holdings = vec![Holding::new("APPLE INC", "COM", "037833100", 90, 1)];
        let previous = Filing::new("prev", date(2024, 5, 15), None, "13F-HR", holdings.clone());
        let current = Filing::new("cur", date(2024, 8, 14), None, "13F-HR", holdings);
        let changes = PortfolioAnalyzer::default().compare(&current, &previous).unwrap();
        let resolver = TickerResolver::in_memory();
        let summary = Reporter::new(&resolver, "Fund").summary(&changes);

        assert!(summary.contains("Position Changes: 0"));
        assert!(summary.contains("APPLE INC"));
        assert!(!summary.contains("BIGGEST WEIGHT INCREASES"));
        assert!(!summary.contains("BIGGEST WEIGHT DECREASES"));
    }
}
