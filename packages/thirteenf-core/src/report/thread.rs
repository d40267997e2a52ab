use super::format::{
    billions, fit_message, format_date, quarter_label, signed_pct, signed_weight, MAX_MESSAGE_LEN,
};
use super::Reporter;
use crate::analyzer::{ChangeType, PortfolioChanges, PositionChange};
use crate::resolver::TickerCache;

/// Tickers listed per side in the thread header.
const HEADER_TICKERS: usize = 3;

/// Upper bound on holdings listed in one thread message.
const THREAD_HOLDINGS: usize = 5;

impl<C: TickerCache> Reporter<'_, C> {
    /// Format a change-set as an ordered thread of short messages.
    ///
    /// Every message is at most `MAX_MESSAGE_LEN` characters. Empty sections
    /// are left out, so the thread always starts with the header.
    pub fn thread(&self, changes: &PortfolioChanges) -> Vec<String> {
        let mut messages = vec![self.header(changes)];

        let holdings = changes.top_holdings(self.top_holdings.min(THREAD_HOLDINGS));
        if !holdings.is_empty() {
            let lines = holdings.iter().map(|pos| {
                format!(
                    "{:.1}% {} ({})",
                    pos.current_weight,
                    self.symbol(pos),
                    signed_weight(pos.weight_change())
                )
            });
            messages.push(self.section(&format!("Top {} Holdings:", holdings.len()), lines));
        }

        let buys = changes.top_buys(self.top_moves);
        if !buys.is_empty() {
            let lines = buys.iter().map(|pos| self.buy_line(pos));
            messages.push(self.section("Biggest Buys:", lines));
        }

        let sells = changes.top_sells(self.top_moves);
        if !sells.is_empty() {
            let lines = sells.iter().map(|pos| self.sell_line(pos));
            messages.push(self.section("Biggest Sells:", lines));
        }

        let other_new: Vec<&PositionChange> = changes
            .new_positions()
            .iter()
            .filter(|p| !buys.iter().any(|b| b.cusip == p.cusip))
            .take(self.top_moves)
            .collect();
        if !other_new.is_empty() {
            let lines = other_new
                .iter()
                .map(|pos| format!("{:.1}% {}", pos.current_weight, self.symbol(pos)));
            messages.push(self.section("Other New Positions:", lines));
        }

        let other_exits: Vec<&PositionChange> = changes
            .closed_positions()
            .iter()
            .filter(|p| !sells.iter().any(|s| s.cusip == p.cusip))
            .take(self.top_moves)
            .collect();
        if !other_exits.is_empty() {
            let lines = other_exits
                .iter()
                .map(|pos| format!("(was {:.1}%) {}", pos.previous_weight, self.symbol(pos)));
            messages.push(self.section("Exits:", lines));
        }

        messages
    }

    /// Format a change-set as one short message.
    pub fn single_message(&self, changes: &PortfolioChanges) -> String {
        let mut text = format!(
            "{} 13F - {}\n\nAUM: {} ({})\n\n",
            self.fund_name,
            format_date(changes.current_date()),
            billions(changes.current_total_value()),
            signed_pct(changes.total_value_change_pct())
        );

        if let Some(pos) = changes.top_buys(1).first() {
            let line = if pos.change_type == ChangeType::New {
                format!("{} +{:.1}% (NEW)", self.symbol(pos), pos.current_weight)
            } else {
                format!("{} {}", self.symbol(pos), signed_weight(pos.weight_change()))
            };
            text.push_str(&format!("Top buy: {line}\n"));
        }
        if let Some(pos) = changes.top_sells(1).first() {
            let line = if pos.change_type == ChangeType::Closed {
                format!("{} -{:.1}% (EXIT)", self.symbol(pos), pos.previous_weight)
            } else {
                format!("{} {}", self.symbol(pos), signed_weight(pos.weight_change()))
            };
            text.push_str(&format!("Top sale: {line}\n"));
        }

        text.push_str(&format!("\n{} changes | SEC EDGAR", changes.change_count()));
        fit_message(&text, MAX_MESSAGE_LEN)
    }

    fn header(&self, changes: &PortfolioChanges) -> String {
        let tickers = |positions: Vec<&PositionChange>| {
            if positions.is_empty() {
                return "none".to_string();
            }
            positions
                .iter()
                .map(|p| self.symbol(p))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let text = format!(
            "{} 13F Update\n\n{} ({})\n{} ({})\n\nBuys: {}\nSells: {}",
            self.fund_name,
            format_date(changes.current_date()),
            quarter_label(changes.current_date()),
            billions(changes.current_total_value()),
            signed_pct(changes.total_value_change_pct()),
            tickers(changes.top_buys(HEADER_TICKERS)),
            tickers(changes.top_sells(HEADER_TICKERS)),
        );
        fit_message(&text, MAX_MESSAGE_LEN)
    }

    fn section(&self, title: &str, lines: impl Iterator<Item = String>) -> String {
        let body: Vec<String> = lines.collect();
        fit_message(&format!("{title}\n\n{}", body.join("\n")), MAX_MESSAGE_LEN)
    }

    fn buy_line(&self, pos: &PositionChange) -> String {
        if pos.change_type == ChangeType::New {
            format!("+{:.1}% {} (new)", pos.current_weight, self.symbol(pos))
        } else {
            format!("{} {}", signed_weight(pos.weight_change()), self.symbol(pos))
        }
    }

    fn sell_line(&self, pos: &PositionChange) -> String {
        if pos.change_type == ChangeType::Closed {
            format!("-{:.1}% {} (exit)", pos.previous_weight, self.symbol(pos))
        } else {
            format!("{} {}", signed_weight(pos.weight_change()), self.symbol(pos))
        }
    }
}
