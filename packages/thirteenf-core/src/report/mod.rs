//! Text rendering of portfolio changes.
//!
//! Renderers only read the change-set's public surface: the five classified
//! lists, the ranking queries and the aggregate totals.

mod format;
mod summary;
mod thread;

pub use format::{
    billions, fit_message, format_date, quarter_label, signed_pct, signed_pp, signed_weight,
    MAX_MESSAGE_LEN,
};

use crate::analyzer::PositionChange;
use crate::resolver::{TickerCache, TickerResolver};

/// Renders summaries and message threads for one fund.
#[derive(Debug)]
pub struct Reporter<'a, C: TickerCache> {
    resolver: &'a TickerResolver<C>,
    fund_name: String,
    top_holdings: usize,
    top_moves: usize,
}

impl<'a, C: TickerCache> Reporter<'a, C> {
    pub fn new(resolver: &'a TickerResolver<C>, fund_name: &str) -> Self {
        Self {
            resolver,
            fund_name: fund_name.to_string(),
            top_holdings: 10,
            top_moves: 5,
        }
    }

    /// Set how many rows the holdings and buy/sell views show.
    pub fn with_limits(mut self, top_holdings: usize, top_moves: usize) -> Self {
        self.top_holdings = top_holdings;
        self.top_moves = top_moves;
        self
    }

    pub fn fund_name(&self) -> &str {
        &self.fund_name
    }

    fn symbol(&self, position: &PositionChange) -> String {
        self.resolver
            .display_symbol(&position.issuer, &position.cusip)
    }
}
