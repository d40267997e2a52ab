//! Change detection between consecutive filings.
//!
//! Reconciles two holdings snapshots by CUSIP into classified, ranked
//! position changes.

mod changes;
mod compare;
mod position;

pub use changes::PortfolioChanges;
pub use compare::{PortfolioAnalyzer, DEFAULT_SIGNIFICANCE_THRESHOLD};
pub use position::{portfolio_weight, ChangeType, PositionChange};
