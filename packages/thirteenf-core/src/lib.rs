//! Thirteenf Core - 13F holdings tracking library.
//!
//! This crate provides the core functionality for following one fund's
//! quarterly 13F disclosures:
//!
//! - **Snapshots**: Filings and their holdings, keyed by CUSIP
//! - **Change detection**: Classify new/closed/increased/decreased positions
//! - **Ranking**: Top buys, top sells and top holdings by portfolio weight
//! - **Reporting**: Plain-text summaries and length-limited message threads
//! - **Bookkeeping**: Ticker cache and last-posted filing state
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use thirteenf_core::{Filing, Holding, PortfolioAnalyzer};
//!
//! let previous = Filing::new(
//!     "0001-24-000001",
//!     NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 3, 31),
//!     "13F-HR",
//!     vec![Holding::new("NVIDIA CORP", "COM", "67066G104", 8_000_000, 1_000)],
//! );
//! let current = Filing::new(
//!     "0001-24-000002",
//!     NaiveDate::from_ymd_opt(2024, 8, 14).unwrap(),
//!     NaiveDate::from_ymd_opt(2024, 6, 30),
//!     "13F-HR",
//!     vec![
//!         Holding::new("NVIDIA CORP", "COM", "67066G104", 20_000_000, 2_000),
//!         Holding::new("MICRON TECHNOLOGY INC", "COM", "595112103", 5_000_000, 500),
//!     ],
//! );
//!
//! let changes = PortfolioAnalyzer::default().compare(&current, &previous).unwrap();
//! assert_eq!(changes.new_positions().len(), 1);
//! println!("{} changes", changes.change_count());
//! ```

pub mod analyzer;
pub mod config;
pub mod report;
pub mod resolver;
pub mod source;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use types::{
    ApiResponse, Filing, Holding, InvestmentDiscretion, PutCall, ShareType, VotingAuthority,
};

// Re-export main functionality
pub use analyzer::{
    portfolio_weight, ChangeType, PortfolioAnalyzer, PortfolioChanges, PositionChange,
    DEFAULT_SIGNIFICANCE_THRESHOLD,
};
pub use config::Config;
pub use resolver::{JsonTickerCache, MemoryTickerCache, TickerCache, TickerResolver};
pub use source::{DirectorySource, FilingMeta, FilingSource};
pub use state::{PostState, StateManager};

/// Error types for thirteenf-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid significance threshold: {0}")]
    InvalidThreshold(f64),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Filing not found: {0}")]
    FilingNotFound(String),
}

/// Result type for thirteenf-core operations.
pub type Result<T> = std::result::Result<T, Error>;
