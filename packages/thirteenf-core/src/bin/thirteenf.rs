//! Thirteenf CLI - compare 13F filings and render change reports.
//!
//! JSON output goes to stdout; logs go to stderr (`RUST_LOG` controls the level).

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use thirteenf_core::report::Reporter;
use thirteenf_core::{
    ApiResponse, Config, DirectorySource, Filing, FilingSource, PortfolioAnalyzer,
    PortfolioChanges, TickerResolver,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "thirteenf")]
#[command(about = "Track a fund's 13F filings and report position changes")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.thirteenf/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two filing JSON files
    Compare {
        /// The more recent filing
        #[arg(short, long)]
        current: PathBuf,
        /// The older filing
        #[arg(short, long)]
        previous: PathBuf,
        /// Significance threshold in percentage points
        #[arg(short, long)]
        threshold: Option<f64>,
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
    },
    /// Compare the two newest filings in the filings directory
    Latest {
        /// Directory of filing JSON files
        #[arg(short, long)]
        dir: Option<PathBuf>,
        /// Significance threshold in percentage points
        #[arg(short, long)]
        threshold: Option<f64>,
        #[arg(short, long, value_enum, default_value = "json")]
        format: OutputFormat,
        /// Report even if the newest filing was already posted
        #[arg(long)]
        force: bool,
        /// Record the newest filing as posted
        #[arg(long)]
        mark: bool,
    },
    /// Posted-filing state commands
    State {
        #[command(subcommand)]
        action: StateAction,
    },
    /// Ticker cache commands
    Ticker {
        #[command(subcommand)]
        action: TickerAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Summary,
    Thread,
    Single,
}

#[derive(Subcommand)]
enum StateAction {
    /// Show the last posted filing
    Show,
    /// Forget the last posted filing
    Clear,
    /// Record a filing as posted
    Mark {
        #[arg(short, long)]
        accession: String,
        /// Report date (YYYY-MM-DD)
        #[arg(short, long)]
        report_date: NaiveDate,
        /// Published message id (repeatable)
        #[arg(short, long = "id")]
        ids: Vec<String>,
    },
}

#[derive(Subcommand)]
enum TickerAction {
    /// Resolve a CUSIP to a display symbol
    Resolve {
        #[arg(short, long)]
        cusip: String,
        /// Issuer name used as a fallback
        #[arg(short, long, default_value = "")]
        issuer: String,
    },
    /// Add a CUSIP to symbol mapping
    Add {
        #[arg(short, long)]
        cusip: String,
        #[arg(short, long)]
        symbol: String,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => Config::load_from_path(&path).map(|mut c| {
            c.apply_env_overrides();
            c
        }),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            println!("{}", error_json(e));
            std::process::exit(1);
        }
    };

    let output = match cli.command {
        Commands::Compare {
            current,
            previous,
            threshold,
            format,
        } => handle_compare(&config, current, previous, threshold, format),
        Commands::Latest {
            dir,
            threshold,
            format,
            force,
            mark,
        } => handle_latest(&config, dir, threshold, format, force, mark),
        Commands::State { action } => handle_state(&config, action),
        Commands::Ticker { action } => handle_ticker(&config, action),
    };

    println!("{}", output);
}

fn to_json<T: Serialize>(response: &ApiResponse<T>) -> String {
    serde_json::to_string_pretty(response)
        .unwrap_or_else(|e| format!("{{\"ok\":false,\"error\":\"{}\"}}", e))
}

fn error_json(error: impl ToString) -> String {
    to_json(&ApiResponse::<()>::err(error.to_string()))
}

fn analyzer(config: &Config, threshold: Option<f64>) -> thirteenf_core::Result<PortfolioAnalyzer> {
    PortfolioAnalyzer::try_new(threshold.unwrap_or(config.significance_threshold))
}

fn load_filing(path: &Path) -> thirteenf_core::Result<Filing> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// JSON numbers stop at 64 bits; clamp the rare wider delta.
fn clamp_i64(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

/// Render a change-set, returning the output and the number of messages it holds.
fn render(config: &Config, changes: &PortfolioChanges, format: OutputFormat) -> (String, usize) {
    let resolver = TickerResolver::new(config.ticker_cache());
    let reporter = Reporter::new(&resolver, &config.fund_name)
        .with_limits(config.top_holdings, config.top_moves);

    match format {
        OutputFormat::Json => (
            to_json(&ApiResponse::ok(json!({
                "changes": changes,
                "change_count": changes.change_count(),
                "total_value_change": clamp_i64(changes.total_value_change()),
                "total_value_change_pct": changes.total_value_change_pct(),
                "top_buys": changes.top_buys(config.top_moves),
                "top_sells": changes.top_sells(config.top_moves),
                "top_holdings": changes.top_holdings(config.top_holdings),
            }))),
            1,
        ),
        OutputFormat::Summary => (reporter.summary(changes), 1),
        OutputFormat::Single => (reporter.single_message(changes), 1),
        OutputFormat::Thread => {
            let messages = reporter.thread(changes);
            let total = messages.len();
            let text = messages
                .iter()
                .enumerate()
                .map(|(i, m)| {
                    format!("--- {}/{} ({} chars) ---\n{}", i + 1, total, m.chars().count(), m)
                })
                .collect::<Vec<_>>()
                .join("\n\n");
            (text, total)
        }
    }
}

fn handle_compare(
    config: &Config,
    current: PathBuf,
    previous: PathBuf,
    threshold: Option<f64>,
    format: OutputFormat,
) -> String {
    let result = analyzer(config, threshold).and_then(|analyzer| {
        let current = load_filing(&current)?;
        let previous = load_filing(&previous)?;
        analyzer.compare(&current, &previous)
    });

    match result {
        Ok(changes) => render(config, &changes, format).0,
        Err(e) => error_json(e),
    }
}

fn handle_latest(
    config: &Config,
    dir: Option<PathBuf>,
    threshold: Option<f64>,
    format: OutputFormat,
    force: bool,
    mark: bool,
) -> String {
    let state = config.state_manager();
    let dir = dir.unwrap_or_else(|| config.filings_dir.clone());

    let filings = analyzer(config, threshold).and_then(|analyzer| {
        let source = DirectorySource::open(dir)?;
        let (current, previous) = source.last_two_filings()?;
        Ok((analyzer, current, previous))
    });
    let (analyzer, current, previous) = match filings {
        Ok(filings) => filings,
        Err(e) => return error_json(e),
    };

    if !force && state.is_already_posted(current.accession_number()) {
        tracing::info!(accession = current.accession_number(), "filing already posted");
        return to_json(&ApiResponse::ok(json!({
            "message": "Filing already posted",
            "accession_number": current.accession_number(),
        })));
    }

    let changes = match analyzer.compare(&current, &previous) {
        Ok(changes) => changes,
        Err(e) => return error_json(e),
    };

    if !changes.has_changes() {
        return to_json(&ApiResponse::ok(json!({
            "message": "No significant changes detected",
            "accession_number": current.accession_number(),
        })));
    }

    let (output, message_count) = render(config, &changes, format);

    if mark {
        let ids = (1..=message_count).map(|i| format!("message-{i}")).collect();
        if let Err(e) = state.save_posted(current.accession_number(), current.as_of_date(), ids) {
            return error_json(e);
        }
    }

    output
}

fn handle_state(config: &Config, action: StateAction) -> String {
    let state = config.state_manager();

    match action {
        StateAction::Show => to_json(&ApiResponse::ok(json!({
            "path": state.path(),
            "last_posted": state.last_posted(),
        }))),
        StateAction::Clear => match state.clear() {
            Ok(()) => to_json(&ApiResponse::ok(json!({ "cleared": true }))),
            Err(e) => error_json(e),
        },
        StateAction::Mark {
            accession,
            report_date,
            ids,
        } => match state.save_posted(&accession, report_date, ids) {
            Ok(saved) => to_json(&ApiResponse::ok(saved)),
            Err(e) => error_json(e),
        },
    }
}

fn handle_ticker(config: &Config, action: TickerAction) -> String {
    let mut resolver = TickerResolver::new(config.ticker_cache());

    match action {
        TickerAction::Resolve { cusip, issuer } => to_json(&ApiResponse::ok(json!({
            "cusip": cusip,
            "symbol": resolver.resolve(&cusip),
            "display": resolver.display_symbol(&issuer, &cusip),
        }))),
        TickerAction::Add { cusip, symbol } => match resolver.insert(&cusip, &symbol) {
            Ok(()) => to_json(&ApiResponse::ok(json!({
                "cusip": cusip,
                "symbol": symbol,
                "cache": resolver.cache().path(),
            }))),
            Err(e) => error_json(e),
        },
    }
}
