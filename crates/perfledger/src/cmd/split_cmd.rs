//! perf-split - Split the value change of a portfolio into its causes.
//!
//! # Usage
//!
//! ```bash
//! perf-split ledger.json split --interval month
//! perf-split ledger.json split --categories contributions,dividends --format json
//! perf-split ledger.json --value '^Assets:Broker' balances
//! perf-split ledger.json gains
//! ```
//!
//! The ledger is a JSON array of booked directives. Account patterns come
//! from an optional JSON file (`--patterns`) whose fields all default, and
//! `--value` overrides the value-account patterns.
//!
//! # Reports
//!
//! - `split` - Per-period deltas of every category, with a reconciliation
//! - `balances` - Tree of the value accounts with unrealized gains
//! - `gains` - Realized gains per sale and the unrealized total

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use perfledger_core::{sort_directives, Directive, Inventory};
use perfledger_split::{
    build_price_map_with_fallback, compute_split_with_prices, realized_gains, reconcile,
    unrealized_gains_per_account, unrealized_gains_total, value_balance_tree, AccountPatterns,
    Accounts, BalanceTree, Category, Interval, Period, Reconciliation, SplitOptions, SplitParts,
};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Split the value change of a portfolio into its causes.
#[derive(Parser, Debug)]
#[command(name = "perf-split")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The JSON ledger to process
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// JSON file with account patterns
    #[arg(short, long, value_name = "FILE", global = true)]
    patterns: Option<PathBuf>,

    /// Value-account pattern, overriding the patterns file (repeatable)
    #[arg(long = "value", value_name = "REGEX", global = true)]
    value: Vec<String>,

    /// The report to generate
    #[command(subcommand)]
    report: Report,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Report {
    /// Show per-period deltas of each category
    Split {
        /// Period granularity (transaction, day, week, month, quarter, year)
        #[arg(short, long)]
        interval: Option<Interval>,
        /// First date included
        #[arg(long, value_name = "DATE")]
        begin: Option<NaiveDate>,
        /// First date excluded
        #[arg(long, value_name = "DATE")]
        end: Option<NaiveDate>,
        /// Categories to report, comma separated
        #[arg(short, long, value_delimiter = ',')]
        categories: Vec<Category>,
        /// Show running balances instead of deltas
        #[arg(long)]
        cumulative: bool,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Show the value-account tree
    Balances {
        /// Ignore directives after this date
        #[arg(long, value_name = "DATE")]
        as_of: Option<NaiveDate>,
    },
    /// Show realized gains per sale
    Gains,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Main entry point for the split command.
pub fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut stdout = io::stdout().lock();
    match run(&args, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run<W: Write>(args: &Args, writer: &mut W) -> Result<()> {
    if !args.file.exists() {
        anyhow::bail!("file not found: {}", args.file.display());
    }

    let directives = load_ledger(&args.file)?;
    let patterns = load_patterns(args.patterns.as_deref(), &args.value)?;
    let accounts = Accounts::from_directives(&directives, &patterns)
        .context("failed to classify accounts")?;
    tracing::debug!(
        "Loaded {} directives, {} value accounts",
        directives.len(),
        accounts.value().len()
    );

    match &args.report {
        Report::Split {
            interval,
            begin,
            end,
            categories,
            cumulative,
            format,
        } => {
            let options = SplitOptions {
                interval: *interval,
                begin: *begin,
                end: *end,
            };
            let categories = if categories.is_empty() {
                Category::ALL.to_vec()
            } else {
                categories.clone()
            };
            report_split(
                &directives,
                &accounts,
                &categories,
                &options,
                *cumulative,
                *format,
                writer,
            )?;
        }
        Report::Balances { as_of } => {
            report_balances(&directives, &accounts, *as_of, writer)?;
        }
        Report::Gains => {
            report_gains(&directives, &accounts, writer)?;
        }
    }

    Ok(())
}

fn load_ledger(path: &Path) -> Result<Vec<Directive>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut directives: Vec<Directive> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse ledger {}", path.display()))?;
    sort_directives(&mut directives);
    Ok(directives)
}

fn load_patterns(path: Option<&Path>, value: &[String]) -> Result<AccountPatterns> {
    let mut patterns = match path {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("failed to parse patterns {}", path.display()))?
        }
        None => AccountPatterns::default(),
    };
    if !value.is_empty() {
        patterns.value = value.to_vec();
    }
    Ok(patterns)
}

#[derive(Serialize)]
struct SplitReport<'a> {
    periods: &'a [Period],
    parts: SplitParts,
    reconciliation: &'a Reconciliation,
}

/// Generate the split report.
fn report_split<W: Write>(
    directives: &[Directive],
    accounts: &Accounts,
    categories: &[Category],
    options: &SplitOptions,
    cumulative: bool,
    format: Format,
    writer: &mut W,
) -> Result<()> {
    let prices = build_price_map_with_fallback(directives);
    let split = compute_split_with_prices(directives, accounts, categories, options, &prices);
    let reconciliation = reconcile(&split, accounts, &prices);

    let parts = if cumulative {
        split.parts.cumulative()
    } else {
        split.parts.clone()
    };

    if format == Format::Json {
        let report = SplitReport {
            periods: &split.periods,
            parts,
            reconciliation: &reconciliation,
        };
        serde_json::to_writer_pretty(&mut *writer, &report)?;
        writeln!(writer)?;
        return Ok(());
    }

    writeln!(
        writer,
        "Split of {} transactions into {} periods",
        split.transactions.len(),
        split.periods.len()
    )?;
    writeln!(writer, "{}", "=".repeat(60))?;

    for (index, period) in split.periods.iter().enumerate() {
        writeln!(writer)?;
        match (period.first, period.last) {
            (Some(first), Some(last)) => writeln!(
                writer,
                "{first} .. {last} ({} transactions)",
                period.transactions
            )?,
            _ => writeln!(writer, "(no transactions)")?,
        }
        for (category, series) in parts.iter() {
            if let Some(delta) = series.get(index) {
                writeln!(writer, "  {:<18} {}", category.id(), delta)?;
            }
        }
    }

    writeln!(writer)?;
    writeln!(writer, "{}", "-".repeat(60))?;
    writeln!(writer, "  {:<18} {}", "value", reconciliation.value)?;
    writeln!(writer, "  {:<18} {}", "categories", reconciliation.categories)?;
    if !reconciliation.is_consistent() {
        writeln!(writer, "  {:<18} {}", "unexplained", reconciliation.error)?;
    }

    Ok(())
}

/// Generate the value-account tree report.
fn report_balances<W: Write>(
    directives: &[Directive],
    accounts: &Accounts,
    as_of: Option<NaiveDate>,
    writer: &mut W,
) -> Result<()> {
    let prices = build_price_map_with_fallback(directives);
    let tree = value_balance_tree(directives, accounts, as_of);
    let gains = unrealized_gains_per_account(&tree, accounts, &prices, as_of);

    writeln!(writer, "Value Accounts ({} total)", accounts.value().len())?;
    writeln!(writer, "{}", "=".repeat(60))?;
    writeln!(writer)?;

    write_subtree(&tree, "", 0, &gains, writer)?;

    let total = unrealized_gains_total(&tree, accounts, &prices, as_of);
    writeln!(writer)?;
    writeln!(writer, "Unrealized gains: {total}")?;
    Ok(())
}

fn write_subtree<W: Write>(
    tree: &BalanceTree,
    account: &str,
    depth: usize,
    gains: &std::collections::BTreeMap<String, Inventory>,
    writer: &mut W,
) -> Result<()> {
    for child in tree.children(account) {
        let Some(node) = tree.get(child) else {
            continue;
        };
        let leaf = child.rsplit(':').next().unwrap_or(child);
        write!(
            writer,
            "{:indent$}{leaf:<width$} {}",
            "",
            node.balance_children,
            indent = depth * 2,
            width = 30usize.saturating_sub(depth * 2)
        )?;
        if let Some(gain) = gains.get(child) {
            write!(writer, "  (gain {gain})")?;
        }
        writeln!(writer)?;
        write_subtree(tree, child, depth + 1, gains, writer)?;
    }
    Ok(())
}

/// Generate the realized gains report.
fn report_gains<W: Write>(
    directives: &[Directive],
    accounts: &Accounts,
    writer: &mut W,
) -> Result<()> {
    let rows = realized_gains(directives, accounts);

    writeln!(writer, "Realized Gains ({} sales)", rows.len())?;
    writeln!(writer, "{}", "=".repeat(60))?;
    writeln!(writer)?;

    for row in &rows {
        writeln!(
            writer,
            "{} {:<30} {:>12}  total {}",
            row.date, row.narration, row.gain, row.total
        )?;
    }

    let prices = build_price_map_with_fallback(directives);
    let tree = value_balance_tree(directives, accounts, None);
    let unrealized = unrealized_gains_total(&tree, accounts, &prices, None);
    writeln!(writer)?;
    writeln!(writer, "Unrealized gains: {unrealized}")?;
    Ok(())
}
