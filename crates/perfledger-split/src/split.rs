//! The split driver.
//!
//! [`compute_split`] streams the transactions of a ledger through one
//! accumulator per requested category and flushes them at every interval
//! boundary. Each category ends up with one delta per period, and the
//! deltas of the component categories add up to the change in value of the
//! value accounts.

use chrono::NaiveDate;
use perfledger_core::{Directive, Inventory, PriceMap, Transaction, Valuation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::accumulators::{build_accumulators, Accumulator, Category};
use crate::prices::build_price_map_with_fallback;
use crate::{Accounts, Interval, SplitError};

/// Options of a split computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitOptions {
    /// Period granularity. `None` reports the whole window as one period.
    pub interval: Option<Interval>,
    /// First date included (inclusive).
    pub begin: Option<NaiveDate>,
    /// First date excluded.
    pub end: Option<NaiveDate>,
}

impl SplitOptions {
    /// Split by `interval`.
    #[must_use]
    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Restrict the split to `[begin, end)`.
    #[must_use]
    pub fn with_window(mut self, begin: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.begin = begin;
        self.end = end;
        self
    }

    /// Check if `date` falls inside the window.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.begin.map_or(true, |begin| date >= begin) && self.end.map_or(true, |end| date < end)
    }
}

/// One reporting period: the transactions between two flushes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    /// Date of the first transaction of the period.
    pub first: Option<NaiveDate>,
    /// Date of the last transaction of the period.
    pub last: Option<NaiveDate>,
    /// Number of transactions in the period.
    pub transactions: usize,
}

impl Period {
    fn record(&mut self, date: NaiveDate) {
        if self.first.is_none() {
            self.first = Some(date);
        }
        self.last = Some(date);
        self.transactions += 1;
    }
}

/// Per-category deltas, index-aligned with the periods of a [`Split`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SplitParts(BTreeMap<Category, Vec<Inventory>>);

impl SplitParts {
    /// The deltas of `category`, or `None` if it was not requested.
    #[must_use]
    pub fn get(&self, category: Category) -> Option<&[Inventory]> {
        self.0.get(&category).map(Vec::as_slice)
    }

    /// The deltas of `category`, empty if it was not requested.
    #[must_use]
    pub fn series(&self, category: Category) -> &[Inventory] {
        self.get(category).unwrap_or(&[])
    }

    /// The requested categories.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.keys().copied()
    }

    /// Iterate over `(category, deltas)`.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &[Inventory])> {
        self.0.iter().map(|(c, series)| (*c, series.as_slice()))
    }

    /// Sum of all deltas of `category`.
    #[must_use]
    pub fn total(&self, category: Category) -> Inventory {
        sum_inventories(self.series(category))
    }

    /// Running balances of `category`.
    #[must_use]
    pub fn balances(&self, category: Category) -> Vec<Inventory> {
        calculate_balances(self.series(category))
    }

    /// The same categories with running balances in place of deltas.
    #[must_use]
    pub fn cumulative(&self) -> Self {
        Self(
            self.0
                .iter()
                .map(|(category, series)| (*category, calculate_balances(series)))
                .collect(),
        )
    }

    /// Sum of the component categories in period `index`.
    #[must_use]
    pub fn period_total(&self, index: usize) -> Inventory {
        self.iter()
            .filter(|(category, _)| category.is_component())
            .filter_map(|(_, series)| series.get(index))
            .sum()
    }

    /// Sum of every component category over all periods.
    #[must_use]
    pub fn components_total(&self) -> Inventory {
        self.iter()
            .filter(|(category, _)| category.is_component())
            .flat_map(|(_, series)| series.iter())
            .sum()
    }

    fn push(&mut self, category: Category, delta: Inventory) {
        self.0.entry(category).or_default().push(delta);
    }
}

/// The result of a split computation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    /// Transactions fed to the accumulators, in order.
    pub transactions: Vec<Transaction>,
    /// One entry per flush.
    pub periods: Vec<Period>,
    /// Per-category deltas, index-aligned with `periods`.
    pub parts: SplitParts,
}

impl Split {
    /// Number of periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Check if the split has no periods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Date of the last transaction of the split.
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.transactions.iter().map(|t| t.date).max()
    }
}

/// Parse category ids.
pub fn parse_categories<S: AsRef<str>>(ids: &[S]) -> Result<Vec<Category>, SplitError> {
    ids.iter().map(|id| id.as_ref().parse()).collect()
}

/// Sum a sequence of inventories.
pub fn sum_inventories<'a>(inventories: impl IntoIterator<Item = &'a Inventory>) -> Inventory {
    inventories.into_iter().sum()
}

/// Running sums of a sequence of deltas.
#[must_use]
pub fn calculate_balances(deltas: &[Inventory]) -> Vec<Inventory> {
    let mut running = Inventory::new();
    deltas
        .iter()
        .map(|delta| {
            running += delta;
            running.clone()
        })
        .collect()
}

/// Compute a split, with category ids given as strings.
pub fn compute_split_by_ids<S: AsRef<str>>(
    directives: &[Directive],
    accounts: &Accounts,
    ids: &[S],
    options: &SplitOptions,
) -> Result<Split, SplitError> {
    let categories = parse_categories(ids)?;
    Ok(compute_split(directives, accounts, &categories, options))
}

/// Compute a split, pricing with purchase-cost fallback.
#[must_use]
pub fn compute_split(
    directives: &[Directive],
    accounts: &Accounts,
    categories: &[Category],
    options: &SplitOptions,
) -> Split {
    let prices = build_price_map_with_fallback(directives);
    compute_split_with_prices(directives, accounts, categories, options, &prices)
}

/// Compute a split against an existing price map.
///
/// Transactions outside the window are dropped. If the price map has an
/// observation inside the window later than the last retained transaction,
/// a posting-less valuation transaction dated at the latest such observation
/// is appended, so that the final period reflects the prices as of the end
/// of the window. The directives themselves are left untouched.
#[must_use]
pub fn compute_split_with_prices(
    directives: &[Directive],
    accounts: &Accounts,
    categories: &[Category],
    options: &SplitOptions,
    prices: &PriceMap,
) -> Split {
    let mut transactions: Vec<Transaction> = directives
        .iter()
        .filter_map(Directive::as_transaction)
        .filter(|txn| options.contains(txn.date))
        .cloned()
        .collect();

    let last_transaction = transactions.iter().map(|t| t.date).max();
    if let (Some(last), Some(price_date)) =
        (last_transaction, prices.last_date_before(options.end))
    {
        if price_date > last {
            tracing::debug!("Appending valuation transaction on {}", price_date);
            transactions.push(Transaction::new(price_date, "Valuation"));
        }
    }

    let mut unique = Vec::with_capacity(categories.len());
    for category in categories {
        if !unique.contains(category) {
            unique.push(*category);
        }
    }

    let mut accumulators = build_accumulators(&unique, accounts, prices);
    let mut parts = SplitParts::default();
    for category in &unique {
        parts.0.insert(*category, Vec::new());
    }

    let mut ends = match (
        options.interval,
        transactions.iter().map(|t| t.date).min(),
        transactions.iter().map(|t| t.date).max(),
    ) {
        (Some(interval), Some(first), Some(last)) => interval.boundaries(first, last),
        _ => Vec::new(),
    }
    .into_iter();
    let mut current_end = ends.next();

    let mut periods = Vec::new();
    let mut period = Period::default();

    for txn in &transactions {
        if period.transactions > 0 {
            let crossed = match options.interval {
                Some(Interval::Transaction) => true,
                Some(_) => current_end.is_some_and(|end| txn.date > end),
                None => false,
            };
            if crossed {
                flush(&mut accumulators, &mut parts, &mut periods, &mut period);
            }
        }

        while let Some(end) = current_end {
            if end >= txn.date {
                break;
            }
            current_end = ends.next();
        }

        for accumulator in &mut accumulators {
            accumulator.process(txn);
        }
        period.record(txn.date);
    }

    flush(&mut accumulators, &mut parts, &mut periods, &mut period);

    tracing::debug!(
        "Split {} transactions into {} periods over {} categories",
        transactions.len(),
        periods.len(),
        unique.len()
    );

    Split {
        transactions,
        periods,
        parts,
    }
}

fn flush(
    accumulators: &mut [Box<dyn Accumulator + '_>],
    parts: &mut SplitParts,
    periods: &mut Vec<Period>,
    period: &mut Period,
) {
    for accumulator in accumulators.iter_mut() {
        parts.push(accumulator.category(), accumulator.flush());
    }
    tracing::trace!(
        "Flushed period {} ({:?} to {:?}, {} transactions)",
        periods.len(),
        period.first,
        period.last,
        period.transactions
    );
    periods.push(std::mem::take(period));
}

/// Comparison of the split against the value of the value accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Market value of the value accounts at the last transaction date,
    /// including the valuation transaction.
    pub value: Inventory,
    /// Sum of every component category.
    pub categories: Inventory,
    /// `value - categories`.
    pub error: Inventory,
}

impl Reconciliation {
    /// Check if the categories account for the whole value.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.error.is_empty()
    }
}

/// Check that the component categories of `split` add up to the value of
/// the value accounts.
///
/// A difference is a data-quality signal, not a failure: it is logged and
/// returned in [`Reconciliation::error`].
#[must_use]
pub fn reconcile(split: &Split, accounts: &Accounts, prices: &PriceMap) -> Reconciliation {
    let mut balance = Inventory::new();
    for txn in &split.transactions {
        for posting in &txn.postings {
            if accounts.is_value(&posting.account) {
                balance.add(posting.position());
            }
        }
    }

    let value = balance.reduce(Valuation::Value, Some(prices), split.last_date());
    let categories = split.parts.components_total();
    let error = &value - &categories;

    if !error.is_empty() {
        tracing::warn!(
            "Split does not reconcile: value {} but categories sum to {} (difference {})",
            value,
            categories,
            error
        );
    }

    Reconciliation {
        value,
        categories,
        error,
    }
}
