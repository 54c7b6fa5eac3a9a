//! Per-category accumulators.
//!
//! Every [`Category`] has one [`Accumulator`] that consumes transactions one
//! at a time and, on [`flush`](Accumulator::flush), hands back the amount
//! attributed to that category since the previous flush.
//!
//! Flow categories (contributions, withdrawals, dividends, costs, realized
//! gains) report cost-preferred amounts: a posting held at cost contributes
//! `units × cost` in the cost currency, any other posting its units.
//! Unrealized gains and the balance are marked to market with the price map.

use chrono::NaiveDate;
use perfledger_core::{Inventory, Posting, PriceMap, Transaction, Valuation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Accounts, SplitError};

/// The economic categories a split reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Money moved into the value accounts from outside.
    Contributions,
    /// Money moved out of the value accounts.
    Withdrawals,
    /// Income that is not the proceeds of a sale.
    Dividends,
    /// Expenses paid by the value accounts.
    Costs,
    /// Gains booked when a lot is sold.
    GainsRealized,
    /// Market value in excess of cost of the lots still held.
    GainsUnrealized,
    /// Market value of the value accounts.
    Balance,
}

impl Category {
    /// Every category, in report order.
    pub const ALL: [Self; 7] = [
        Self::Contributions,
        Self::Withdrawals,
        Self::Dividends,
        Self::Costs,
        Self::GainsRealized,
        Self::GainsUnrealized,
        Self::Balance,
    ];

    /// The string id of this category.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Contributions => "contributions",
            Self::Withdrawals => "withdrawals",
            Self::Dividends => "dividends",
            Self::Costs => "costs",
            Self::GainsRealized => "gains_realized",
            Self::GainsUnrealized => "gains_unrealized",
            Self::Balance => "balance",
        }
    }

    /// Check if this category is a component of the value change, as
    /// opposed to the balance itself.
    #[must_use]
    pub const fn is_component(self) -> bool {
        !matches!(self, Self::Balance)
    }
}

impl FromStr for Category {
    type Err = SplitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.id() == s)
            .ok_or_else(|| SplitError::UnknownCategory(s.to_string()))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A stateful processor for one category.
pub trait Accumulator {
    /// The category this accumulator reports.
    fn category(&self) -> Category;

    /// Consume one transaction.
    fn process(&mut self, txn: &Transaction);

    /// Return the delta since the previous flush and start a new interval.
    ///
    /// Flushing twice in a row returns an empty inventory the second time.
    fn flush(&mut self) -> Inventory;
}

/// Which account classes a transaction touches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct TransactionProfile {
    /// Any posting to a value account.
    pub value: bool,
    /// Any posting to an income account.
    pub income: bool,
    /// Any posting to an expense account.
    pub expenses: bool,
    /// Any posting outside value, income, expenses and internal accounts.
    pub external: bool,
    /// Any posting to an internal-flow account. Other legs, such as a
    /// commission to an expense account, do not clear it.
    pub internal_flow: bool,
    /// A value-account lot is sold (negative units with a cost basis).
    pub sale: bool,
}

impl TransactionProfile {
    /// Profile `txn` against `accounts`.
    #[must_use]
    pub fn new(txn: &Transaction, accounts: &Accounts) -> Self {
        let mut profile = Self::default();
        for posting in &txn.postings {
            let account = posting.account.as_str();
            let is_value = accounts.is_value(account);
            profile.value |= is_value;
            profile.income |= accounts.is_income(account);
            profile.expenses |= accounts.is_expense(account);
            profile.external |= accounts.is_external(account);
            profile.internal_flow |= accounts.is_internal(account);
            profile.sale |= is_value && is_lot_reduction(posting);
        }
        profile
    }
}

/// Check if `txn` sells a value-account lot.
#[must_use]
pub fn is_commodity_sale(txn: &Transaction, accounts: &Accounts) -> bool {
    txn.postings
        .iter()
        .any(|p| accounts.is_value(&p.account) && is_lot_reduction(p))
}

fn is_lot_reduction(posting: &Posting) -> bool {
    posting.units.is_negative() && posting.cost.is_some()
}

/// Sum the cost-preferred amounts of the postings selected by `filter`.
pub fn postings_prefer_cost(txn: &Transaction, filter: impl Fn(&Posting) -> bool) -> Inventory {
    txn.postings
        .iter()
        .filter(|p| filter(p))
        .map(Posting::weight)
        .collect()
}

/// Sum the positions of the postings selected by `filter`.
pub fn include_postings(txn: &Transaction, filter: impl Fn(&Posting) -> bool) -> Inventory {
    txn.postings
        .iter()
        .filter(|p| filter(p))
        .map(Posting::position)
        .collect()
}

/// Build one accumulator per requested category, in the requested order.
#[must_use]
pub fn build_accumulators<'a>(
    categories: &[Category],
    accounts: &'a Accounts,
    prices: &'a PriceMap,
) -> Vec<Box<dyn Accumulator + 'a>> {
    categories
        .iter()
        .map(|&category| -> Box<dyn Accumulator + 'a> {
            match category {
                Category::Contributions => Box::new(FlowAccumulator::contributions(accounts)),
                Category::Withdrawals => Box::new(FlowAccumulator::withdrawals(accounts)),
                Category::Dividends => Box::new(DividendsAccumulator::new(accounts)),
                Category::Costs => Box::new(CostsAccumulator::new(accounts)),
                Category::GainsRealized => Box::new(RealizedGainAccumulator::new(accounts)),
                Category::GainsUnrealized => {
                    Box::new(UnrealizedGainAccumulator::new(accounts, prices))
                }
                Category::Balance => Box::new(BalanceAccumulator::new(accounts, prices)),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    In,
    Out,
}

/// Contributions or withdrawals: value crossing the portfolio boundary.
///
/// When a transaction moves value between value accounts and an external
/// account, the cost-preferred sum of its value, income and expense postings
/// is split by sign: positive lines are contributions, negative lines are
/// withdrawals. Income paid straight to an external account is also a
/// withdrawal, mirroring the dividend it books.
#[derive(Debug)]
pub struct FlowAccumulator<'a> {
    accounts: &'a Accounts,
    direction: Direction,
    pending: Inventory,
}

impl<'a> FlowAccumulator<'a> {
    /// Accumulator for money flowing in.
    #[must_use]
    pub fn contributions(accounts: &'a Accounts) -> Self {
        Self {
            accounts,
            direction: Direction::In,
            pending: Inventory::new(),
        }
    }

    /// Accumulator for money flowing out.
    #[must_use]
    pub fn withdrawals(accounts: &'a Accounts) -> Self {
        Self {
            accounts,
            direction: Direction::Out,
            pending: Inventory::new(),
        }
    }
}

impl Accumulator for FlowAccumulator<'_> {
    fn category(&self) -> Category {
        match self.direction {
            Direction::In => Category::Contributions,
            Direction::Out => Category::Withdrawals,
        }
    }

    fn process(&mut self, txn: &Transaction) {
        let profile = TransactionProfile::new(txn, self.accounts);
        let accounts = self.accounts;

        let relevant = if profile.value && profile.external {
            postings_prefer_cost(txn, |p| accounts.is_tracked(&p.account))
        } else if !profile.value && profile.income && profile.external {
            postings_prefer_cost(txn, |p| {
                accounts.is_income(&p.account) && p.units.is_negative()
            })
        } else {
            return;
        };

        for position in relevant.positions() {
            let inflow = position.units.is_positive();
            if inflow == (self.direction == Direction::In) {
                self.pending.add(position.clone());
            }
        }
    }

    fn flush(&mut self) -> Inventory {
        std::mem::take(&mut self.pending)
    }
}

/// Dividends: income that is not the proceeds of a sale.
///
/// Triggered by income alongside value postings when no lot is sold, or by
/// income paid straight to an external account. Reports the negated income
/// postings with negative units.
#[derive(Debug)]
pub struct DividendsAccumulator<'a> {
    accounts: &'a Accounts,
    pending: Inventory,
}

impl<'a> DividendsAccumulator<'a> {
    /// Create a dividends accumulator.
    #[must_use]
    pub fn new(accounts: &'a Accounts) -> Self {
        Self {
            accounts,
            pending: Inventory::new(),
        }
    }
}

impl Accumulator for DividendsAccumulator<'_> {
    fn category(&self) -> Category {
        Category::Dividends
    }

    fn process(&mut self, txn: &Transaction) {
        let profile = TransactionProfile::new(txn, self.accounts);
        let triggered = (profile.value && profile.income && !profile.sale)
            || (!profile.value && profile.income && profile.external);
        if !triggered {
            return;
        }

        let accounts = self.accounts;
        let income = postings_prefer_cost(txn, |p| {
            accounts.is_income(&p.account) && p.units.is_negative()
        });
        self.pending -= &income;
    }

    fn flush(&mut self) -> Inventory {
        std::mem::take(&mut self.pending)
    }
}

/// Costs: expenses paid in transactions touching value accounts.
#[derive(Debug)]
pub struct CostsAccumulator<'a> {
    accounts: &'a Accounts,
    pending: Inventory,
}

impl<'a> CostsAccumulator<'a> {
    /// Create a costs accumulator.
    #[must_use]
    pub fn new(accounts: &'a Accounts) -> Self {
        Self {
            accounts,
            pending: Inventory::new(),
        }
    }
}

impl Accumulator for CostsAccumulator<'_> {
    fn category(&self) -> Category {
        Category::Costs
    }

    fn process(&mut self, txn: &Transaction) {
        let profile = TransactionProfile::new(txn, self.accounts);
        if !(profile.value && profile.expenses) {
            return;
        }

        let accounts = self.accounts;
        let expenses = postings_prefer_cost(txn, |p| accounts.is_expense(&p.account));
        self.pending -= &expenses;
    }

    fn flush(&mut self) -> Inventory {
        std::mem::take(&mut self.pending)
    }
}

/// Realized gains: income booked by the sale of a value-account lot.
#[derive(Debug)]
pub struct RealizedGainAccumulator<'a> {
    accounts: &'a Accounts,
    pending: Inventory,
}

impl<'a> RealizedGainAccumulator<'a> {
    /// Create a realized gain accumulator.
    #[must_use]
    pub fn new(accounts: &'a Accounts) -> Self {
        Self {
            accounts,
            pending: Inventory::new(),
        }
    }
}

impl Accumulator for RealizedGainAccumulator<'_> {
    fn category(&self) -> Category {
        Category::GainsRealized
    }

    fn process(&mut self, txn: &Transaction) {
        let profile = TransactionProfile::new(txn, self.accounts);
        if !(profile.value && profile.income && profile.sale && profile.internal_flow) {
            return;
        }

        let accounts = self.accounts;
        let income = postings_prefer_cost(txn, |p| accounts.is_income(&p.account));
        self.pending -= &income;
    }

    fn flush(&mut self) -> Inventory {
        std::mem::take(&mut self.pending)
    }
}

/// Running balance of the value accounts, shared by the market-valued
/// accumulators.
#[derive(Debug)]
struct ValueBalance<'a> {
    accounts: &'a Accounts,
    prices: &'a PriceMap,
    balance: Inventory,
    last_date: Option<NaiveDate>,
}

impl<'a> ValueBalance<'a> {
    fn new(accounts: &'a Accounts, prices: &'a PriceMap) -> Self {
        Self {
            accounts,
            prices,
            balance: Inventory::new(),
            last_date: None,
        }
    }

    fn process(&mut self, txn: &Transaction) {
        for posting in &txn.postings {
            if self.accounts.is_value(&posting.account) {
                self.balance.add(posting.position());
            }
        }
        self.last_date = Some(txn.date);
    }

    fn market_value(&self) -> Inventory {
        self.balance.reduce(Valuation::Value, Some(self.prices), self.last_date)
    }

    fn book_value(&self) -> Inventory {
        self.balance.at_cost()
    }
}

/// Unrealized gains: change in market value over cost of the lots held.
///
/// At each flush the gain of the running balance is valued at the date of
/// the last processed transaction and compared to the gain reported at the
/// previous flush.
#[derive(Debug)]
pub struct UnrealizedGainAccumulator<'a> {
    balance: ValueBalance<'a>,
    reported: Inventory,
}

impl<'a> UnrealizedGainAccumulator<'a> {
    /// Create an unrealized gain accumulator.
    #[must_use]
    pub fn new(accounts: &'a Accounts, prices: &'a PriceMap) -> Self {
        Self {
            balance: ValueBalance::new(accounts, prices),
            reported: Inventory::new(),
        }
    }
}

impl Accumulator for UnrealizedGainAccumulator<'_> {
    fn category(&self) -> Category {
        Category::GainsUnrealized
    }

    fn process(&mut self, txn: &Transaction) {
        self.balance.process(txn);
    }

    fn flush(&mut self) -> Inventory {
        let gain = &self.balance.market_value() - &self.balance.book_value();
        let delta = &gain - &self.reported;
        self.reported = gain;
        delta
    }
}

/// Balance: change in market value of the value accounts.
#[derive(Debug)]
pub struct BalanceAccumulator<'a> {
    balance: ValueBalance<'a>,
    reported: Inventory,
}

impl<'a> BalanceAccumulator<'a> {
    /// Create a balance accumulator.
    #[must_use]
    pub fn new(accounts: &'a Accounts, prices: &'a PriceMap) -> Self {
        Self {
            balance: ValueBalance::new(accounts, prices),
            reported: Inventory::new(),
        }
    }
}

impl Accumulator for BalanceAccumulator<'_> {
    fn category(&self) -> Category {
        Category::Balance
    }

    fn process(&mut self, txn: &Transaction) {
        self.balance.process(txn);
    }

    fn flush(&mut self) -> Inventory {
        let value = self.balance.market_value();
        let delta = &value - &self.reported;
        self.reported = value;
        delta
    }
}
