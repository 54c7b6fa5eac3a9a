//! Directive types for a booked ledger.
//!
//! The split engine consumes ledgers whose postings have already been booked:
//! every posting carries complete units and, for lots, a resolved cost. Four
//! directive types matter:
//!
//! - [`Transaction`] - transfers between accounts
//! - [`Price`] - a price observation for a commodity
//! - [`Open`] - declares an account
//! - [`Close`] - retires an account
//!
//! Directives serialize as internally tagged JSON objects:
//!
//! ```
//! use perfledger_core::Directive;
//!
//! let json = r#"{
//!     "type": "transaction",
//!     "date": "2020-01-01",
//!     "narration": "Deposit",
//!     "postings": [
//!         {"account": "Assets:Cash", "units": {"number": "10", "currency": "GBP"}},
//!         {"account": "Equity:Opening", "units": {"number": "-10", "currency": "GBP"}}
//!     ]
//! }"#;
//! let directive: Directive = serde_json::from_str(json).unwrap();
//! assert_eq!(directive.as_transaction().unwrap().postings.len(), 2);
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::intern::InternedStr;
use crate::{Amount, Cost, Position};

/// A booked posting within a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Account the units are booked to
    pub account: String,
    /// The units moved
    pub units: Amount,
    /// Cost basis of the lot, if the units are held at cost
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Cost>,
}

impl Posting {
    /// Create a new posting with the given account and units.
    #[must_use]
    pub fn new(account: impl Into<String>, units: Amount) -> Self {
        Self {
            account: account.into(),
            units,
            cost: None,
        }
    }

    /// Add a cost basis.
    #[must_use]
    pub fn with_cost(mut self, cost: Cost) -> Self {
        self.cost = Some(cost);
        self
    }

    /// The position this posting books into its account.
    #[must_use]
    pub fn position(&self) -> Position {
        Position {
            units: self.units.clone(),
            cost: self.cost.clone(),
        }
    }

    /// The cost-preferred amount of this posting.
    #[must_use]
    pub fn weight(&self) -> Amount {
        match &self.cost {
            Some(cost) => cost.total_cost(self.units.number),
            None => self.units.clone(),
        }
    }
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}  {}", self.account, self.units)?;
        if let Some(cost) = &self.cost {
            write!(f, " {cost}")?;
        }
        Ok(())
    }
}

/// Tie-breaker for directives sharing a date.
///
/// Prices sort after transactions so that a same-day price never precedes
/// the purchase it would otherwise shadow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirectivePriority {
    /// First on its date
    Open = 0,
    /// Main entries
    Transaction = 1,
    /// Prices at end of day
    Price = 2,
    /// Last on its date, after every posting
    Close = 3,
}

/// The directive types the split engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Directive {
    /// Moves amounts between accounts
    Transaction(Transaction),
    /// Market price of a commodity
    Price(Price),
    /// Declares an account
    Open(Open),
    /// Retires an account
    Close(Close),
}

impl Directive {
    /// The directive's date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        match self {
            Self::Transaction(t) => t.date,
            Self::Price(p) => p.date,
            Self::Open(o) => o.date,
            Self::Close(c) => c.date,
        }
    }

    /// The transaction, if this directive is one.
    #[must_use]
    pub const fn as_transaction(&self) -> Option<&Transaction> {
        match self {
            Self::Transaction(t) => Some(t),
            _ => None,
        }
    }

    /// Where this directive sorts among those of the same date.
    #[must_use]
    pub const fn priority(&self) -> DirectivePriority {
        match self {
            Self::Open(_) => DirectivePriority::Open,
            Self::Transaction(_) => DirectivePriority::Transaction,
            Self::Price(_) => DirectivePriority::Price,
            Self::Close(_) => DirectivePriority::Close,
        }
    }
}

/// Put a ledger in processing order: by date, then [`DirectivePriority`].
///
/// Directives that tie on both keep their relative order.
pub fn sort_directives(directives: &mut [Directive]) {
    directives.sort_by_key(|d| (d.date(), d.priority()));
}

const fn default_flag() -> char {
    '*'
}

/// A dated, balanced set of postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction date
    pub date: NaiveDate,
    /// Completion flag, `*` or `!`
    #[serde(default = "default_flag")]
    pub flag: char,
    /// Payee (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payee: Option<String>,
    /// Free-text description
    #[serde(default)]
    pub narration: String,
    /// Booked postings
    #[serde(default)]
    pub postings: Vec<Posting>,
}

impl Transaction {
    /// Start a transaction without postings.
    #[must_use]
    pub fn new(date: NaiveDate, narration: impl Into<String>) -> Self {
        Self {
            date,
            flag: default_flag(),
            payee: None,
            narration: narration.into(),
            postings: Vec::new(),
        }
    }

    /// Add a posting.
    #[must_use]
    pub fn with_posting(mut self, posting: Posting) -> Self {
        self.postings.push(posting);
        self
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.date, self.flag)?;
        if let Some(payee) = &self.payee {
            write!(f, "\"{payee}\" ")?;
        }
        write!(f, "\"{}\"", self.narration)?;
        for posting in &self.postings {
            write!(f, "\n{posting}")?;
        }
        Ok(())
    }
}

/// Declares an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Open {
    /// Opening date
    pub date: NaiveDate,
    /// Full account name
    pub account: String,
    /// Declared currencies, informational only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub currencies: Vec<String>,
}

impl Open {
    /// Open `account` on `date`.
    #[must_use]
    pub fn new(date: NaiveDate, account: impl Into<String>) -> Self {
        Self {
            date,
            account: account.into(),
            currencies: Vec::new(),
        }
    }

}

impl fmt::Display for Open {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} open {}", self.date, self.account)?;
        if !self.currencies.is_empty() {
            write!(f, " {}", self.currencies.join(","))?;
        }
        Ok(())
    }
}

/// Retires an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Close {
    /// Closing date
    pub date: NaiveDate,
    /// Account name
    pub account: String,
}

impl fmt::Display for Close {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} close {}", self.date, self.account)
    }
}

/// A price directive.
///
/// One unit of `currency` is worth `amount` on `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Price date
    pub date: NaiveDate,
    /// Currency being priced
    pub currency: InternedStr,
    /// Price of one unit, in the quote currency
    pub amount: Amount,
}

impl Price {
    /// Price one unit of `currency` at `amount` on `date`.
    #[must_use]
    pub fn new(date: NaiveDate, currency: impl Into<InternedStr>, amount: Amount) -> Self {
        Self {
            date,
            currency: currency.into(),
            amount,
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} price {} {}", self.date, self.currency, self.amount)
    }
}
