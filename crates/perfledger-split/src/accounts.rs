//! Account classification.
//!
//! [`Accounts`] partitions a ledger's account names into the sets the
//! accumulators reason about. It is built once per computation from the
//! account list and an [`AccountPatterns`] configuration:
//!
//! - `value`: accounts matching a value pattern
//! - `income`: remaining accounts matching an income pattern
//! - `expenses`: remaining accounts matching an expense pattern
//! - `internal`: accounts matching an internal pattern, or the income set
//!   when no internal patterns are configured
//! - `external`: everything else, including accounts never declared
//!
//! Patterns match at the start of the account name.

use perfledger_core::Directive;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::SplitError;

/// Regular expressions selecting each account class.
///
/// Deserializes from JSON with every field optional:
///
/// ```
/// use perfledger_split::AccountPatterns;
///
/// let patterns: AccountPatterns =
///     serde_json::from_str(r#"{"value": ["Assets:Investments:"]}"#).unwrap();
/// assert_eq!(patterns.value, ["Assets:Investments:"]);
/// assert_eq!(patterns.income, ["^Income:"]);
/// assert!(patterns.internal.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountPatterns {
    /// Patterns for tracked investment accounts.
    pub value: Vec<String>,
    /// Patterns for income accounts.
    pub income: Vec<String>,
    /// Patterns for expense accounts.
    pub expenses: Vec<String>,
    /// Patterns for accounts inside the portfolio boundary.
    pub internal: Option<Vec<String>>,
}

impl Default for AccountPatterns {
    fn default() -> Self {
        Self {
            value: vec!["^Assets:".to_string()],
            income: vec!["^Income:".to_string()],
            expenses: vec!["^Expenses:".to_string()],
            internal: None,
        }
    }
}

impl AccountPatterns {
    /// Patterns with the given value-account expressions and default
    /// income and expense expressions.
    #[must_use]
    pub fn with_value<S: Into<String>>(value: impl IntoIterator<Item = S>) -> Self {
        Self {
            value: value.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Compiled form of a pattern list.
struct Matcher(Vec<Regex>);

impl Matcher {
    fn new(patterns: &[String]) -> Result<Self, SplitError> {
        patterns
            .iter()
            .map(|pattern| {
                Regex::new(&format!("^(?:{pattern})")).map_err(|source| {
                    SplitError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    fn is_match(&self, account: &str) -> bool {
        self.0.iter().any(|re| re.is_match(account))
    }
}

/// The account partition for one computation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Accounts {
    value: BTreeSet<String>,
    income: BTreeSet<String>,
    expenses: BTreeSet<String>,
    internal: BTreeSet<String>,
    external: BTreeSet<String>,
}

impl Accounts {
    /// Classify `accounts` with `patterns`.
    pub fn new<S: AsRef<str>>(
        accounts: impl IntoIterator<Item = S>,
        patterns: &AccountPatterns,
    ) -> Result<Self, SplitError> {
        let value = Matcher::new(&patterns.value)?;
        let income = Matcher::new(&patterns.income)?;
        let expenses = Matcher::new(&patterns.expenses)?;
        let internal = patterns.internal.as_deref().map(Matcher::new).transpose()?;

        let mut result = Self::default();
        for account in accounts {
            let account = account.as_ref();
            if value.is_match(account) {
                result.value.insert(account.to_string());
            } else if income.is_match(account) {
                result.income.insert(account.to_string());
            } else if expenses.is_match(account) {
                result.expenses.insert(account.to_string());
            }

            let is_internal = match &internal {
                Some(matcher) => matcher.is_match(account),
                None => result.income.contains(account),
            };
            if is_internal {
                result.internal.insert(account.to_string());
            }

            if result.is_external(account) {
                result.external.insert(account.to_string());
            }
        }

        Ok(result)
    }

    /// Classify every account a ledger mentions, in `open` directives or in
    /// postings.
    pub fn from_directives(
        directives: &[Directive],
        patterns: &AccountPatterns,
    ) -> Result<Self, SplitError> {
        Self::new(account_names(directives), patterns)
    }

    /// Value (tracked investment) accounts.
    #[must_use]
    pub const fn value(&self) -> &BTreeSet<String> {
        &self.value
    }

    /// Income accounts.
    #[must_use]
    pub const fn income(&self) -> &BTreeSet<String> {
        &self.income
    }

    /// Expense accounts.
    #[must_use]
    pub const fn expenses(&self) -> &BTreeSet<String> {
        &self.expenses
    }

    /// Internal-flow accounts.
    #[must_use]
    pub const fn internal(&self) -> &BTreeSet<String> {
        &self.internal
    }

    /// Declared accounts outside every other class.
    #[must_use]
    pub const fn external(&self) -> &BTreeSet<String> {
        &self.external
    }

    /// Check if `account` is a value account.
    #[must_use]
    pub fn is_value(&self, account: &str) -> bool {
        self.value.contains(account)
    }

    /// Check if `account` is an income account.
    #[must_use]
    pub fn is_income(&self, account: &str) -> bool {
        self.income.contains(account)
    }

    /// Check if `account` is an expense account.
    #[must_use]
    pub fn is_expense(&self, account: &str) -> bool {
        self.expenses.contains(account)
    }

    /// Check if `account` is an internal-flow account.
    #[must_use]
    pub fn is_internal(&self, account: &str) -> bool {
        self.internal.contains(account)
    }

    /// Check if `account` lies outside the portfolio boundary.
    ///
    /// Accounts that were never classified count as external.
    #[must_use]
    pub fn is_external(&self, account: &str) -> bool {
        !(self.is_value(account)
            || self.is_income(account)
            || self.is_expense(account)
            || self.is_internal(account))
    }

    /// Check if `account` is value, income or expenses.
    #[must_use]
    pub fn is_tracked(&self, account: &str) -> bool {
        self.is_value(account) || self.is_income(account) || self.is_expense(account)
    }
}

/// Every account name a ledger mentions, sorted and deduplicated.
#[must_use]
pub fn account_names(directives: &[Directive]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for directive in directives {
        match directive {
            Directive::Open(open) => {
                names.insert(open.account.clone());
            }
            Directive::Close(close) => {
                names.insert(close.account.clone());
            }
            Directive::Transaction(txn) => {
                for posting in &txn.postings {
                    names.insert(posting.account.clone());
                }
            }
            Directive::Price(_) => {}
        }
    }
    names
}
