//! Portfolio performance split for perfledger.
//!
//! This crate classifies the transactions of a ledger into economic
//! categories and reports, per period, how much of the change in value of
//! the investment ("value") accounts each category explains:
//!
//! - [`Accounts`] - Partition of account names into value, income, expenses,
//!   internal and external accounts
//! - [`Accumulator`] - One stateful processor per [`Category`]
//! - [`compute_split`] - The streaming driver, bucketing by [`Interval`]
//! - [`reconcile`] - Check that the categories add up to the value
//! - [`BalanceTree`] - Account tree with pruning to a subset of accounts
//!
//! # Example
//!
//! ```
//! use perfledger_core::{Amount, Cost, Directive, NaiveDate, Posting, Transaction};
//! use perfledger_split::{
//!     compute_split, AccountPatterns, Accounts, Category, SplitOptions,
//! };
//! use rust_decimal_macros::dec;
//!
//! let date = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
//! let directives = vec![Directive::Transaction(
//!     Transaction::new(date, "Buy")
//!         .with_posting(
//!             Posting::new("Assets:Account", Amount::new(dec!(1), "AA"))
//!                 .with_cost(Cost::new(dec!(1), "USD")),
//!         )
//!         .with_posting(Posting::new("Assets:Bank", Amount::new(dec!(-1), "USD"))),
//! )];
//!
//! let patterns = AccountPatterns::with_value(["^Assets:Account"]);
//! let accounts = Accounts::from_directives(&directives, &patterns).unwrap();
//! let split = compute_split(&directives, &accounts, &Category::ALL, &SplitOptions::default());
//!
//! assert_eq!(split.parts.total(Category::Contributions).units("USD"), dec!(1));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod accounts;
pub mod accumulators;
pub mod error;
pub mod gains;
pub mod interval;
pub mod prices;
pub mod split;
pub mod tree;

pub use accounts::{account_names, AccountPatterns, Accounts};
pub use accumulators::{
    build_accumulators, include_postings, is_commodity_sale, postings_prefer_cost, Accumulator,
    BalanceAccumulator, Category, CostsAccumulator, DividendsAccumulator, FlowAccumulator,
    RealizedGainAccumulator, TransactionProfile, UnrealizedGainAccumulator,
};
pub use error::SplitError;
pub use gains::{
    realized_gains, unrealized_gains_per_account, unrealized_gains_total, RealizedGain,
};
pub use interval::Interval;
pub use prices::build_price_map_with_fallback;
pub use split::{
    calculate_balances, compute_split, compute_split_by_ids, compute_split_with_prices,
    parse_categories, reconcile, sum_inventories, Period, Reconciliation, Split, SplitOptions,
    SplitParts,
};
pub use tree::{accounts_with_parents, value_balance_tree, BalanceTree, TreeNode};
