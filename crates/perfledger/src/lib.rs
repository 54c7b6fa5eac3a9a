//! Portfolio performance CLI tools.
//!
//! This crate provides the `perf-split` command, which reads a booked ledger
//! as JSON and reports how the value of the investment accounts changed:
//!
//! - `perf-split ledger.json split`: per-period contributions, withdrawals,
//!   dividends, costs, realized and unrealized gains
//! - `perf-split ledger.json balances`: the account tree of the investment
//!   accounts with unrealized gains
//! - `perf-split ledger.json gains`: realized gains per sale
//!
//! # Example Usage
//!
//! ```bash
//! perf-split ledger.json split --interval month
//! perf-split ledger.json --patterns accounts.json balances --as-of 2024-12-31
//! RUST_LOG=perfledger_split=debug perf-split ledger.json gains
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
