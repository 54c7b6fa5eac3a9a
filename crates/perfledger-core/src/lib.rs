//! Core types for perfledger
//!
//! This crate provides the value types the split engine is built on:
//!
//! - [`Amount`] - A decimal number with a currency
//! - [`Cost`] - Acquisition cost of a position (lot)
//! - [`Position`] - Units held at an optional cost
//! - [`Inventory`] - A canonical collection of positions with valuation
//! - [`PriceMap`] - Dated exchange rates with inverse lookup
//! - [`Directive`] - Booked ledger directives (Transaction, Price, Open, Close)
//!
//! # Example
//!
//! ```
//! use perfledger_core::{Amount, Cost, Inventory, Position, PriceMap, Valuation};
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! let mut inv = Inventory::new();
//!
//! // Buy 10 shares at 1 USD
//! let cost = Cost::new(dec!(1), "USD")
//!     .with_date(NaiveDate::from_ymd_opt(2020, 2, 22).unwrap());
//! inv.add(Position::with_cost(Amount::new(dec!(10), "AA"), cost));
//!
//! // Without a price the shares are worth their cost
//! let prices = PriceMap::new();
//! let value = inv.reduce(Valuation::Value, Some(&prices), None);
//! assert_eq!(value.units("USD"), dec!(10));
//!
//! // With a price they are worth their market value
//! let mut prices = PriceMap::new();
//! prices.insert("AA", "USD", NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(), dec!(2));
//! let value = inv.reduce(Valuation::Value, Some(&prices), None);
//! assert_eq!(value.units("USD"), dec!(20));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod cost;
pub mod directive;
pub mod intern;
pub mod inventory;
pub mod position;
pub mod prices;

pub use amount::Amount;
pub use cost::Cost;
pub use directive::{
    sort_directives, Close, Directive, DirectivePriority, Open, Posting, Price, Transaction,
};
pub use intern::InternedStr;
pub use inventory::{Inventory, Valuation};
pub use position::Position;
pub use prices::{PriceMap, PricePoint};

// Re-export commonly used external types
pub use chrono::NaiveDate;
pub use rust_decimal::Decimal;
