//! Position type representing units held at a cost.
//!
//! A [`Position`] represents a holding of some units of a currency or commodity,
//! optionally with an associated cost basis (lot). Positions with costs are
//! the ones that can be valued at market price; plain currency positions are
//! always worth their units.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::{Amount, Cost, PriceMap};

/// A position is units of a currency held at an optional cost.
///
/// # Examples
///
/// ```
/// use perfledger_core::{Amount, Cost, Position};
/// use rust_decimal_macros::dec;
///
/// // Simple position (no cost)
/// let cash = Position::simple(Amount::new(dec!(1000.00), "GBP"));
/// assert_eq!(cash.weight(), Amount::new(dec!(1000.00), "GBP"));
///
/// // Position with cost (lot)
/// let fund = Position::with_cost(
///     Amount::new(dec!(10), "VLS"),
///     Cost::new(dec!(2.50), "GBP"),
/// );
/// assert_eq!(fund.weight(), Amount::new(dec!(25.00), "GBP"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// The units held (number + currency/commodity)
    pub units: Amount,
    /// The cost basis (if tracked)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Cost>,
}

impl Position {
    /// Create a new position without cost tracking.
    #[must_use]
    pub const fn simple(units: Amount) -> Self {
        Self { units, cost: None }
    }

    /// Create a new position with cost tracking.
    #[must_use]
    pub const fn with_cost(units: Amount, cost: Cost) -> Self {
        Self {
            units,
            cost: Some(cost),
        }
    }

    /// Check if this position is empty (zero units).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.units.is_zero()
    }

    /// Get the currency of this position's units.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.units.currency
    }

    /// Get the cost currency, if this position has a cost.
    #[must_use]
    pub fn cost_currency(&self) -> Option<&str> {
        self.cost.as_ref().map(|c| c.currency.as_str())
    }

    /// Calculate the book value (total cost) of this position.
    ///
    /// Returns `None` if there is no cost.
    #[must_use]
    pub fn book_value(&self) -> Option<Amount> {
        self.cost.as_ref().map(|c| c.total_cost(self.units.number))
    }

    /// The cost-preferred amount of this position: its book value when it
    /// carries a cost, otherwise its units.
    #[must_use]
    pub fn weight(&self) -> Amount {
        self.book_value().unwrap_or_else(|| self.units.clone())
    }

    /// Value this position at market price.
    ///
    /// Lots are priced in their cost currency at `date` (the latest price
    /// when `date` is `None`), falling back to the book value when the price
    /// map has no rate or the product overflows. Positions without a cost are worth their units.
    #[must_use]
    pub fn market_value(&self, prices: &PriceMap, date: Option<NaiveDate>) -> Amount {
        let Some(cost) = &self.cost else {
            return self.units.clone();
        };
        let rate = match date {
            Some(date) => prices.get_price(&self.units.currency, &cost.currency, date),
            None => prices.get_latest_price(&self.units.currency, &cost.currency),
        };
        rate.and_then(|rate| self.units.convert(rate, cost.currency.clone()))
            .unwrap_or_else(|| cost.total_cost(self.units.number))
    }

    /// Negate this position (reverse the sign of units).
    #[must_use]
    pub fn neg(&self) -> Self {
        Self {
            units: -&self.units,
            cost: self.cost.clone(),
        }
    }

    /// Canonical ordering of inventory lines: by units currency, then with
    /// uncosted positions before lots, then by cost.
    #[must_use]
    pub fn key_cmp(&self, other: &Self) -> Ordering {
        self.units
            .currency
            .cmp(&other.units.currency)
            .then_with(|| self.cost.cmp(&other.cost))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.units)?;
        if let Some(cost) = &self.cost {
            write!(f, " {cost}")?;
        }
        Ok(())
    }
}
