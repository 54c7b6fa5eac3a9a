//! Inventory type representing a collection of positions.
//!
//! An [`Inventory`] tracks holdings as a list of [`Position`]s kept in a
//! canonical order (units currency, then cost). Adding a position books it
//! against the line with the same key, so two inventories holding the same
//! quantities compare equal regardless of the order they were built in.
//! Lines whose quantity reaches zero are removed.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
// `Add` is implemented by path: with it in scope `inv.add(position)` would
// resolve to the operator instead of `Inventory::add`.
use std::ops::{AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::{Amount, Position, PriceMap};

/// How an inventory is collapsed to a single-number-per-currency view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Valuation {
    /// Strip costs and keep units.
    Units,
    /// Lots become `units × cost` in the cost currency.
    Cost,
    /// Lots are valued at market price, falling back to cost.
    #[default]
    Value,
}

impl FromStr for Valuation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "units" => Ok(Self::Units),
            "cost" => Ok(Self::Cost),
            "value" => Ok(Self::Value),
            _ => Err(format!("unknown valuation: {s}")),
        }
    }
}

impl fmt::Display for Valuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Units => write!(f, "units"),
            Self::Cost => write!(f, "cost"),
            Self::Value => write!(f, "value"),
        }
    }
}

/// An inventory is a collection of positions.
///
/// # Examples
///
/// ```
/// use perfledger_core::{Amount, Cost, Inventory, Position, PriceMap, Valuation};
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let mut inv = Inventory::new();
/// inv.add(Position::simple(Amount::new(dec!(100), "USD")));
/// inv.add(Position::with_cost(
///     Amount::new(dec!(10), "AA"),
///     Cost::new(dec!(1), "USD"),
/// ));
/// assert_eq!(inv.units("AA"), dec!(10));
///
/// let mut prices = PriceMap::new();
/// prices.insert("AA", "USD", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), dec!(2));
///
/// let value = inv.reduce(Valuation::Value, Some(&prices), None);
/// assert_eq!(value.units("USD"), dec!(120));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Inventory {
    positions: Vec<Position>,
}

impl Inventory {
    /// Create an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all positions, in canonical order.
    #[must_use]
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Check if inventory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Get the number of inventory lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Get total units of a currency (ignoring cost lots).
    #[must_use]
    pub fn units(&self, currency: &str) -> Decimal {
        self.positions
            .iter()
            .filter(|p| p.units.currency == currency)
            .map(|p| p.units.number)
            .sum()
    }

    /// Get all currencies in this inventory, sorted.
    #[must_use]
    pub fn currencies(&self) -> Vec<&str> {
        let mut currencies: Vec<&str> = self
            .positions
            .iter()
            .map(|p| p.units.currency.as_str())
            .collect();
        currencies.dedup();
        currencies
    }

    /// Add a position to the inventory.
    ///
    /// The position is booked against the line with the same units currency
    /// and cost. A line whose quantity becomes zero is removed.
    pub fn add(&mut self, position: Position) {
        if position.is_empty() {
            return;
        }

        match self
            .positions
            .binary_search_by(|existing| existing.key_cmp(&position))
        {
            Ok(idx) => {
                self.positions[idx].units += &position.units;
                if self.positions[idx].is_empty() {
                    self.positions.remove(idx);
                }
            }
            Err(idx) => self.positions.insert(idx, position),
        }
    }

    /// Add a plain amount (a position without cost).
    pub fn add_amount(&mut self, amount: Amount) {
        self.add(Position::simple(amount));
    }

    /// Merge another inventory into this one.
    pub fn merge(&mut self, other: &Self) {
        for pos in &other.positions {
            self.add(pos.clone());
        }
    }

    /// Flip the sign of every line in place.
    pub fn negate(&mut self) {
        for pos in &mut self.positions {
            pos.units.number = -pos.units.number;
        }
    }

    /// Collapse the inventory to one amount per currency.
    ///
    /// - [`Valuation::Units`]: costs are stripped.
    /// - [`Valuation::Cost`]: lots become their book value; uncosted lines
    ///   stay as units.
    /// - [`Valuation::Value`]: lots are priced in their cost currency at
    ///   `date` (the latest price when `date` is `None`) and fall back to
    ///   book value when no rate is known or no price map is given.
    ///
    /// The source inventory is left untouched.
    #[must_use]
    pub fn reduce(
        &self,
        valuation: Valuation,
        prices: Option<&PriceMap>,
        date: Option<NaiveDate>,
    ) -> Self {
        let mut result = Self::new();
        for pos in &self.positions {
            let amount = match (valuation, prices) {
                (Valuation::Units, _) => pos.units.clone(),
                (Valuation::Cost, _) | (Valuation::Value, None) => pos.weight(),
                (Valuation::Value, Some(prices)) => pos.market_value(prices, date),
            };
            result.add_amount(amount);
        }
        result
    }

    /// Convert inventory to cost basis.
    #[must_use]
    pub fn at_cost(&self) -> Self {
        self.reduce(Valuation::Cost, None, None)
    }

    /// Convert inventory to units only.
    #[must_use]
    pub fn at_units(&self) -> Self {
        self.reduce(Valuation::Units, None, None)
    }

    /// Check that every line is within `tolerance` of zero.
    #[must_use]
    pub fn is_near_zero(&self, tolerance: Decimal) -> bool {
        self.positions
            .iter()
            .all(|p| p.units.is_near_zero(tolerance))
    }
}

impl fmt::Display for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(empty)");
        }

        for (i, pos) in self.positions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{pos}")?;
        }
        Ok(())
    }
}

impl FromIterator<Position> for Inventory {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        let mut inv = Self::new();
        for pos in iter {
            inv.add(pos);
        }
        inv
    }
}

impl FromIterator<Amount> for Inventory {
    fn from_iter<I: IntoIterator<Item = Amount>>(iter: I) -> Self {
        iter.into_iter().map(Position::simple).collect()
    }
}

impl AddAssign<&Self> for Inventory {
    fn add_assign(&mut self, other: &Self) {
        self.merge(other);
    }
}

impl SubAssign<&Self> for Inventory {
    fn sub_assign(&mut self, other: &Self) {
        for pos in &other.positions {
            self.add(pos.neg());
        }
    }
}

impl std::ops::Add for &Inventory {
    type Output = Inventory;

    fn add(self, other: &Inventory) -> Inventory {
        let mut result = self.clone();
        result += other;
        result
    }
}

impl Sub for &Inventory {
    type Output = Inventory;

    fn sub(self, other: &Inventory) -> Inventory {
        let mut result = self.clone();
        result -= other;
        result
    }
}

impl Neg for &Inventory {
    type Output = Inventory;

    fn neg(self) -> Inventory {
        let mut result = self.clone();
        result.negate();
        result
    }
}

impl std::ops::Add for Inventory {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += &other;
        self
    }
}

impl Sub for Inventory {
    type Output = Self;

    fn sub(mut self, other: Self) -> Self {
        self -= &other;
        self
    }
}

impl Neg for Inventory {
    type Output = Self;

    fn neg(mut self) -> Self {
        self.negate();
        self
    }
}

impl<'a> Sum<&'a Self> for Inventory {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Self::new(), |mut acc, inv| {
            acc += inv;
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cost;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn cash(number: Decimal, currency: &str) -> Position {
        Position::simple(Amount::new(number, currency))
    }

    fn lot(units: Decimal, currency: &str, cost: Decimal) -> Position {
        Position::with_cost(Amount::new(units, currency), Cost::new(cost, "USD"))
    }

    #[test]
    fn test_empty_inventory() {
        let inv = Inventory::new();
        assert!(inv.is_empty());
        assert_eq!(inv.len(), 0);
        assert_eq!(format!("{inv}"), "(empty)");
    }

    #[test]
    fn test_add_merge_simple() {
        let mut inv = Inventory::new();
        inv.add(cash(dec!(100), "USD"));
        inv.add(cash(dec!(50), "USD"));

        assert_eq!(inv.len(), 1);
        assert_eq!(inv.units("USD"), dec!(150));
    }

    #[test]
    fn test_booking_matches_operator() {
        let mut booked: Inventory = vec![cash(dec!(1), "USD")].into_iter().collect();
        booked.add(lot(dec!(2), "AA", dec!(1)));

        let lots: Inventory = std::iter::once(lot(dec!(2), "AA", dec!(1))).collect();
        let cash_only: Inventory = std::iter::once(cash(dec!(1), "USD")).collect();
        assert_eq!(booked, &cash_only + &lots);
        assert_eq!(booked, cash_only + lots);
    }

    #[test]
    fn test_add_removes_zero_lines() {
        let mut inv = Inventory::new();
        inv.add(cash(dec!(100), "USD"));
        inv.add(cash(dec!(-100), "USD"));
        assert!(inv.is_empty());

        inv.add(cash(dec!(0), "GBP"));
        assert!(inv.is_empty());
    }

    #[test]
    fn test_lots_with_different_costs_stay_apart() {
        let mut inv = Inventory::new();
        inv.add(lot(dec!(10), "AA", dec!(1)));
        inv.add(lot(dec!(5), "AA", dec!(2)));
        assert_eq!(inv.len(), 2);
        assert_eq!(inv.units("AA"), dec!(15));

        inv.add(lot(dec!(-10), "AA", dec!(1)));
        assert_eq!(inv.len(), 1);
        assert_eq!(inv.positions()[0].cost, Some(Cost::new(dec!(2), "USD")));
    }

    #[test]
    fn test_equality_is_order_independent() {
        let a: Inventory = vec![
            cash(dec!(1), "USD"),
            lot(dec!(2), "AA", dec!(1)),
            cash(dec!(3), "GBP"),
        ]
        .into_iter()
        .collect();
        let b: Inventory = vec![
            cash(dec!(3), "GBP"),
            cash(dec!(1), "USD"),
            lot(dec!(2), "AA", dec!(1)),
        ]
        .into_iter()
        .collect();
        assert_eq!(a, b);
        assert_eq!(a.currencies(), vec!["AA", "GBP", "USD"]);
    }

    #[test]
    fn test_arithmetic() {
        let a: Inventory = vec![Amount::new(dec!(10), "GBP")].into_iter().collect();
        let b: Inventory = vec![Amount::new(dec!(4), "GBP")].into_iter().collect();

        assert_eq!((&a - &b).units("GBP"), dec!(6));
        assert_eq!((&a + &b).units("GBP"), dec!(14));
        assert_eq!((-&a).units("GBP"), dec!(-10));
        assert!((&a - &a).is_empty());

        let total: Inventory = [a.clone(), b.clone()].iter().sum();
        assert_eq!(total, &a + &b);
    }

    #[test]
    fn test_reduce_units_and_cost() {
        let inv: Inventory = vec![lot(dec!(10), "AA", dec!(1.5)), cash(dec!(5), "USD")]
            .into_iter()
            .collect();

        let units = inv.reduce(Valuation::Units, None, None);
        assert_eq!(units.units("AA"), dec!(10));
        assert!(units.positions().iter().all(|p| p.cost.is_none()));

        let cost = inv.at_cost();
        assert_eq!(cost.len(), 1);
        assert_eq!(cost.units("USD"), dec!(20));
    }

    #[test]
    fn test_lot_in_own_currency_is_worth_its_units() {
        let own = Position::with_cost(
            Amount::new(dec!(-0.01), "GBP"),
            Cost::new(dec!(2), "GBP"),
        );
        let inv: Inventory = std::iter::once(own).collect();
        let prices = PriceMap::new();

        let value = inv.reduce(Valuation::Value, Some(&prices), Some(date(2020, 1, 1)));
        assert_eq!(value.units("GBP"), dec!(-0.01));
        assert_eq!(inv.at_cost().units("GBP"), dec!(-0.02));
    }

    #[test]
    fn test_reduce_value() {
        let mut prices = PriceMap::new();
        prices.insert("AA", "USD", date(2020, 1, 1), dec!(2));
        prices.insert("AA", "USD", date(2020, 6, 1), dec!(3));

        let inv: Inventory = vec![lot(dec!(10), "AA", dec!(1)), lot(dec!(1), "BB", dec!(7))]
            .into_iter()
            .collect();

        let early = inv.reduce(Valuation::Value, Some(&prices), Some(date(2020, 3, 1)));
        assert_eq!(early.units("USD"), dec!(27));

        let latest = inv.reduce(Valuation::Value, Some(&prices), None);
        assert_eq!(latest.units("USD"), dec!(37));

        // Before the first price the lot falls back to cost.
        let before = inv.reduce(Valuation::Value, Some(&prices), Some(date(2019, 1, 1)));
        assert_eq!(before.units("USD"), dec!(17));

        // The source inventory is untouched.
        assert_eq!(inv.units("AA"), dec!(10));
    }

    #[test]
    fn test_is_near_zero() {
        let inv: Inventory = vec![Amount::new(dec!(0.001), "USD")].into_iter().collect();
        assert!(inv.is_near_zero(dec!(0.005)));
        assert!(!inv.is_near_zero(dec!(0.0001)));
    }

    #[test]
    fn test_valuation_from_str() {
        assert_eq!("value".parse::<Valuation>(), Ok(Valuation::Value));
        assert_eq!("Cost".parse::<Valuation>(), Ok(Valuation::Cost));
        assert!("market".parse::<Valuation>().is_err());
    }

    #[test]
    fn test_display() {
        let inv: Inventory = vec![cash(dec!(100), "USD"), cash(dec!(2), "GBP")]
            .into_iter()
            .collect();
        assert_eq!(format!("{inv}"), "2 GBP, 100 USD");
    }
}
