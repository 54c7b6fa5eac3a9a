//! Property-based tests for perfledger-core.
//!
//! These tests verify that inventory algebra and valuation hold for
//! arbitrary inputs using proptest.
//!
//! Run with: cargo test -p perfledger-core --test `property_tests`

use chrono::NaiveDate;
use perfledger_core::{Amount, Cost, Inventory, Position, PriceMap, Valuation};
use proptest::prelude::*;
use rust_decimal::Decimal;

// ============================================================================
// Arbitrary generators
// ============================================================================

fn arb_decimal() -> impl Strategy<Value = Decimal> {
    (-1_000_000i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_positive_decimal() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_currency() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("USD".to_string()),
        Just("GBP".to_string()),
        Just("AA".to_string()),
        Just("VLS".to_string()),
    ]
}

fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2025i32, 1u32..13u32, 1u32..29u32)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn arb_cost() -> impl Strategy<Value = Cost> {
    (
        (1i64..500i64).prop_map(Decimal::from),
        prop_oneof![Just("USD"), Just("GBP")],
        prop::option::of(arb_date()),
    )
        .prop_map(|(n, c, date)| {
            let mut cost = Cost::new(n, c);
            if let Some(d) = date {
                cost = cost.with_date(d);
            }
            cost
        })
}

fn arb_position() -> impl Strategy<Value = Position> {
    (arb_decimal(), arb_currency(), prop::option::of(arb_cost())).prop_map(
        |(n, currency, cost)| {
            let units = Amount::new(n, currency);
            match cost {
                // A lot priced in its own currency is valued at its units.
                Some(mut c) if c.currency == units.currency => {
                    c.currency = if c.currency == "USD" { "GBP" } else { "USD" }.into();
                    Position::with_cost(units, c)
                }
                Some(c) => Position::with_cost(units, c),
                None => Position::simple(units),
            }
        },
    )
}

fn arb_inventory() -> impl Strategy<Value = Inventory> {
    prop::collection::vec(arb_position(), 0..12).prop_map(|positions| {
        positions.into_iter().collect()
    })
}

fn arb_prices() -> impl Strategy<Value = PriceMap> {
    prop::collection::vec(
        (
            prop_oneof![Just("AA"), Just("VLS")],
            prop_oneof![Just("USD"), Just("GBP")],
            arb_date(),
            arb_positive_decimal(),
        ),
        0..8,
    )
    .prop_map(|observations| {
        let mut prices = PriceMap::new();
        for (base, quote, date, rate) in observations {
            prices.insert(base, quote, date, rate);
        }
        prices
    })
}

// ============================================================================
// Inventory algebra
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// No line of an inventory ever holds zero units.
    #[test]
    fn prop_inventory_has_no_zero_lines(inv in arb_inventory()) {
        prop_assert!(inv.positions().iter().all(|p| !p.units.is_zero()));
    }

    /// Positions are kept in strictly increasing key order.
    #[test]
    fn prop_inventory_is_canonical(inv in arb_inventory()) {
        for pair in inv.positions().windows(2) {
            prop_assert_eq!(pair[0].key_cmp(&pair[1]), std::cmp::Ordering::Less);
        }
    }

    /// Building from the same positions in any order gives an equal inventory.
    #[test]
    fn prop_inventory_order_independent(
        positions in prop::collection::vec(arb_position(), 0..12)
    ) {
        let forward: Inventory = positions.iter().cloned().collect();
        let backward: Inventory = positions.iter().rev().cloned().collect();
        prop_assert_eq!(forward, backward);
    }

    /// Addition is commutative.
    #[test]
    fn prop_inventory_addition_commutative(a in arb_inventory(), b in arb_inventory()) {
        prop_assert_eq!(&a + &b, &b + &a);
    }

    /// Addition is associative.
    #[test]
    fn prop_inventory_addition_associative(
        a in arb_inventory(),
        b in arb_inventory(),
        c in arb_inventory()
    ) {
        prop_assert_eq!(&(&a + &b) + &c, &a + &(&b + &c));
    }

    /// An inventory minus itself is empty.
    #[test]
    fn prop_inventory_self_subtraction_empty(a in arb_inventory()) {
        prop_assert!((&a - &a).is_empty());
        prop_assert!((&a + &(-&a)).is_empty());
    }

    /// Units per currency are additive.
    #[test]
    fn prop_inventory_units_additive(
        a in arb_inventory(),
        b in arb_inventory(),
        currency in arb_currency()
    ) {
        let sum = &a + &b;
        prop_assert_eq!(sum.units(&currency), a.units(&currency) + b.units(&currency));
    }
}

// ============================================================================
// Valuation
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every valuation is linear in the inventory.
    #[test]
    fn prop_reduce_is_linear(
        a in arb_inventory(),
        b in arb_inventory(),
        prices in arb_prices(),
        date in prop::option::of(arb_date())
    ) {
        for valuation in [Valuation::Units, Valuation::Cost, Valuation::Value] {
            let whole = (&a + &b).reduce(valuation, Some(&prices), date);
            let parts = &a.reduce(valuation, Some(&prices), date)
                + &b.reduce(valuation, Some(&prices), date);
            prop_assert_eq!(whole, parts);
        }
    }

    /// Reduced inventories never carry costs.
    #[test]
    fn prop_reduce_strips_costs(
        inv in arb_inventory(),
        prices in arb_prices(),
        date in prop::option::of(arb_date())
    ) {
        for valuation in [Valuation::Units, Valuation::Cost, Valuation::Value] {
            let reduced = inv.reduce(valuation, Some(&prices), date);
            prop_assert!(reduced.positions().iter().all(|p| p.cost.is_none()));
        }
    }

    /// With no prices, market value equals cost.
    #[test]
    fn prop_value_without_prices_is_cost(inv in arb_inventory(), date in arb_date()) {
        let prices = PriceMap::new();
        prop_assert_eq!(
            inv.reduce(Valuation::Value, Some(&prices), Some(date)),
            inv.at_cost()
        );
    }

    /// Units valuation preserves per-currency totals.
    #[test]
    fn prop_units_preserved(inv in arb_inventory(), currency in arb_currency()) {
        prop_assert_eq!(inv.at_units().units(&currency), inv.units(&currency));
    }
}
