//! Gains reports.
//!
//! Unrealized gains are read off a [`BalanceTree`]: market value over cost
//! of what each value account holds. Realized gains are listed per sale.

use chrono::NaiveDate;
use perfledger_core::{Directive, Inventory, PriceMap, Valuation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::accumulators::{include_postings, TransactionProfile};
use crate::tree::BalanceTree;
use crate::Accounts;

/// Unrealized gain of every value account with a non-zero gain.
///
/// The gain of an account is the market value of its own balance at `date`
/// minus its cost. Lots without a price are valued at cost and so carry no
/// gain.
#[must_use]
pub fn unrealized_gains_per_account(
    tree: &BalanceTree,
    accounts: &Accounts,
    prices: &PriceMap,
    date: Option<NaiveDate>,
) -> BTreeMap<String, Inventory> {
    accounts
        .value()
        .iter()
        .filter_map(|account| {
            let node = tree.get(account)?;
            let value = node.balance.reduce(Valuation::Value, Some(prices), date);
            let gain = &value - &node.balance.at_cost();
            (!gain.is_empty()).then(|| (account.clone(), gain))
        })
        .collect()
}

/// Unrealized gain over all value accounts.
#[must_use]
pub fn unrealized_gains_total(
    tree: &BalanceTree,
    accounts: &Accounts,
    prices: &PriceMap,
    date: Option<NaiveDate>,
) -> Inventory {
    unrealized_gains_per_account(tree, accounts, prices, date)
        .values()
        .sum()
}

/// One sale that realized a gain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealizedGain {
    /// Date of the sale.
    pub date: NaiveDate,
    /// Narration of the sale transaction.
    pub narration: String,
    /// Gain realized by this sale.
    pub gain: Inventory,
    /// Gains realized up to and including this sale.
    pub total: Inventory,
}

/// Every sale of a value-account lot that books to an internal account,
/// with the gain it realized and the running total.
#[must_use]
pub fn realized_gains(directives: &[Directive], accounts: &Accounts) -> Vec<RealizedGain> {
    let mut total = Inventory::new();
    let mut rows = Vec::new();
    for txn in directives.iter().filter_map(Directive::as_transaction) {
        let profile = TransactionProfile::new(txn, accounts);
        if !(profile.sale && profile.internal_flow) {
            continue;
        }
        let gain = -include_postings(txn, |p| accounts.is_internal(&p.account));
        total += &gain;
        rows.push(RealizedGain {
            date: txn.date,
            narration: txn.narration.clone(),
            gain,
            total: total.clone(),
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AccountPatterns;
    use perfledger_core::{Amount, Cost, Posting, Price, Transaction};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn trade(on: NaiveDate, units: Decimal, cost: Decimal, cash: Decimal) -> Transaction {
        Transaction::new(on, "trade")
            .with_posting(
                Posting::new("Assets:Account", Amount::new(units, "AA"))
                    .with_cost(Cost::new(cost, "USD")),
            )
            .with_posting(Posting::new("Assets:Bank", Amount::new(cash, "USD")))
    }

    fn ledger() -> Vec<Directive> {
        vec![
            Directive::Transaction(trade(date(2020, 2, 22), dec!(1), dec!(1), dec!(-1))),
            Directive::Transaction(
                trade(date(2020, 2, 23), dec!(-1), dec!(1), dec!(2)).with_posting(Posting::new(
                    "Income:Gains",
                    Amount::new(dec!(-1), "USD"),
                )),
            ),
            Directive::Transaction(trade(date(2020, 2, 24), dec!(1), dec!(2), dec!(-2))),
            Directive::Price(Price::new(date(2020, 2, 24), "AA", Amount::new(dec!(4), "USD"))),
        ]
    }

    fn accounts(directives: &[Directive]) -> Accounts {
        Accounts::from_directives(directives, &AccountPatterns::with_value(["^Assets:Account"]))
            .unwrap()
    }

    #[test]
    fn test_unrealized_gains_ignore_realized() {
        let directives = ledger();
        let accounts = accounts(&directives);
        let prices = PriceMap::from_directives(&directives);
        let tree = BalanceTree::from_directives(&directives, None);

        let per_account = unrealized_gains_per_account(&tree, &accounts, &prices, None);
        assert_eq!(per_account.len(), 1);
        assert_eq!(per_account["Assets:Account"].units("USD"), dec!(2));
        assert_eq!(
            unrealized_gains_total(&tree, &accounts, &prices, None).units("USD"),
            dec!(2)
        );
    }

    #[test]
    fn test_no_gain_without_price() {
        let directives = ledger();
        let accounts = accounts(&directives);
        let tree = BalanceTree::from_directives(&directives, None);

        assert!(unrealized_gains_per_account(&tree, &accounts, &PriceMap::new(), None).is_empty());
    }

    #[test]
    fn test_realized_gains_rows() {
        let directives = ledger();
        let accounts = accounts(&directives);

        let rows = realized_gains(&directives, &accounts);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, date(2020, 2, 23));
        assert_eq!(rows[0].gain.units("USD"), dec!(1));
        assert_eq!(rows[0].total, rows[0].gain);
    }
}
