//! Price map construction with a fallback to purchase cost.
//!
//! A ledger often buys a commodity before any `price` directive for it
//! exists. Without a price the purchase could not be valued, so the cost of
//! the first purchase stands in as a synthetic price until an explicit one
//! is available.

use chrono::NaiveDate;
use perfledger_core::{Directive, InternedStr, PriceMap};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};

type Pair = (InternedStr, InternedStr);

/// Build a price map from `directives`, adding purchase costs as prices.
///
/// For every `(commodity, cost currency)` pair bought at cost before any
/// explicit price of that pair has been seen, the per-unit cost of the first
/// such purchase is recorded at the purchase date. The synthetic price is
/// kept only when the pair has no explicit price at all, or when its first
/// explicit price is strictly later than the purchase.
#[must_use]
pub fn build_price_map_with_fallback(directives: &[Directive]) -> PriceMap {
    let mut prices = PriceMap::from_directives(directives);

    let mut first_explicit: HashMap<Pair, NaiveDate> = HashMap::new();
    let mut seen: HashSet<Pair> = HashSet::new();
    let mut candidates: BTreeMap<Pair, (NaiveDate, Decimal)> = BTreeMap::new();

    for directive in directives {
        match directive {
            Directive::Price(price) => {
                let pair = (price.currency.clone(), price.amount.currency.clone());
                first_explicit.entry(pair.clone()).or_insert(price.date);
                seen.insert(pair);
            }
            Directive::Transaction(txn) => {
                for posting in &txn.postings {
                    let Some(cost) = &posting.cost else {
                        continue;
                    };
                    let pair = (posting.units.currency.clone(), cost.currency.clone());
                    if seen.contains(&pair) {
                        continue;
                    }
                    candidates.entry(pair).or_insert((txn.date, cost.number));
                }
            }
            _ => {}
        }
    }

    let mut synthesized = 0usize;
    for ((base, quote), (date, rate)) in candidates {
        let accepted = match first_explicit.get(&(base.clone(), quote.clone())) {
            Some(first) => *first > date,
            None => true,
        };
        if accepted {
            prices.insert(base, quote, date, rate);
            synthesized += 1;
        }
    }

    tracing::debug!(
        "Price map: {} observations, {} synthesized from cost",
        prices.len(),
        synthesized
    );
    prices
}
