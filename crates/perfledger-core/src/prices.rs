//! Price map for currency conversions.
//!
//! A [`PriceMap`] stores, for every `(base, quote)` pair, a date-ordered list
//! of rates. Lookups return the latest rate at or before a date, and a
//! missing pair falls back to the inverse pair. There is no chained
//! conversion through intermediate currencies.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::intern::InternedStr;
use crate::{Amount, Directive};

/// A single rate observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Date of the observation.
    pub date: NaiveDate,
    /// Units of quote currency per unit of base currency.
    pub rate: Decimal,
}

/// Database of currency prices keyed by `(base, quote)`.
///
/// Serializes as a list of `{base, quote, points}` series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<PriceSeries>", from = "Vec<PriceSeries>")]
pub struct PriceMap {
    prices: BTreeMap<(InternedStr, InternedStr), Vec<PricePoint>>,
}

/// Serialized form of one pair of a [`PriceMap`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PriceSeries {
    base: InternedStr,
    quote: InternedStr,
    points: Vec<PricePoint>,
}

impl From<PriceMap> for Vec<PriceSeries> {
    fn from(map: PriceMap) -> Self {
        map.prices
            .into_iter()
            .map(|((base, quote), points)| PriceSeries {
                base,
                quote,
                points,
            })
            .collect()
    }
}

impl From<Vec<PriceSeries>> for PriceMap {
    fn from(series: Vec<PriceSeries>) -> Self {
        let mut map = Self::new();
        for PriceSeries {
            base,
            quote,
            points,
        } in series
        {
            for point in points {
                map.insert(base.clone(), quote.clone(), point.date, point.rate);
            }
        }
        map
    }
}

impl PriceMap {
    /// Create a new empty price map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a price map from the `price` directives of a ledger.
    #[must_use]
    pub fn from_directives(directives: &[Directive]) -> Self {
        let mut map = Self::new();
        for directive in directives {
            if let Directive::Price(price) = directive {
                map.insert(
                    price.currency.clone(),
                    price.amount.currency.clone(),
                    price.date,
                    price.amount.number,
                );
            }
        }
        map
    }

    /// Record a rate for `base` priced in `quote`.
    ///
    /// A second observation on the same date replaces the first.
    pub fn insert(
        &mut self,
        base: impl Into<InternedStr>,
        quote: impl Into<InternedStr>,
        date: NaiveDate,
        rate: Decimal,
    ) {
        let entries = self
            .prices
            .entry((base.into(), quote.into()))
            .or_default();
        match entries.binary_search_by_key(&date, |p| p.date) {
            Ok(idx) => entries[idx].rate = rate,
            Err(idx) => entries.insert(idx, PricePoint { date, rate }),
        }
    }

    /// Get the rate of `base` in `quote` on or before `date`.
    ///
    /// Tries the direct pair, then the inverse pair.
    #[must_use]
    pub fn get_price(&self, base: &str, quote: &str, date: NaiveDate) -> Option<Decimal> {
        if base == quote {
            return Some(Decimal::ONE);
        }

        if let Some(rate) = self.direct(base, quote, Some(date)) {
            return Some(rate);
        }

        self.direct(quote, base, Some(date)).and_then(invert)
    }

    /// Get the most recent rate of `base` in `quote`.
    #[must_use]
    pub fn get_latest_price(&self, base: &str, quote: &str) -> Option<Decimal> {
        if base == quote {
            return Some(Decimal::ONE);
        }

        if let Some(rate) = self.direct(base, quote, None) {
            return Some(rate);
        }

        self.direct(quote, base, None).and_then(invert)
    }

    fn direct(&self, base: &str, quote: &str, date: Option<NaiveDate>) -> Option<Decimal> {
        let key = (InternedStr::from(base), InternedStr::from(quote));
        let entries = self.prices.get(&key)?;
        match date {
            None => entries.last().map(|p| p.rate),
            Some(date) => {
                let idx = entries.partition_point(|p| p.date <= date);
                idx.checked_sub(1).map(|i| entries[i].rate)
            }
        }
    }

    /// Convert an amount to a target currency at a date.
    ///
    /// Returns `None` if no rate is available or the product overflows.
    #[must_use]
    pub fn convert(&self, amount: &Amount, to_currency: &str, date: NaiveDate) -> Option<Amount> {
        self.get_price(&amount.currency, to_currency, date)
            .and_then(|rate| amount.convert(rate, to_currency))
    }

    /// All observations of one pair, in date order.
    #[must_use]
    pub fn observations(&self, base: &str, quote: &str) -> &[PricePoint] {
        let key = (InternedStr::from(base), InternedStr::from(quote));
        self.prices.get(&key).map_or(&[], Vec::as_slice)
    }

    /// Iterate over all pairs and their observations.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str, &[PricePoint])> {
        self.prices
            .iter()
            .map(|((base, quote), points)| (base.as_str(), quote.as_str(), points.as_slice()))
    }

    /// The date of the latest observation across all pairs.
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.prices
            .values()
            .filter_map(|points| points.last().map(|p| p.date))
            .max()
    }

    /// The date of the latest observation strictly before `end`, across all
    /// pairs. With no `end` this is [`PriceMap::last_date`].
    #[must_use]
    pub fn last_date_before(&self, end: Option<NaiveDate>) -> Option<NaiveDate> {
        let Some(end) = end else {
            return self.last_date();
        };
        self.prices
            .values()
            .filter_map(|points| {
                let idx = points.partition_point(|p| p.date < end);
                idx.checked_sub(1).map(|i| points[i].date)
            })
            .max()
    }

    /// Get the number of price observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.values().map(Vec::len).sum()
    }

    /// Check if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

fn invert(rate: Decimal) -> Option<Decimal> {
    if rate.is_zero() {
        None
    } else {
        Some(Decimal::ONE / rate)
    }
}
