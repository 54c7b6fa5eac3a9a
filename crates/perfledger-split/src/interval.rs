//! Reporting intervals.
//!
//! An interval is identified by its last day: weeks end on Sunday, months,
//! quarters and years on their last calendar day. A date belongs to the
//! interval whose end is the first end on or after it.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::SplitError;

/// Granularity of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    /// Every transaction is its own period.
    Transaction,
    /// Calendar days.
    Day,
    /// Weeks ending on Sunday.
    Week,
    /// Calendar months.
    Month,
    /// Calendar quarters.
    Quarter,
    /// Calendar years.
    Year,
}

impl Interval {
    /// Last day of the interval containing `date`.
    ///
    /// Returns `None` for [`Interval::Transaction`], which has no calendar
    /// boundaries.
    #[must_use]
    pub fn end_of(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Transaction => None,
            Self::Day => Some(date),
            Self::Week => {
                let remaining = 6 - date.weekday().num_days_from_monday();
                date.checked_add_days(Days::new(u64::from(remaining)))
            }
            Self::Month => last_day_of_month(date.year(), date.month()),
            Self::Quarter => {
                let last_month = (date.month0() / 3) * 3 + 3;
                last_day_of_month(date.year(), last_month)
            }
            Self::Year => NaiveDate::from_ymd_opt(date.year(), 12, 31),
        }
    }

    /// Ordered interval end dates covering `first..=last`.
    ///
    /// The first element is the end of the interval containing `first`, the
    /// last element is the end of the interval containing `last`.
    #[must_use]
    pub fn boundaries(self, first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
        let mut ends = Vec::new();
        let Some(mut end) = self.end_of(first) else {
            return ends;
        };
        ends.push(end);
        while end < last {
            match end.succ_opt().and_then(|next| self.end_of(next)) {
                Some(next) => {
                    end = next;
                    ends.push(end);
                }
                None => break,
            }
        }
        ends
    }

    /// The string id of this interval.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|d| d.pred_opt())
}

impl FromStr for Interval {
    type Err = SplitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "transaction" => Ok(Self::Transaction),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            _ => Err(SplitError::UnknownInterval(s.to_string())),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_end_of() {
        // 2020-01-01 is a Wednesday.
        let d = date(2020, 1, 1);
        assert_eq!(Interval::Transaction.end_of(d), None);
        assert_eq!(Interval::Day.end_of(d), Some(d));
        assert_eq!(Interval::Week.end_of(d), Some(date(2020, 1, 5)));
        assert_eq!(Interval::Week.end_of(date(2020, 1, 5)), Some(date(2020, 1, 5)));
        assert_eq!(Interval::Month.end_of(date(2020, 2, 10)), Some(date(2020, 2, 29)));
        assert_eq!(Interval::Month.end_of(date(2020, 12, 10)), Some(date(2020, 12, 31)));
        assert_eq!(Interval::Quarter.end_of(date(2020, 5, 1)), Some(date(2020, 6, 30)));
        assert_eq!(Interval::Quarter.end_of(date(2020, 11, 1)), Some(date(2020, 12, 31)));
        assert_eq!(Interval::Year.end_of(d), Some(date(2020, 12, 31)));
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(
            Interval::Month.boundaries(date(2020, 1, 15), date(2020, 3, 1)),
            vec![date(2020, 1, 31), date(2020, 2, 29), date(2020, 3, 31)]
        );
        assert_eq!(
            Interval::Year.boundaries(date(2020, 1, 15), date(2020, 3, 1)),
            vec![date(2020, 12, 31)]
        );
        assert_eq!(
            Interval::Day.boundaries(date(2020, 1, 1), date(2020, 1, 3)).len(),
            3
        );
        assert!(Interval::Transaction
            .boundaries(date(2020, 1, 1), date(2020, 2, 1))
            .is_empty());
    }

    #[test]
    fn test_parse() {
        assert_eq!("month".parse::<Interval>().unwrap(), Interval::Month);
        assert_eq!("Quarter".parse::<Interval>().unwrap(), Interval::Quarter);
        assert!(matches!(
            "fortnight".parse::<Interval>(),
            Err(SplitError::UnknownInterval(_))
        ));
        assert_eq!(Interval::Week.to_string(), "week");
    }
}
