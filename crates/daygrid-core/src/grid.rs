use anyhow::anyhow;
use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::appointment::DateKey;

/// One rendered month: every cell date in display order plus the drop-target
/// keys for the in-month days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthGrid {
    pub year: i32,
    /// Calendar month, 1-12, after overflow normalization.
    pub month: u32,
    /// Leading filler, the whole month, trailing filler. Always a multiple
    /// of 7 in length.
    pub days: Vec<NaiveDate>,
    /// DateKeys of exactly the in-month days, ascending. Filler days are
    /// never drop targets.
    pub drop_list_ids: Vec<DateKey>,
}

impl MonthGrid {
    pub fn is_in_month(&self, day: NaiveDate) -> bool {
        day.year() == self.year && day.month() == self.month
    }

    pub fn first_of_month(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

/// Normalizes a zero-based month offset from January of `year` into a
/// calendar (year, month). Out-of-range values roll into adjacent years, so
/// `resolve_month(2024, 12)` is January 2025 and `resolve_month(2024, -1)`
/// is December 2023.
pub fn resolve_month(year: i32, month0: i32) -> (i32, u32) {
    let total = i64::from(year) * 12 + i64::from(month0);
    let year = total.div_euclid(12);
    let month0 = total.rem_euclid(12);
    (year as i32, month0 as u32 + 1)
}

/// Builds the grid for the given month. `month0` is zero-based and may lie
/// outside 0..=11. Pure: no clock access, no side effects.
#[tracing::instrument]
pub fn month_grid(year: i32, month0: i32) -> anyhow::Result<MonthGrid> {
    let (year, month) = resolve_month(year, month0);
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| anyhow!("month out of range: {year}-{month:02}"))?;
    let last = last_day_of_month(year, month)?;

    // Sunday-first layout: the leading filler count is the weekday index of
    // day 1, the trailing count pads the last row out to Saturday. The two
    // always sum with the month length to a multiple of 7.
    let leading = i64::from(first.weekday().num_days_from_sunday());
    let trailing = 6 - i64::from(last.weekday().num_days_from_sunday());

    let start = first - Duration::days(leading);
    let end = last + Duration::days(trailing);

    let mut days = Vec::new();
    let mut drop_list_ids = Vec::new();
    let mut day = start;
    while day <= end {
        days.push(day);
        if day >= first && day <= last {
            drop_list_ids.push(DateKey::from(day));
        }
        day += Duration::days(1);
    }

    Ok(MonthGrid {
        year,
        month,
        days,
        drop_list_ids,
    })
}

/// Short weekday labels, Sunday-first.
pub fn weekday_labels() -> [String; 7] {
    let mut weekday = Weekday::Sun;
    std::array::from_fn(|_| {
        let label = weekday.to_string();
        weekday = weekday.succ();
        label
    })
}

fn last_day_of_month(year: i32, month: u32) -> anyhow::Result<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .map(|first_of_next| first_of_next - Duration::days(1))
        .ok_or_else(|| anyhow!("month out of range: {year}-{month:02}"))
}
