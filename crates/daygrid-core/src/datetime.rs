use anyhow::{Context, anyhow};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use regex::Regex;

use crate::grid::resolve_month;

/// Resolves a day expression relative to `today`. Accepted forms:
/// today/tomorrow/yesterday, weekday names (next occurrence), +Nd/-Nd,
/// YYYY-MM-DD.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_day_expr(input: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let token = input.trim();
    let lower = token.to_ascii_lowercase();

    match lower.as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    if let Some(target_weekday) = parse_weekday_name(&lower) {
        return Ok(next_weekday_date(today, target_weekday));
    }

    let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)d$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;
    if let Some(caps) = rel_re.captures(token) {
        let sign = caps
            .name("sign")
            .map(|m| m.as_str())
            .ok_or_else(|| anyhow!("missing relative sign"))?;
        let num: i64 = caps
            .name("num")
            .map(|m| m.as_str())
            .ok_or_else(|| anyhow!("missing relative amount"))?
            .parse()
            .context("invalid relative number")?;

        let offset = Duration::days(num);
        return Ok(if sign == "-" {
            today - offset
        } else {
            today + offset
        });
    }

    if let Ok(date) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
        return Ok(date);
    }

    Err(anyhow!("unrecognized date expression: {input}")).context(
        "supported formats: today/tomorrow/yesterday, weekday names (e.g. monday), +Nd/-Nd, YYYY-MM-DD",
    )
}

/// Resolves a month expression to a calendar (year, month). Accepted forms:
/// this/prev/next, YYYY-MM, month names (this year's occurrence, or next
/// year's when it already passed).
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_month_expr(input: &str, today: NaiveDate) -> anyhow::Result<(i32, u32)> {
    let token = input.trim();
    let lower = token.to_ascii_lowercase();

    match lower.as_str() {
        "this" | "current" => return Ok((today.year(), today.month())),
        "next" => return Ok(resolve_month(today.year(), today.month() as i32)),
        "prev" | "previous" | "last" => {
            return Ok(resolve_month(today.year(), today.month() as i32 - 2));
        }
        _ => {}
    }

    if let Some(target_month) = parse_month_name(&lower) {
        let year = if target_month >= today.month() {
            today.year()
        } else {
            today.year() + 1
        };
        return Ok((year, target_month));
    }

    if let Some((raw_year, raw_month)) = token.split_once('-') {
        let year: i32 = raw_year.parse().context("invalid year in YYYY-MM")?;
        let month: u32 = raw_month.parse().context("invalid month in YYYY-MM")?;
        if !(1..=12).contains(&month) {
            return Err(anyhow!("month must be 01-12: {input}"));
        }
        return Ok((year, month));
    }

    Err(anyhow!("unrecognized month expression: {input}")).context(
        "supported formats: this/prev/next, month names (e.g. march), YYYY-MM",
    )
}

fn parse_weekday_name(token: &str) -> Option<Weekday> {
    match token.trim() {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thur" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

fn next_weekday_date(from: NaiveDate, target: Weekday) -> NaiveDate {
    let from_idx = i64::from(from.weekday().num_days_from_monday());
    let target_idx = i64::from(target.num_days_from_monday());
    let mut delta = (7 + target_idx - from_idx) % 7;
    if delta == 0 {
        delta = 7;
    }
    from.checked_add_signed(Duration::days(delta)).unwrap_or(from)
}

fn parse_month_name(token: &str) -> Option<u32> {
    match token.trim() {
        "january" | "jan" => Some(1),
        "february" | "feb" => Some(2),
        "march" | "mar" => Some(3),
        "april" | "apr" => Some(4),
        "may" => Some(5),
        "june" | "jun" => Some(6),
        "july" | "jul" => Some(7),
        "august" | "aug" => Some(8),
        "september" | "sep" | "sept" => Some(9),
        "october" | "oct" => Some(10),
        "november" | "nov" => Some(11),
        "december" | "dec" => Some(12),
        _ => None,
    }
}
