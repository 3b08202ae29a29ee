// Parsing and arithmetic helpers shared by the loaders and the reports.
//
// Money stays in integer minor units everywhere; only `format_money` divides
// by 100, and only for display.
use crate::types::Minor;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use num_format::{Locale, ToFormattedString};

pub const DAY_MS: i64 = 86_400_000;

/// Parse an integer amount of minor units. Tolerates spaces and thousands
/// separators, rejects anything with letters or a fractional part.
pub fn parse_minor_safe(s: Option<&str>) -> Option<Minor> {
    let s = s?.trim();
    if s.is_empty() || s.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    let cleaned: String = s.chars().filter(|c| !matches!(c, ',' | ' ' | '_')).collect();
    cleaned.parse::<Minor>().ok()
}

/// Dates arrive either as plain `YYYY-MM-DD` or as RFC 3339 timestamps.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|d| d.date_naive()))
}

pub fn parse_datetime_safe(s: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = s?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(d) = DateTime::parse_from_rfc3339(raw) {
        return Some(d.with_timezone(&Utc));
    }
    parse_date_safe(Some(raw)).map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// Whole days between two instants, rounded up; never negative.
pub fn elapsed_days(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    let ms = (later - earlier).num_milliseconds();
    // ceil(ms / DAY_MS) for any sign of ms
    let days = -((-ms).div_euclid(DAY_MS));
    days.max(0)
}

pub fn month_key(d: NaiveDate) -> String {
    format!("{:04}-{:02}", d.year(), d.month())
}

pub fn average(v: &[f64]) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// `part / whole * 100`, 0 when `whole` is 0.
pub fn percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let p = part / whole * 100.0;
    if p.is_finite() {
        p
    } else {
        0.0
    }
}

pub fn round_to(n: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (n * factor).round() / factor
}

/// Integer average rounded to the nearest whole number, 0 for an empty bucket.
pub fn rounded_average(total: i64, count: usize) -> i64 {
    if count == 0 {
        return 0;
    }
    (total as f64 / count as f64).round() as i64
}

/// Population standard deviation over mean, in percent. 0 when the mean is 0
/// or there are fewer than two samples.
pub fn coefficient_of_variation(v: &[f64]) -> f64 {
    if v.len() < 2 {
        return 0.0;
    }
    let mean = average(v);
    if mean == 0.0 {
        return 0.0;
    }
    let variance = v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / v.len() as f64;
    let cv = variance.sqrt() / mean.abs() * 100.0;
    if cv.is_finite() {
        cv
    } else {
        0.0
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_val: i64 = parts.next().unwrap_or("0").parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = parts.next() {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Render minor units as major units with two decimals, e.g. `1,500.00`.
pub fn format_money(amount: Minor) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!(
        "{}{}.{:02}",
        sign,
        (abs / 100).to_formatted_string(&Locale::en),
        abs % 100
    )
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
