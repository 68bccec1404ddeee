//! Date resolution for heterogeneous source values.
//!
//! Weighing dates arrive as spreadsheet serial numbers, slash or dash
//! calendar strings, or free-form text. Resolution follows a fixed
//! priority order; the first branch that matches wins, and a value no
//! branch accepts is simply unresolvable (`None`), never an error.
//!
//! Branch order:
//! 1. purely numeric, longer than four characters: spreadsheet serial day
//!    count with the historical 1900 leap-bug offset;
//! 2. calendar patterns, day-first by default: `D/M/YYYY` (then `M/D/YYYY`
//!    when day-first is impossible), `YYYY-M-D`, `D-M-YYYY`;
//! 3. generic fallback formats, accepted only for years after 1990 to
//!    reject misparsed two-digit-year garbage.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::fields::Scalar;

/// Calendar patterns tried in order after the serial branch. Slash dates
/// are day-first; the month-first form only applies when the day-first
/// reading is not a valid date.
const CALENDAR_FORMATS: &[&str] = &["%d/%m/%Y", "%m/%d/%Y", "%Y-%m-%d", "%d-%m-%Y"];

/// Fallback formats for values no calendar pattern accepts.
const FALLBACK_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const FALLBACK_DATE_FORMATS: &[&str] = &["%Y/%m/%d"];

/// Resolves a raw scalar into a calendar date, or `None` when the value
/// carries no usable date.
pub fn resolve_date(value: &Scalar) -> Option<NaiveDate> {
    let text = value.stringify()?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(date) = from_serial(text) {
        return Some(date);
    }

    if let Some(date) = from_calendar_pattern(text) {
        return Some(date);
    }

    from_fallback(text)
}

/// Spreadsheet serial branch. The 1900 date system counts from an epoch
/// that treats 1900 as a leap year, so the serial is shifted by two days
/// relative to 1900-01-01.
fn from_serial(text: &str) -> Option<NaiveDate> {
    if text.len() <= 4 {
        return None;
    }
    let value = text.parse::<f64>().ok()?;
    if !value.is_finite() {
        return None;
    }
    let serial = value.trunc() as i64;
    let epoch = NaiveDate::from_ymd_opt(1900, 1, 1)?;
    epoch.checked_add_signed(Duration::try_days(serial - 2)?)
}

fn from_calendar_pattern(text: &str) -> Option<NaiveDate> {
    CALENDAR_FORMATS
        .iter()
        .filter_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        // Two-digit years would slip through %Y; the patterns are
        // four-digit-year forms only.
        .find(|date| date.year() >= 1000)
}

fn from_fallback(text: &str) -> Option<NaiveDate> {
    let parsed = DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.date_naive())
        .or_else(|| {
            FALLBACK_DATETIME_FORMATS
                .iter()
                .filter_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
                .next()
        })
        .or_else(|| {
            FALLBACK_DATE_FORMATS
                .iter()
                .filter_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .next()
        })?;

    if parsed.year() > 1990 {
        Some(parsed)
    } else {
        None
    }
}
