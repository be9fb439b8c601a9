use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use log::debug;
use regex::Regex;
use std::sync::OnceLock;

use crate::config::*;

/// Serial day of 1970-01-01.
const SERIAL_UNIX_EPOCH: f64 = 25569.0;
/// First serial number past 9999-12-31.
const SERIAL_CEILING: f64 = 2_958_466.0;

/// Layouts accepted by the last-resort parse, tried in order.
///
/// `%y` reads exactly two digits, so the two-digit year layouts come first.
/// A `%Y` match must show its year with four digits (see `has_full_year`).
const FALLBACK_DATE_FORMATS: &[&str] = &[
    "%m/%d/%y",
    "%m-%d-%y",
    "%B %d, %y",
    "%B %d %y",
    "%d %B %y",
    "%Y/%m/%d",
    "%m/%d/%Y",
    // Only reached with a single-digit month or day, padded dates are ISO.
    "%Y-%m-%d",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
];

const FALLBACK_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

// The encodings of a publication date, in the order they are tried.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum DateRule {
    Serial,
    Iso,
    DayMonthYear,
    Fallback,
}

fn iso_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("regex is valid"))
}

fn day_month_year_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([0-9]{2})/([0-9]{2})/([0-9]{4})$").expect("regex is valid")
    })
}

/// Normalizes one source row.
///
/// Rows without a usable publication date are returned as an `Exclusion`.
/// The issue and the disciplines never cause an exclusion: missing values are
/// replaced by `UNDEFINED_ISSUE` and an empty list.
pub fn normalize(raw: &RawRecord, fields: &FieldNames) -> Result<CanonicalRecord, Exclusion> {
    let date_cell = raw.get(&fields.publication_date).unwrap_or(&RawCell::Empty);
    let publication_date = normalize_date(date_cell)?;

    let issue = raw
        .get(&fields.issue)
        .and_then(RawCell::as_text)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| UNDEFINED_ISSUE.to_string());

    let disciplines = match raw.get(&fields.disciplines).and_then(RawCell::as_text) {
        Some(s) => split_disciplines(&s, &fields.discipline_delimiter),
        None => vec![],
    };

    Ok(CanonicalRecord {
        issue,
        publication_date,
        disciplines,
    })
}

/// Converts a date cell to a calendar date.
///
/// The first rule whose pattern matches decides: a matching pattern with
/// out-of-range numbers excludes the row instead of falling through.
pub fn normalize_date(cell: &RawCell) -> Result<NaiveDate, Exclusion> {
    let (rule, date) = match cell {
        RawCell::Empty => return Err(Exclusion::MissingDate),
        RawCell::Number(serial) => (DateRule::Serial, from_serial(*serial)),
        RawCell::Text(s) if s.trim().is_empty() => return Err(Exclusion::MissingDate),
        RawCell::Text(s) => parse_date_text(s.trim()),
    };
    debug!("normalize_date: cell: {:?} rule: {:?} date: {:?}", cell, rule, date);
    match date {
        Some(d) if (0..=9999).contains(&d.year()) => Ok(d),
        _ => Err(Exclusion::UnparsableDate {
            value: match cell {
                RawCell::Number(n) => n.to_string(),
                RawCell::Text(s) => s.clone(),
                RawCell::Empty => String::new(),
            },
        }),
    }
}

fn parse_date_text(s: &str) -> (DateRule, Option<NaiveDate>) {
    // Numbers stored as text are still serial dates when they are in range.
    if let Ok(serial) = s.parse::<f64>() {
        if is_serial_date(serial) {
            return (DateRule::Serial, from_serial(serial));
        }
    }
    if iso_pattern().is_match(s) {
        return (DateRule::Iso, NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
    }
    if let Some(caps) = day_month_year_pattern().captures(s) {
        let day = caps[1].parse::<u32>().ok();
        let month = caps[2].parse::<u32>().ok();
        let year = caps[3].parse::<i32>().ok();
        let date = match (year, month, day) {
            (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d),
            _ => None,
        };
        return (DateRule::DayMonthYear, date);
    }
    (DateRule::Fallback, parse_date_fallback(s))
}

fn is_serial_date(serial: f64) -> bool {
    serial > 0.0 && serial < SERIAL_CEILING
}

/// The calendar day of a spreadsheet serial number. The time of day is dropped.
fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !is_serial_date(serial) {
        return None;
    }
    let days = (serial - SERIAL_UNIX_EPOCH).floor() as i64;
    NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(Duration::days(days))
}

fn parse_date_fallback(s: &str) -> Option<NaiveDate> {
    // Timestamps with an offset count in UTC.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    for fmt in FALLBACK_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            if has_full_year(s, fmt, dt.date()) {
                return Some(dt.date());
            }
        }
    }
    FALLBACK_DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(s, fmt)
            .ok()
            .filter(|d| has_full_year(s, fmt, *d))
    })
}

// chrono's `%Y` also accepts "23" as the year 23.
fn has_full_year(s: &str, fmt: &str, date: NaiveDate) -> bool {
    !fmt.contains("%Y") || s.contains(&format!("{:04}", date.year()))
}

/// Splits a multi-valued field. Pieces are trimmed and empty pieces dropped.
pub fn split_disciplines(s: &str, delimiter: &str) -> Vec<String> {
    let pieces: Vec<&str> = if delimiter.is_empty() {
        vec![s]
    } else {
        s.split(delimiter).collect()
    };
    pieces
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
        .collect()
}
