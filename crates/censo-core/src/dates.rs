//! Calendar-date parsing for census workbooks.
//!
//! Worksheet tabs are named things like `01-11`, `1.11` or `Sabado 4-11-25`,
//! sometimes day-month and sometimes month-day, with or without a year. A
//! per-workbook [`WorkbookContext`] (resolved from the filename and the
//! other tab names) disambiguates them. All arithmetic runs on
//! [`NaiveDate`], i.e. integer day numbers; wall-clock time never enters
//! the pipeline.

use chrono::{Duration, NaiveDate};
use regex::Regex;

use crate::normalize::strip_accents;

/// Spanish month names in calendar order, accent-free uppercase.
pub const SPANISH_MONTHS: [&str; 12] = [
    "ENERO",
    "FEBRERO",
    "MARZO",
    "ABRIL",
    "MAYO",
    "JUNIO",
    "JULIO",
    "AGOSTO",
    "SEPTIEMBRE",
    "OCTUBRE",
    "NOVIEMBRE",
    "DICIEMBRE",
];

/// Capitalized Spanish month name for display, 1-based.
pub fn month_name_es(month: u32) -> &'static str {
    match month {
        1 => "Enero",
        2 => "Febrero",
        3 => "Marzo",
        4 => "Abril",
        5 => "Mayo",
        6 => "Junio",
        7 => "Julio",
        8 => "Agosto",
        9 => "Septiembre",
        10 => "Octubre",
        11 => "Noviembre",
        12 => "Diciembre",
        _ => "",
    }
}

/// The `(year, month?)` pair used to disambiguate bare date strings within
/// one workbook. `month` is 1-based when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkbookContext {
    pub year: i32,
    pub month: Option<u32>,
}

/// Find a Spanish month name inside free text. Returns the 1-based month.
pub fn month_from_name(text: &str) -> Option<u32> {
    let upper = strip_accents(text).to_uppercase();
    SPANISH_MONTHS
        .iter()
        .position(|name| upper.contains(name))
        .map(|idx| idx as u32 + 1)
}

/// Find a four-digit year of this century (`20xx`) inside free text.
pub fn year_in_text(text: &str) -> Option<i32> {
    let re = Regex::new(r"20\d\d").expect("regex is valid");
    re.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Convert a spreadsheet serial number to a calendar date.
///
/// Serial day 25569 is the Unix epoch (1970-01-01); fractional parts are
/// time-of-day and are discarded.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let days = (serial - 25569.0).floor();
    // Reject serials far outside any plausible census date.
    if days.abs() > 100_000.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(Duration::days(days as i64))
}

/// Parse a `D-M`, `D-M-Y` (or month-day reversed) string against a
/// workbook context.
///
/// The two leading numeric groups are day and month in some order; when a
/// third group is present it is the year (`< 100` means `+ 2000`). The
/// context month decides the order: whichever group equals it is taken as
/// the month, defaulting to day-month. Dates whose day overflows the month
/// (`30-02`) fail to construct and are rejected rather than rolled over.
pub fn parse_flexible_date(text: &str, ctx: &WorkbookContext) -> Option<NaiveDate> {
    let re = Regex::new(r"(\d{1,2})[\s.\-/]+(\d{1,2})(?:[\s.\-/]+(\d{2,4}))?")
        .expect("regex is valid");
    let caps = re.captures(text)?;

    let p1: u32 = caps[1].parse().ok()?;
    let p2: u32 = caps[2].parse().ok()?;
    let year: i32 = match caps.get(3) {
        Some(m) => {
            let y: i32 = m.as_str().parse().ok()?;
            if y < 100 {
                y + 2000
            } else {
                y
            }
        }
        None => ctx.year,
    };

    let (day, month) = match ctx.month {
        Some(m) if p2 == m => (p1, p2),
        Some(m) if p1 == m => (p2, p1),
        _ => (p1, p2),
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// First calendar day of a month.
pub fn first_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Last calendar day of a month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_y, next_m) = add_months(year, month, 1);
    first_day_of_month(next_y, next_m)?.checked_sub_signed(Duration::days(1))
}

/// Shift a `(year, month)` pair by a number of months (may be negative).
pub fn add_months(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let idx = year * 12 + month as i32 - 1 + delta;
    (idx.div_euclid(12), (idx.rem_euclid(12) + 1) as u32)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
