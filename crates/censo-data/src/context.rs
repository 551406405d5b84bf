//! Per-workbook date-context resolution.
//!
//! A workbook's filename and its tab names together vote on which year and
//! month its bare date strings belong to. The winning
//! [`WorkbookContext`] then drives sheet-date parsing.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

use censo_core::dates::{
    month_from_name, parse_flexible_date, serial_to_date, year_in_text, WorkbookContext,
};

use crate::workbook::{Cell, Workbook};

/// Year and month hints taken from a single sheet name.
///
/// A name with three numeric groups (`4-11-25`) carries both; the year is
/// the third group (`< 100` means `+ 2000`), the month the second when it
/// is a real month number.
fn sheet_hints(name: &str) -> (Option<i32>, Option<u32>) {
    let re = Regex::new(r"(\d{1,2})[\s.\-/]+(\d{1,2})[\s.\-/]+(\d{2,4})").expect("regex is valid");
    let Some(caps) = re.captures(name) else {
        return (None, None);
    };

    let year = caps[3].parse::<i32>().ok().map(|y| if y < 100 { y + 2000 } else { y });
    let month = caps[2].parse::<u32>().ok().filter(|m| (1..=12).contains(m));
    (year, month)
}

/// The most frequent value, ties broken toward the smallest.
fn mode<T: Copy + Ord + std::hash::Hash>(values: &[T]) -> Option<T> {
    let mut counts: HashMap<T, usize> = HashMap::new();
    for v in values {
        *counts.entry(*v).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(v, _)| v)
}

/// Resolve the workbook context with an explicit fallback year.
pub fn resolve_context_with_default(
    filename: &str,
    workbook: &Workbook,
    default_year: i32,
) -> WorkbookContext {
    let filename_month = month_from_name(filename);
    let filename_year = year_in_text(filename);

    let mut sheet_years: Vec<i32> = Vec::new();
    let mut sheet_months: Vec<u32> = Vec::new();
    for sheet in &workbook.sheets {
        let (year, month) = sheet_hints(&sheet.name);
        if let Some(y) = year {
            sheet_years.push(y);
        }
        if let Some(m) = month {
            sheet_months.push(m);
        }
    }

    let year = mode(&sheet_years)
        .or(filename_year)
        .unwrap_or(default_year);
    let month = filename_month.or_else(|| mode(&sheet_months));

    let ctx = WorkbookContext { year, month };
    debug!(
        "Workbook context for {}: year={}, month={:?}",
        filename, ctx.year, ctx.month
    );
    ctx
}

/// Resolve the workbook context, falling back to the current year when
/// neither the sheets nor the filename carry one.
pub fn resolve_context(filename: &str, workbook: &Workbook) -> WorkbookContext {
    resolve_context_with_default(filename, workbook, chrono::Local::now().year())
}

/// Parse a sheet tab name into its calendar date.
pub fn sheet_date(name: &str, ctx: &WorkbookContext) -> Option<NaiveDate> {
    parse_flexible_date(name, ctx)
}

/// Parse any cell kind into a calendar date: serial numbers, native date
/// cells, or context-disambiguated text.
pub fn cell_date(cell: &Cell, ctx: &WorkbookContext) -> Option<NaiveDate> {
    match cell {
        Cell::Number(n) => serial_to_date(*n),
        Cell::Date(d) => Some(*d),
        Cell::Text(s) => parse_flexible_date(s, ctx),
        Cell::Empty => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
