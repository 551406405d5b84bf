//! Period report generation over reconciled events.
//!
//! Applies the Chilean bed-day norm: a patient occupies a bed on every day
//! `d` with `first_seen <= d < exit`; the exit day itself is not a bed
//! day. Each report works on private copies of its events, so reports
//! over the same event set are independent.

use chrono::{Datelike, Local, NaiveDate};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use censo_core::dates::{add_months, first_day_of_month, last_day_of_month, month_name_es};
use censo_core::models::{DailyStats, Event, EventStatus, Report};

/// Rolling bound on the monthly view: three years of reports.
pub const DEFAULT_MONTHLY_CAP: usize = 36;

// ── Single-window reports ─────────────────────────────────────────────────────

/// Events overlapping `[start, end]`, deep-copied for per-report mutation.
fn select_events(events: &[Event], start: NaiveDate, end: NaiveDate) -> Vec<Event> {
    events
        .iter()
        .filter(|ev| ev.first_seen <= end && ev.exit_date().map_or(true, |x| x >= start))
        .cloned()
        .collect()
}

/// Build the report for an inclusive window, with an explicit reference
/// day for clipping the daily series (the series never extends past it).
pub fn report_for_period_at(
    events: &[Event],
    title: &str,
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> Option<Report> {
    if start > end {
        return None;
    }
    let mut selected = select_events(events, start, end);
    if selected.is_empty() {
        return None;
    }

    // Dense zeroed series over the window, clipped at the reference day.
    let clipped_end = end.min(today);
    let mut daily: BTreeMap<NaiveDate, DailyStats> = start
        .iter_days()
        .take_while(|d| *d <= clipped_end)
        .map(|d| (d, DailyStats::default()))
        .collect();

    for ev in &mut selected {
        ev.days_in_period = 0;
        let exit = ev.exit_date();

        if let Some(stats) = daily.get_mut(&ev.first_seen) {
            stats.admissions += 1;
        }
        if let Some(x) = exit {
            if let Some(stats) = daily.get_mut(&x) {
                if ev.status == EventStatus::Traslado {
                    stats.transfers += 1;
                } else {
                    stats.discharges += 1;
                }
            }
        }

        for (d, stats) in daily.iter_mut() {
            let occupied = ev.first_seen <= *d && exit.map_or(true, |x| *d < x);
            if occupied {
                stats.total_occupancy += 1;
                if ev.is_upc {
                    stats.upc_occupancy += 1;
                } else {
                    stats.non_upc_occupancy += 1;
                }
                ev.days_in_period += 1;
            }
        }
    }

    // Trailing days with neither occupancy nor movement are noise from
    // clipping wide windows; drop them from the exported series.
    while daily.values().next_back().map_or(false, DailyStats::is_empty) {
        daily.pop_last();
    }

    let total_admissions = selected
        .iter()
        .filter(|ev| ev.first_seen >= start && ev.first_seen <= end)
        .count() as u32;
    let total_discharges = daily.values().map(|s| s.discharges).sum();
    let total_upc_patients = selected
        .iter()
        .filter(|ev| ev.was_ever_upc)
        .map(|ev| ev.key.as_str())
        .collect::<HashSet<_>>()
        .len() as u32;

    let ended_inside: Vec<i64> = selected
        .iter()
        .filter(|ev| ev.exit_date().is_some_and(|x| x >= start && x <= end))
        .map(|ev| ev.los)
        .collect();
    let avg_los = if ended_inside.is_empty() {
        0.0
    } else {
        let mean = ended_inside.iter().sum::<i64>() as f64 / ended_inside.len() as f64;
        (mean * 10.0).round() / 10.0
    };

    debug!(
        "Report {:?}: {} patients, {} days in series",
        title,
        selected.len(),
        daily.len()
    );

    Some(Report {
        title: title.to_string(),
        start,
        end,
        patients: selected,
        daily,
        total_admissions,
        total_discharges,
        total_upc_patients,
        avg_los,
        occupancy_rate: 0.0,
    })
}

/// Build the report for an inclusive window, or `None` when no event
/// overlaps it.
pub fn report_for_period(
    events: &[Event],
    title: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Option<Report> {
    report_for_period_at(events, title, start, end, Local::now().date_naive())
}

// ── Calendar iterators ────────────────────────────────────────────────────────

/// The `(year, month)` span covered by the events, by first-seen and
/// last-seen dates.
fn observed_month_span(events: &[Event]) -> Option<((i32, u32), (i32, u32))> {
    let min = events.iter().map(|e| e.first_seen).min()?;
    let max = events.iter().map(|e| e.last_seen).max()?;
    Some(((min.year(), min.month()), (max.year(), max.month())))
}

/// One report per non-empty calendar month, bounded to the `limit` most
/// recent months.
pub fn monthly_reports_with_limit(events: &[Event], limit: usize) -> Vec<Report> {
    let Some(((mut y, mut m), last)) = observed_month_span(events) else {
        return Vec::new();
    };

    let mut months = Vec::new();
    loop {
        months.push((y, m));
        if (y, m) == last {
            break;
        }
        (y, m) = add_months(y, m, 1);
    }
    if months.len() > limit {
        months.drain(..months.len() - limit);
    }

    months
        .into_iter()
        .filter_map(|(y, m)| {
            let start = first_day_of_month(y, m)?;
            let end = last_day_of_month(y, m)?;
            let title = format!("{} {}", month_name_es(m), y);
            report_for_period(events, &title, start, end)
        })
        .collect()
}

/// One report per non-empty calendar month with the default 36-month cap.
pub fn monthly_reports(events: &[Event]) -> Vec<Report> {
    monthly_reports_with_limit(events, DEFAULT_MONTHLY_CAP)
}

/// Report over one calendar quarter (1–4).
pub fn quarterly_report(events: &[Event], year: i32, quarter: u32) -> Option<Report> {
    if !(1..=4).contains(&quarter) {
        return None;
    }
    let start_month = 3 * (quarter - 1) + 1;
    let start = first_day_of_month(year, start_month)?;
    let (end_y, end_m) = add_months(year, start_month, 2);
    let end = last_day_of_month(end_y, end_m)?;
    let title = format!("Trimestre {} {}", quarter, year);
    report_for_period(events, &title, start, end)
}

/// Report over one calendar year, clamped to the observed data range.
pub fn yearly_report(events: &[Event], year: i32) -> Option<Report> {
    let min = events.iter().map(|e| e.first_seen).min()?;
    let max = events.iter().map(|e| e.last_seen).max()?;

    let start = first_day_of_month(year, 1)?.max(min);
    let end = last_day_of_month(year, 12)?.min(max);
    if start > end {
        return None;
    }
    report_for_period(events, &format!("Año {}", year), start, end)
}

/// Report from the first day of `from` to the last day of `to`, both
/// `(year, month)` pairs.
pub fn range_report(events: &[Event], from: (i32, u32), to: (i32, u32)) -> Option<Report> {
    let start = first_day_of_month(from.0, from.1)?;
    let end = last_day_of_month(to.0, to.1)?;
    if start > end {
        return None;
    }
    let title = format!(
        "Periodo {:04}-{:02} a {:04}-{:02}",
        from.0, from.1, to.0, to.1
    );
    report_for_period(events, &title, start, end)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
