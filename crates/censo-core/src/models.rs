use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::normalize;

/// Which worksheet block a census row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    /// The main occupancy table at the top of a sheet.
    Hospitalized,
    /// The `ALTAS` sub-block.
    Discharged,
    /// The `TRASLADOS` sub-block.
    Transferred,
}

/// Final state of a hospitalization event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Still admitted at the end of the observed data.
    Hospitalizado,
    /// Discharged (explicitly or inferred from a coverage gap).
    Alta,
    /// Transferred to another facility or service.
    Traslado,
    /// Could not be determined.
    Desconocido,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventStatus::Hospitalizado => "Hospitalizado",
            EventStatus::Alta => "Alta",
            EventStatus::Traslado => "Traslado",
            EventStatus::Desconocido => "Desconocido",
        };
        f.write_str(s)
    }
}

/// One observation of one patient on one date, parsed from a worksheet row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Calendar date of the worksheet the row came from.
    pub date: NaiveDate,
    /// Cleaned national identifier (digits plus optional trailing `K`,
    /// leading zeros stripped). May be empty.
    #[serde(default)]
    pub rut: String,
    /// Patient name with its original casing, for display.
    pub name: String,
    /// Age in years, when the sheet carries an `EDAD` column.
    #[serde(default)]
    pub age: Option<u32>,
    /// Free-text diagnosis, possibly empty.
    #[serde(default)]
    pub diagnosis: String,
    /// Normalized bed-type token (`MEDIA`, `UTI`, `CMA`, `INDEFINIDO`, …).
    #[serde(default)]
    pub bed_type: String,
    /// Critical-care flag for that day.
    #[serde(default)]
    pub is_upc: bool,
    /// Which block of the worksheet the row was found in.
    pub status: SnapshotStatus,
    /// Provenance: the workbook file the row came from.
    #[serde(default)]
    pub source_file: String,
}

impl Snapshot {
    /// Accent-stripped, uppercased form of the name used for identity
    /// matching (A–Z and single spaces only).
    pub fn normalized_name(&self) -> String {
        normalize::normalize_name(&self.name)
    }
}

/// One continuous hospitalization of one patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Grouping identity: the RUT when known, else `NAME-<normalized name>`.
    pub key: String,
    /// RUT, possibly back-filled during identity resolution. May be empty.
    #[serde(default)]
    pub rut: String,
    /// Display name (first observed casing).
    pub name: String,
    /// Latest observed age.
    #[serde(default)]
    pub age: Option<u32>,
    /// First date the patient was observed in this event (inclusive).
    pub first_seen: NaiveDate,
    /// Last date the patient was observed in this event (inclusive).
    pub last_seen: NaiveDate,
    /// Day the patient left by discharge (exclusive: not a bed day).
    #[serde(default)]
    pub discharge_date: Option<NaiveDate>,
    /// Day the patient left by transfer (exclusive: not a bed day).
    #[serde(default)]
    pub transfer_date: Option<NaiveDate>,
    /// Final state of the event.
    pub status: EventStatus,
    /// Critical-care flag as of the most recent observation.
    #[serde(default)]
    pub is_upc: bool,
    /// Latched true if the patient was ever observed in critical care.
    #[serde(default)]
    pub was_ever_upc: bool,
    /// Longest diagnosis string observed across the event.
    #[serde(default)]
    pub diagnosis: String,
    /// Most recently observed bed type.
    #[serde(default)]
    pub bed_type: String,
    /// Ordered set of dates the patient was observed on (unique).
    #[serde(default)]
    pub history: Vec<NaiveDate>,
    /// Total length of stay in bed-days (exit day excluded).
    #[serde(default)]
    pub los: i64,
    /// Bed-days counted within a reporting window. Written by the Reporter
    /// on its private copies only.
    #[serde(default)]
    pub days_in_period: i64,
    /// Clerical repairs and anomalies noted during reconciliation.
    #[serde(default)]
    pub inconsistencies: Vec<String>,
}

impl Event {
    /// The exit day, when the event has one: discharge takes precedence
    /// over transfer.
    pub fn exit_date(&self) -> Option<NaiveDate> {
        self.discharge_date.or(self.transfer_date)
    }

    /// The day used for length-of-stay arithmetic: the exit day when
    /// closed, otherwise the last observed day.
    pub fn end_date(&self) -> NaiveDate {
        self.exit_date().unwrap_or(self.last_seen)
    }

    /// Whether the patient is still admitted at the end of the data.
    pub fn is_open(&self) -> bool {
        self.status == EventStatus::Hospitalizado
    }

    /// Length of stay implied by the current first-seen/exit pair,
    /// floored at one bed-day.
    pub fn computed_los(&self) -> i64 {
        let days = (self.end_date() - self.first_seen).num_days();
        days.max(1)
    }
}

/// Movement and occupancy counters for a single calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    /// Patients occupying a bed that day (discharge day excluded).
    pub total_occupancy: u32,
    /// Occupancy restricted to patients currently flagged UPC.
    pub upc_occupancy: u32,
    /// Occupancy of non-UPC patients.
    pub non_upc_occupancy: u32,
    /// Events whose first observed day is this day.
    pub admissions: u32,
    /// Discharges whose exit day is this day.
    pub discharges: u32,
    /// Transfers whose exit day is this day.
    pub transfers: u32,
}

impl DailyStats {
    /// True when the day carries no occupancy and no movement that the
    /// exported series cares about.
    pub fn is_empty(&self) -> bool {
        self.total_occupancy == 0 && self.admissions == 0 && self.discharges == 0
    }
}

/// Per-period report over a `[start, end]` window (both inclusive).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Private copies of the events overlapping the window. Their
    /// `days_in_period` reflects this report's window.
    pub patients: Vec<Event>,
    /// Dense per-day series, trailing empty days trimmed.
    pub daily: BTreeMap<NaiveDate, DailyStats>,
    /// Events admitted inside the window.
    pub total_admissions: u32,
    /// Sum of daily discharge counts (transfers excluded).
    pub total_discharges: u32,
    /// Unique identities that ever passed through critical care.
    pub total_upc_patients: u32,
    /// Mean length of stay of events ending inside the window, one decimal.
    pub avg_los: f64,
    /// Occupancy-rate placeholder. Always zero: no bed-capacity input.
    pub occupancy_rate: f64,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
