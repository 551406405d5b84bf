//! Snapshot extraction from decoded census worksheets.
//!
//! Each sheet is one calendar day: a Hospitalized table at the top,
//! optionally followed by `ALTAS` and `TRASLADOS` sub-blocks. Headers are
//! noisy, rows repeat, and blocked-bed placeholders masquerade as patients,
//! so every row runs a gauntlet of filters before it becomes a
//! [`Snapshot`].

use tracing::{debug, warn};

use censo_core::error::Result;
use censo_core::models::{Snapshot, SnapshotStatus};
use censo_core::normalize::{
    clean_rut, normalize_bed_type, parse_upc_flag, strip_accents,
};

use crate::context::{resolve_context, sheet_date};
use crate::workbook::{Cell, Sheet, Workbook, WorkbookReader};

/// A block-marker row longer than this is a data row, not a marker.
const MARKER_MAX_LEN: usize = 200;

// ── Column map ────────────────────────────────────────────────────────────────

/// Column indices resolved from a header row, one slot per semantic field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub rut: Option<usize>,
    pub name: Option<usize>,
    pub age: Option<usize>,
    pub bed_type: Option<usize>,
    pub upc: Option<usize>,
    pub diag: Option<usize>,
}

impl ColumnMap {
    /// Build a map from a header row by fuzzy substring match. The first
    /// matching cell wins each column.
    pub fn from_header(row: &[Cell]) -> Self {
        let mut map = ColumnMap::default();
        for (idx, cell) in row.iter().enumerate() {
            let label = strip_accents(&cell.text()).to_uppercase();
            if label.is_empty() {
                continue;
            }
            if map.rut.is_none() && label.contains("RUT") {
                map.rut = Some(idx);
            } else if map.name.is_none()
                && (label.contains("PACIENTE") || label.contains("NOMBRE"))
            {
                map.name = Some(idx);
            } else if map.age.is_none() && label.contains("EDAD") {
                map.age = Some(idx);
            } else if map.bed_type.is_none() && label.contains("TIPO") {
                map.bed_type = Some(idx);
            } else if map.upc.is_none() && label.contains("UPC") {
                map.upc = Some(idx);
            } else if map.diag.is_none()
                && (label.contains("PATOLOGIA")
                    || label.contains("DIAGNOSTICO")
                    || label == "DIAG"
                    || label == "DIAG."
                    || label == "DG")
            {
                map.diag = Some(idx);
            }
        }
        map
    }

    fn text_at(&self, row: &[Cell], idx: Option<usize>) -> String {
        idx.and_then(|i| row.get(i)).map(Cell::text).unwrap_or_default()
    }
}

// ── Row classification ────────────────────────────────────────────────────────

/// Join a row's cell texts for marker and header inspection,
/// accent-stripped and uppercased.
fn joined_text(row: &[Cell]) -> String {
    let joined = row
        .iter()
        .map(Cell::text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    strip_accents(&joined).to_uppercase()
}

/// A header row names the identifier column together with a patient or
/// diagnosis column, or a bed column together with a patient column.
fn is_header_row(joined: &str) -> bool {
    let has_name = joined.contains("PACIENTE") || joined.contains("NOMBRE");
    let has_diag = joined.contains("PATOLOGIA") || joined.contains("DIAGNOSTICO");
    (joined.contains("RUT") && (has_name || has_diag)) || (joined.contains("CAMA") && has_name)
}

/// Detect an `ALTAS` / `TRASLADOS` block marker on a short row.
fn block_marker(joined: &str) -> Option<SnapshotStatus> {
    if joined.is_empty() || joined.len() >= MARKER_MAX_LEN {
        return None;
    }
    if joined.contains("ALTAS") && !joined.contains("NO") {
        return Some(SnapshotStatus::Discharged);
    }
    if joined.contains("TRASLAD") || joined.contains("DERIVADO") {
        return Some(SnapshotStatus::Transferred);
    }
    None
}

/// Placeholder rows that describe beds or wards rather than patients.
fn is_blocked_bed(upper_name: &str) -> bool {
    upper_name.starts_with("BLOQUEO")
        || upper_name.contains("AISLAMIENTO")
        || upper_name.contains("SERVICIO DE")
        || upper_name.contains("UNIDAD DE")
        || upper_name == "CAMA"
        || upper_name == "TIPO DE CAMA"
}

/// Parse an age cell: whole numbers or digit strings within human range.
fn parse_age(text: &str) -> Option<u32> {
    let age: u32 = text.trim().parse().ok()?;
    (1..=130).contains(&age).then_some(age)
}

// ── Row decoding ──────────────────────────────────────────────────────────────

/// Decode one data row into a [`Snapshot`], or `None` when any filter
/// rejects it.
fn decode_row(
    row: &[Cell],
    map: &ColumnMap,
    date: chrono::NaiveDate,
    status: SnapshotStatus,
    source_file: &str,
) -> Option<Snapshot> {
    if row.len() <= 2 {
        return None;
    }

    let name_raw = map.text_at(row, map.name);
    let rut_raw = map.text_at(row, map.rut);

    let upper_name = strip_accents(name_raw.trim()).to_uppercase();
    let upper_rut = rut_raw.trim().to_uppercase();

    // Ghost header: a repeated header row inside a block.
    if upper_name == "NOMBRE" || upper_name == "PACIENTE" {
        return None;
    }
    if upper_rut == "RUT" || upper_rut == "RUN" {
        return None;
    }

    if upper_name.is_empty() || is_blocked_bed(&upper_name) {
        return None;
    }

    let rut = clean_rut(&rut_raw);
    let diagnosis = map.text_at(row, map.diag);
    if rut.is_empty() && diagnosis.is_empty() {
        return None;
    }

    Some(Snapshot {
        date,
        rut,
        name: name_raw.trim().to_string(),
        age: parse_age(&map.text_at(row, map.age)),
        diagnosis,
        bed_type: normalize_bed_type(&map.text_at(row, map.bed_type)),
        is_upc: parse_upc_flag(&map.text_at(row, map.upc)),
        status,
        source_file: source_file.to_string(),
    })
}

// ── Sheet and workbook extraction ─────────────────────────────────────────────

/// Walk one sheet's rows, tracking the current block and column map, and
/// emit a snapshot per surviving patient row.
fn extract_sheet(sheet: &Sheet, date: chrono::NaiveDate, source_file: &str) -> Vec<Snapshot> {
    let mut snapshots = Vec::new();
    let mut columns: Option<ColumnMap> = None;
    let mut block = SnapshotStatus::Hospitalized;

    for row in &sheet.rows {
        let joined = joined_text(row);

        let Some(map) = columns.as_ref() else {
            // Still above the first header: only headers and block
            // markers matter here.
            if is_header_row(&joined) {
                columns = Some(ColumnMap::from_header(row));
                block = SnapshotStatus::Hospitalized;
            } else if let Some(marker) = block_marker(&joined) {
                block = marker;
            }
            continue;
        };

        if let Some(marker) = block_marker(&joined) {
            block = marker;
            continue;
        }

        if let Some(snap) = decode_row(row, map, date, block, source_file) {
            snapshots.push(snap);
        }
    }

    debug!(
        "Sheet {} ({}): {} snapshots",
        sheet.name,
        date,
        snapshots.len()
    );
    snapshots
}

/// Extract every snapshot from a decoded workbook.
///
/// Resolves the workbook's date context, dates each sheet from its tab
/// name (sheets with unparseable names are skipped), and processes sheets
/// in ascending date order.
pub fn extract_snapshots(workbook: &Workbook, source_file: &str) -> Vec<Snapshot> {
    let ctx = resolve_context(source_file, workbook);

    let mut dated: Vec<(chrono::NaiveDate, &Sheet)> = Vec::new();
    for sheet in &workbook.sheets {
        match sheet_date(&sheet.name, &ctx) {
            Some(date) => dated.push((date, sheet)),
            None => warn!(
                "Skipping sheet {:?} in {}: no parseable date",
                sheet.name, source_file
            ),
        }
    }
    dated.sort_by_key(|(date, _)| *date);

    let mut snapshots = Vec::new();
    for (date, sheet) in dated {
        snapshots.extend(extract_sheet(sheet, date, source_file));
    }
    snapshots
}

/// Decode workbook bytes with reader `R` and extract its snapshots.
///
/// A reader failure is fatal for this file; an empty snapshot list is not.
pub fn parse_workbook<R: WorkbookReader>(bytes: &[u8], filename: &str) -> Result<Vec<Snapshot>> {
    let workbook = R::read(bytes, filename)?;
    Ok(extract_snapshots(&workbook, filename))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
