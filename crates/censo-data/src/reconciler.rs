//! Timeline reconciliation: snapshots → hospitalization events.
//!
//! Snapshots from any number of workbooks are grouped by patient identity,
//! consolidated per day, and segmented into continuous hospitalization
//! events. A missing day between observations is tolerated (sheets skip
//! weekends); a longer gap closes the event with an implicit discharge.
//! Clerical errors are repaired, never fatal: this stage only annotates.

use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use censo_core::models::{Event, EventStatus, Snapshot, SnapshotStatus};
use censo_core::normalize::is_plausible_rut;

/// A one-day hole in the observations is continuous (Friday → Monday with
/// an unscanned weekend sheet); anything wider splits the event.
const MAX_CONTINUOUS_GAP_DAYS: i64 = 1;

/// Reconcile a flat snapshot stream into hospitalization events.
///
/// Never fails; inconsistencies found along the way are recorded on the
/// affected events. Deterministic: the input is stable-sorted by date, so
/// equal inputs produce identical outputs.
pub fn reconcile(mut snapshots: Vec<Snapshot>) -> Vec<Event> {
    if snapshots.is_empty() {
        return Vec::new();
    }
    snapshots.sort_by_key(|s| s.date);

    let Some(global_max) = snapshots.iter().map(|s| s.date).max() else {
        return Vec::new();
    };

    // First pass: learn which normalized name belongs to which RUT, so
    // rows that dropped the identifier can still join their patient.
    let name_to_rut = build_name_rut_map(&snapshots);

    // Second pass: partition by identity, back-filling RUTs as we go.
    let mut groups: BTreeMap<String, Vec<Snapshot>> = BTreeMap::new();
    for mut snap in snapshots {
        let key = grouping_key(&mut snap, &name_to_rut);
        groups.entry(key).or_default().push(snap);
    }

    let mut events = Vec::new();
    for (key, snaps) in groups {
        let consolidated = consolidate_same_day(snaps);
        events.extend(segment_group(&key, consolidated, global_max));
    }

    events.sort_by(|a, b| (a.first_seen, &a.key).cmp(&(b.first_seen, &b.key)));
    debug!("Reconciled {} events", events.len());
    events
}

// ── Identity resolution ───────────────────────────────────────────────────────

/// Map every normalized name to the first plausible RUT seen with it.
fn build_name_rut_map(snapshots: &[Snapshot]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for snap in snapshots {
        if is_plausible_rut(&snap.rut) {
            let norm = snap.normalized_name();
            if !norm.is_empty() {
                map.entry(norm).or_insert_with(|| snap.rut.clone());
            }
        }
    }
    map
}

/// The grouping key for one snapshot: its own RUT, a RUT adopted via the
/// name map (back-filled onto the snapshot), or a synthetic name key.
fn grouping_key(snap: &mut Snapshot, name_to_rut: &HashMap<String, String>) -> String {
    if !snap.rut.is_empty() {
        return snap.rut.clone();
    }
    let norm = snap.normalized_name();
    if let Some(rut) = name_to_rut.get(&norm) {
        snap.rut = rut.clone();
        return rut.clone();
    }
    format!("NAME-{}", norm)
}

// ── Same-day consolidation ────────────────────────────────────────────────────

/// Merge same-date snapshots of one patient into a single observation.
///
/// A bed change shows up as two rows on one sheet: the critical-care flag
/// latches, a non-Hospitalized status beats Hospitalized, the longest
/// diagnosis wins, and the later row's bed type stands.
fn consolidate_same_day(snaps: Vec<Snapshot>) -> Vec<Snapshot> {
    let mut out: Vec<Snapshot> = Vec::with_capacity(snaps.len());
    for snap in snaps {
        match out.last_mut() {
            Some(prev) if prev.date == snap.date => {
                prev.is_upc |= snap.is_upc;
                if prev.status == SnapshotStatus::Hospitalized
                    && snap.status != SnapshotStatus::Hospitalized
                {
                    prev.status = snap.status;
                }
                if snap.diagnosis.len() > prev.diagnosis.len() {
                    prev.diagnosis = snap.diagnosis.clone();
                }
                prev.bed_type = snap.bed_type;
                if snap.age.is_some() {
                    prev.age = snap.age;
                }
            }
            _ => out.push(snap),
        }
    }
    out
}

// ── Event segmentation ────────────────────────────────────────────────────────

/// Open a new event anchored at `snap`. A snapshot that is itself a
/// discharge or transfer produces an already-closed one-day event.
fn open_event(key: &str, snap: &Snapshot) -> Event {
    let mut ev = Event {
        key: key.to_string(),
        rut: snap.rut.clone(),
        name: snap.name.clone(),
        age: snap.age,
        first_seen: snap.date,
        last_seen: snap.date,
        discharge_date: None,
        transfer_date: None,
        status: EventStatus::Hospitalizado,
        is_upc: snap.is_upc,
        was_ever_upc: snap.is_upc,
        diagnosis: snap.diagnosis.clone(),
        bed_type: snap.bed_type.clone(),
        history: vec![snap.date],
        los: 0,
        days_in_period: 0,
        inconsistencies: Vec::new(),
    };
    match snap.status {
        SnapshotStatus::Discharged => {
            ev.discharge_date = Some(snap.date);
            ev.status = EventStatus::Alta;
        }
        SnapshotStatus::Transferred => {
            ev.transfer_date = Some(snap.date);
            ev.status = EventStatus::Traslado;
        }
        SnapshotStatus::Hospitalized => {}
    }
    ev
}

/// Fold a continuation snapshot into the open event.
fn apply_continuation(ev: &mut Event, snap: &Snapshot) {
    if !ev.is_open() {
        // The patient is back on a census sheet after an explicit exit
        // inside the continuity window: the exit was a clerical error.
        ev.discharge_date = None;
        ev.transfer_date = None;
        ev.status = EventStatus::Hospitalizado;
        ev.inconsistencies
            .push("Alta explícita revertida por ocupación posterior".to_string());
    }

    ev.last_seen = snap.date;
    if ev.history.last() != Some(&snap.date) {
        ev.history.push(snap.date);
    }
    ev.bed_type = snap.bed_type.clone();
    ev.is_upc = snap.is_upc;
    ev.was_ever_upc |= snap.is_upc;
    if snap.diagnosis.len() > ev.diagnosis.len() {
        ev.diagnosis = snap.diagnosis.clone();
    }
    if snap.age.is_some() {
        ev.age = snap.age;
    }

    match snap.status {
        SnapshotStatus::Discharged => {
            ev.discharge_date = Some(snap.date);
            ev.status = EventStatus::Alta;
        }
        SnapshotStatus::Transferred => {
            ev.transfer_date = Some(snap.date);
            ev.status = EventStatus::Traslado;
        }
        SnapshotStatus::Hospitalized => {}
    }
}

/// Close an event with a discharge inferred from missing coverage: the
/// patient is assumed out the day after the last observation.
fn close_implicit(ev: &mut Event) {
    ev.discharge_date = Some(ev.last_seen + Duration::days(1));
    ev.status = EventStatus::Alta;
}

/// Segment one patient's consolidated snapshots into events.
fn segment_group(key: &str, snaps: Vec<Snapshot>, global_max: NaiveDate) -> Vec<Event> {
    let mut events: Vec<Event> = Vec::new();
    let mut current: Option<Event> = None;

    for snap in &snaps {
        let Some(ev) = current.as_mut() else {
            current = Some(open_event(key, snap));
            continue;
        };

        let gap_days = (snap.date - ev.last_seen).num_days() - 1;
        if gap_days > MAX_CONTINUOUS_GAP_DAYS {
            if ev.is_open() {
                close_implicit(ev);
            }
            let mut next = open_event(key, snap);
            next.inconsistencies.push(format!(
                "Misma identidad reaparece tras {} días sin registro",
                gap_days
            ));
            events.push(std::mem::replace(ev, next));
        } else {
            apply_continuation(ev, snap);
        }
    }

    if let Some(mut ev) = current.take() {
        // Patients still listed on the newest sheet remain admitted; an
        // event that stopped short of the end of the data gets the
        // implicit discharge instead.
        if ev.is_open() && ev.last_seen < global_max {
            close_implicit(&mut ev);
        }
        events.push(ev);
    }

    for ev in &mut events {
        ev.los = ev.computed_los();
    }
    events
}

// ── Tests ─────────────────────────────────────────────────────────────────────
