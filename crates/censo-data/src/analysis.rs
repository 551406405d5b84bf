//! Top-level batch analysis: many workbook files in, events out.
//!
//! A file that fails to read or decode is recorded and skipped; the rest
//! of the batch continues. The result carries timing and count metadata
//! alongside the reconciled events.

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, warn};

use censo_core::models::{Event, Snapshot};

use crate::extractor::parse_workbook;
use crate::reconciler::reconcile;
use crate::workbook::JsonWorkbookReader;

/// Metadata produced alongside a batch analysis.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CensusMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    /// Workbook files successfully processed.
    pub files_processed: usize,
    /// Workbook files that failed to read or decode.
    pub files_failed: usize,
    /// Snapshots extracted across all files.
    pub snapshots_extracted: usize,
    /// Events produced by reconciliation.
    pub events_built: usize,
    /// Wall-clock seconds spent reading and extracting.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent reconciling.
    pub reconcile_time_seconds: f64,
}

/// A per-file failure kept for caller-visible diagnostics.
#[derive(Debug, Clone)]
pub struct FileFailure {
    pub file: String,
    pub error: String,
}

/// The complete output of [`analyze_census_files`].
#[derive(Debug, Clone)]
pub struct CensusAnalysis {
    /// Reconciled hospitalization events, sorted by first-seen date.
    pub events: Vec<Event>,
    /// Snapshot count before reconciliation.
    pub snapshots_count: usize,
    /// Files that could not be processed.
    pub failures: Vec<FileFailure>,
    /// Metadata about this run.
    pub metadata: CensusMetadata,
}

/// Find workbook files (decoded `.json` form) under `path`, sorted by
/// path. A direct file path is returned as-is.
pub fn find_workbook_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    if !path.exists() {
        warn!("Data path does not exist: {}", path.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "json")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Read and extract one workbook file.
///
/// Both read and decode failures come back as a [`FileFailure`] so batch
/// callers can keep going.
pub fn extract_file(path: &Path) -> std::result::Result<Vec<Snapshot>, FileFailure> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = std::fs::read(path).map_err(|e| {
        warn!("Failed to read {}: {}", path.display(), e);
        FileFailure {
            file: filename.clone(),
            error: e.to_string(),
        }
    })?;

    match parse_workbook::<JsonWorkbookReader>(&bytes, &filename) {
        Ok(snaps) => {
            debug!("{}: {} snapshots", filename, snaps.len());
            Ok(snaps)
        }
        Err(e) => {
            warn!("{}", e);
            Err(FileFailure {
                file: filename,
                error: e.to_string(),
            })
        }
    }
}

/// Reconcile an extracted batch and assemble the analysis result.
pub fn finish_analysis(
    snapshots: Vec<Snapshot>,
    failures: Vec<FileFailure>,
    files_total: usize,
    load_time_seconds: f64,
) -> CensusAnalysis {
    let snapshots_count = snapshots.len();

    let reconcile_start = std::time::Instant::now();
    let events = reconcile(snapshots);
    let reconcile_time = reconcile_start.elapsed().as_secs_f64();

    let metadata = CensusMetadata {
        generated_at: Local::now().to_rfc3339(),
        files_processed: files_total - failures.len(),
        files_failed: failures.len(),
        snapshots_extracted: snapshots_count,
        events_built: events.len(),
        load_time_seconds,
        reconcile_time_seconds: reconcile_time,
    };

    CensusAnalysis {
        events,
        snapshots_count,
        failures,
        metadata,
    }
}

/// Run the full pipeline over a batch of workbook files.
///
/// 1. Read and extract each file (failures recorded, batch continues).
/// 2. Reconcile the concatenated snapshot stream into events.
/// 3. Return events plus metadata.
pub fn analyze_census_files(files: &[PathBuf]) -> CensusAnalysis {
    let load_start = std::time::Instant::now();

    let mut snapshots = Vec::new();
    let mut failures = Vec::new();
    for path in files {
        match extract_file(path) {
            Ok(snaps) => snapshots.extend(snaps),
            Err(failure) => failures.push(failure),
        }
    }
    let load_time = load_start.elapsed().as_secs_f64();

    finish_analysis(snapshots, failures, files.len(), load_time)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
