//! Async bulk-ingestion orchestrator.
//!
//! Processes a batch of workbook files in a dedicated tokio task, sending
//! per-file [`IngestUpdate`] progress through an `mpsc` channel so the
//! caller can render progress without sharing any mutable state. The loop
//! only awaits between files, so aborting the handle cancels at a file
//! boundary and discards at most the in-flight workbook.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use censo_data::analysis::{extract_file, find_workbook_files, finish_analysis, CensusAnalysis};

// ── Public types ──────────────────────────────────────────────────────────────

/// Progress and result messages sent during bulk ingestion.
#[derive(Debug)]
pub enum IngestUpdate {
    /// A workbook is about to be processed (`index` is 1-based).
    FileStarted {
        file: String,
        index: usize,
        total: usize,
    },
    /// A workbook was extracted successfully.
    FileDone { file: String, snapshots: usize },
    /// A workbook failed to read or decode; the batch continues.
    FileFailed { file: String, error: String },
    /// The whole batch finished, reconciliation included.
    Completed(CensusAnalysis),
}

/// Handle to a running ingestion task.
pub struct IngestHandle {
    handle: JoinHandle<()>,
}

impl IngestHandle {
    /// Cancel the ingestion. Takes effect at the next file boundary.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Whether the ingestion task has finished (or was aborted).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

// ── IngestOrchestrator ────────────────────────────────────────────────────────

/// Background ingestion coordinator for one data path.
pub struct IngestOrchestrator {
    /// A workbook file, or a directory scanned recursively for workbooks.
    data_path: PathBuf,
}

impl IngestOrchestrator {
    pub fn new(data_path: PathBuf) -> Self {
        Self { data_path }
    }

    /// Start the ingestion loop in a spawned task.
    ///
    /// Returns the receiving end of the update channel and a handle that
    /// can abort the run.
    pub fn start(self) -> (mpsc::Receiver<IngestUpdate>, IngestHandle) {
        // Modest buffer: a slow consumer should not stall extraction.
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            self.ingest_loop(tx).await;
        });

        (rx, IngestHandle { handle })
    }

    async fn ingest_loop(self, tx: mpsc::Sender<IngestUpdate>) {
        let files = find_workbook_files(&self.data_path);
        let total = files.len();
        info!("Ingesting {} workbook file(s)", total);

        let load_start = std::time::Instant::now();
        let mut snapshots = Vec::new();
        let mut failures = Vec::new();

        for (i, path) in files.iter().enumerate() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());

            if tx
                .send(IngestUpdate::FileStarted {
                    file: name.clone(),
                    index: i + 1,
                    total,
                })
                .await
                .is_err()
            {
                return; // receiver gone, nobody wants the result
            }

            let update = match extract_file(path) {
                Ok(snaps) => {
                    let count = snaps.len();
                    snapshots.extend(snaps);
                    IngestUpdate::FileDone {
                        file: name,
                        snapshots: count,
                    }
                }
                Err(failure) => {
                    let update = IngestUpdate::FileFailed {
                        file: failure.file.clone(),
                        error: failure.error.clone(),
                    };
                    failures.push(failure);
                    update
                }
            };
            if tx.send(update).await.is_err() {
                return;
            }
        }
        let load_time = load_start.elapsed().as_secs_f64();

        let analysis = finish_analysis(snapshots, failures, total, load_time);
        let _ = tx.send(IngestUpdate::Completed(analysis)).await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_workbook(dir: &std::path::Path, name: &str, json: &serde_json::Value) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        write!(file, "{}", json).unwrap();
    }

    fn november_workbook() -> serde_json::Value {
        serde_json::json!({
            "sheets": [{
                "name": "01-11",
                "rows": [
                    ["RUT", "NOMBRE", "EDAD", "TIPO", "UPC", "DIAGNOSTICO"],
                    ["1-9", "SOTO PEREZ LUIS", 45.0, "MEDIA", null, "TEC"],
                ],
            }]
        })
    }

    async fn drain(mut rx: mpsc::Receiver<IngestUpdate>) -> Vec<IngestUpdate> {
        let mut updates = Vec::new();
        while let Some(update) = rx.recv().await {
            updates.push(update);
        }
        updates
    }

    #[tokio::test]
    async fn test_ingest_sends_progress_and_completion() {
        let dir = TempDir::new().unwrap();
        write_workbook(dir.path(), "11. NOVIEMBRE 2025.json", &november_workbook());

        let orchestrator = IngestOrchestrator::new(dir.path().to_path_buf());
        let (rx, _handle) = orchestrator.start();
        let updates = drain(rx).await;

        assert!(matches!(
            updates.first(),
            Some(IngestUpdate::FileStarted { index: 1, total: 1, .. })
        ));
        assert!(matches!(
            updates.get(1),
            Some(IngestUpdate::FileDone { snapshots: 1, .. })
        ));
        match updates.last() {
            Some(IngestUpdate::Completed(analysis)) => {
                assert_eq!(analysis.events.len(), 1);
                assert_eq!(analysis.snapshots_count, 1);
            }
            other => panic!("expected Completed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ingest_reports_file_failures() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("malo.json"), "not json").unwrap();
        write_workbook(dir.path(), "11. NOVIEMBRE 2025.json", &november_workbook());

        let orchestrator = IngestOrchestrator::new(dir.path().to_path_buf());
        let (rx, _handle) = orchestrator.start();
        let updates = drain(rx).await;

        assert!(updates
            .iter()
            .any(|u| matches!(u, IngestUpdate::FileFailed { file, .. } if file == "malo.json")));
        match updates.last() {
            Some(IngestUpdate::Completed(analysis)) => {
                assert_eq!(analysis.failures.len(), 1);
                assert_eq!(analysis.events.len(), 1);
            }
            other => panic!("expected Completed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ingest_empty_directory_completes() {
        let dir = TempDir::new().unwrap();
        let orchestrator = IngestOrchestrator::new(dir.path().to_path_buf());
        let (rx, handle) = orchestrator.start();
        let updates = drain(rx).await;

        assert_eq!(updates.len(), 1);
        assert!(matches!(updates[0], IngestUpdate::Completed(_)));
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_abort_closes_update_channel() {
        let dir = TempDir::new().unwrap();
        write_workbook(dir.path(), "11. NOVIEMBRE 2025.json", &november_workbook());

        let orchestrator = IngestOrchestrator::new(dir.path().to_path_buf());
        let (rx, handle) = orchestrator.start();
        handle.abort();

        // The channel must close either way (task completed just before
        // the abort landed, or was cancelled), so the drain terminates.
        let updates = drain(rx).await;
        let completions = updates
            .iter()
            .filter(|u| matches!(u, IngestUpdate::Completed(_)))
            .count();
        assert!(completions <= 1);
    }
}
