mod bootstrap;

use anyhow::Result;
use clap::Parser;

use censo_core::formatting::{format_date, format_number};
use censo_core::models::{Event, Report};
use censo_core::settings::{parse_month_arg, Settings};
use censo_data::analysis::CensusAnalysis;
use censo_data::export::{export_rows, EXPORT_HEADERS};
use censo_data::reporter;
use censo_runtime::orchestrator::{IngestOrchestrator, IngestUpdate};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::parse();
    settings.validate()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("censo-camas v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Data: {}, view: {}",
        settings.data_path.display(),
        settings.view
    );

    let orchestrator = IngestOrchestrator::new(settings.data_path.clone());
    let (mut rx, handle) = orchestrator.start();

    // Drain ingestion updates; Ctrl+C aborts at the next file boundary.
    let mut analysis: Option<CensusAnalysis> = None;
    loop {
        tokio::select! {
            update = rx.recv() => match update {
                Some(IngestUpdate::FileStarted { file, index, total }) => {
                    tracing::info!("[{}/{}] Procesando {}", index, total, file);
                }
                Some(IngestUpdate::FileDone { file, snapshots }) => {
                    tracing::info!("{}: {} registros", file, snapshots);
                }
                Some(IngestUpdate::FileFailed { file, error }) => {
                    eprintln!("Archivo omitido {}: {}", file, error);
                }
                Some(IngestUpdate::Completed(result)) => {
                    analysis = Some(result);
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C recibido; cancelando ingesta");
                handle.abort();
                return Ok(());
            }
        }
    }

    let Some(analysis) = analysis else {
        eprintln!("La ingesta terminó sin resultados");
        return Ok(());
    };

    tracing::info!(
        "{} archivo(s), {} registros, {} eventos ({:.2}s carga, {:.2}s reconciliación)",
        analysis.metadata.files_processed,
        analysis.snapshots_count,
        analysis.events.len(),
        analysis.metadata.load_time_seconds,
        analysis.metadata.reconcile_time_seconds,
    );

    if analysis.events.is_empty() {
        println!("No se encontraron eventos de hospitalización en los datos.");
        return Ok(());
    }

    let reports = build_reports(&settings, &analysis.events)?;
    if reports.is_empty() {
        println!("Sin datos para el periodo solicitado.");
        return Ok(());
    }

    for report in &reports {
        print_report(report, settings.patients);
    }

    Ok(())
}

/// Run the Reporter for the view selected on the command line.
fn build_reports(settings: &Settings, events: &[Event]) -> Result<Vec<Report>> {
    let reports = match settings.view.as_str() {
        "quarterly" => match (settings.year, settings.quarter) {
            (Some(year), Some(quarter)) => reporter::quarterly_report(events, year, quarter)
                .into_iter()
                .collect(),
            _ => Vec::new(),
        },
        "yearly" => match settings.year {
            Some(year) => reporter::yearly_report(events, year).into_iter().collect(),
            None => Vec::new(),
        },
        "range" => match (&settings.from, &settings.to) {
            (Some(from), Some(to)) => {
                let from = parse_month_arg(from)?;
                let to = parse_month_arg(to)?;
                reporter::range_report(events, from, to).into_iter().collect()
            }
            _ => Vec::new(),
        },
        _ => reporter::monthly_reports_with_limit(events, settings.monthly_cap),
    };
    Ok(reports)
}

/// Print one report as text: header, aggregates, daily series and,
/// optionally, the per-patient export rows.
fn print_report(report: &Report, with_patients: bool) {
    println!();
    println!(
        "== {} ({} a {}) ==",
        report.title,
        format_date(report.start),
        format_date(report.end)
    );
    println!(
        "Ingresos: {}   Altas: {}   Pacientes UPC: {}   Estadía promedio: {} días",
        report.total_admissions,
        report.total_discharges,
        report.total_upc_patients,
        format_number(report.avg_los, 1),
    );

    if !report.daily.is_empty() {
        println!();
        println!(
            "{:<12} {:>9} {:>5} {:>7} {:>9} {:>6} {:>10}",
            "Fecha", "Ocupación", "UPC", "No UPC", "Ingresos", "Altas", "Traslados"
        );
        for (date, stats) in &report.daily {
            println!(
                "{:<12} {:>9} {:>5} {:>7} {:>9} {:>6} {:>10}",
                format_date(*date),
                stats.total_occupancy,
                stats.upc_occupancy,
                stats.non_upc_occupancy,
                stats.admissions,
                stats.discharges,
                stats.transfers,
            );
        }
    }

    if with_patients {
        println!();
        println!("{}", EXPORT_HEADERS.join(" | "));
        for row in export_rows(report) {
            println!("{}", row.values().join(" | "));
        }
    }
}
