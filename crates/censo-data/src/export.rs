//! Flat row building for report export.
//!
//! The UI layer owns file writing and sheet styling; this module only
//! shapes a [`Report`] into the agreed column set, one row per patient.

use serde::{Deserialize, Serialize};

use censo_core::formatting::{format_bool_es, format_date, format_opt_date};
use censo_core::models::{Event, Report};

/// Column headers, in export order.
pub const EXPORT_HEADERS: [&str; 14] = [
    "RUT",
    "Nombre",
    "Edad",
    "Diagnóstico",
    "Tipo Cama Final",
    "Pasó por UPC",
    "Es UPC Actualmente",
    "Fecha Ingreso",
    "Fecha Egreso",
    "Fecha Última Vista",
    "Estado Final",
    "Estadía Total (Días)",
    "Días Cama Periodo",
    "Inconsistencias",
];

/// One export row, all fields rendered as display text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRow {
    pub rut: String,
    pub nombre: String,
    pub edad: String,
    pub diagnostico: String,
    pub tipo_cama: String,
    pub paso_por_upc: String,
    pub es_upc: String,
    pub fecha_ingreso: String,
    pub fecha_egreso: String,
    pub fecha_ultima_vista: String,
    pub estado_final: String,
    pub estadia_total: String,
    pub dias_cama_periodo: String,
    pub inconsistencias: String,
}

impl ExportRow {
    /// Render one event (one of a report's private copies) as a row.
    pub fn from_event(ev: &Event) -> Self {
        Self {
            rut: ev.rut.clone(),
            nombre: ev.name.clone(),
            edad: ev.age.map(|a| a.to_string()).unwrap_or_default(),
            diagnostico: ev.diagnosis.clone(),
            tipo_cama: ev.bed_type.clone(),
            paso_por_upc: format_bool_es(ev.was_ever_upc).to_string(),
            es_upc: format_bool_es(ev.is_upc).to_string(),
            fecha_ingreso: format_date(ev.first_seen),
            fecha_egreso: format_opt_date(ev.exit_date()),
            fecha_ultima_vista: format_date(ev.last_seen),
            estado_final: ev.status.to_string(),
            estadia_total: ev.los.to_string(),
            dias_cama_periodo: ev.days_in_period.to_string(),
            inconsistencias: ev.inconsistencies.join("; "),
        }
    }

    /// The row's values in [`EXPORT_HEADERS`] order.
    pub fn values(&self) -> [&str; 14] {
        [
            &self.rut,
            &self.nombre,
            &self.edad,
            &self.diagnostico,
            &self.tipo_cama,
            &self.paso_por_upc,
            &self.es_upc,
            &self.fecha_ingreso,
            &self.fecha_egreso,
            &self.fecha_ultima_vista,
            &self.estado_final,
            &self.estadia_total,
            &self.dias_cama_periodo,
            &self.inconsistencias,
        ]
    }
}

/// One row per patient in the report, in the report's patient order.
pub fn export_rows(report: &Report) -> Vec<ExportRow> {
    report.patients.iter().map(ExportRow::from_event).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
