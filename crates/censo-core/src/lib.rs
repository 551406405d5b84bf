//! Core domain layer for the bed-census pipeline.
//!
//! Holds the shared data model (`Snapshot`, `Event`, `Report`), field and
//! date normalization, the error taxonomy and the CLI settings. The
//! extraction / reconciliation / reporting stages live in `censo-data`.

pub mod dates;
pub mod error;
pub mod formatting;
pub mod models;
pub mod normalize;
pub mod settings;
