use clap::Parser;
use std::path::PathBuf;

use crate::error::{CensoError, Result};

/// Hospitalization timeline reconstruction from bed-census workbooks
#[derive(Parser, Debug, Clone)]
#[command(
    name = "censo-camas",
    about = "Reconstruye eventos de hospitalización desde censos de camas diarios",
    version
)]
pub struct Settings {
    /// Workbook file or directory of workbooks (decoded JSON form)
    pub data_path: PathBuf,

    /// Report view
    #[arg(long, default_value = "monthly", value_parser = ["monthly", "quarterly", "yearly", "range"])]
    pub view: String,

    /// Year for the quarterly and yearly views
    #[arg(long)]
    pub year: Option<i32>,

    /// Quarter (1-4) for the quarterly view
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=4))]
    pub quarter: Option<u32>,

    /// First month of an arbitrary range, as YYYY-MM
    #[arg(long)]
    pub from: Option<String>,

    /// Last month of an arbitrary range, as YYYY-MM
    #[arg(long)]
    pub to: Option<String>,

    /// Maximum number of months in the monthly view
    #[arg(long, default_value = "36")]
    pub monthly_cap: usize,

    /// Print the per-patient rows of each report
    #[arg(long)]
    pub patients: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path (stderr when absent)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Check that the selected view has the arguments it needs.
    pub fn validate(&self) -> Result<()> {
        match self.view.as_str() {
            "quarterly" => {
                if self.year.is_none() || self.quarter.is_none() {
                    return Err(CensoError::Config(
                        "the quarterly view requires --year and --quarter".to_string(),
                    ));
                }
            }
            "yearly" => {
                if self.year.is_none() {
                    return Err(CensoError::Config(
                        "the yearly view requires --year".to_string(),
                    ));
                }
            }
            "range" => {
                if self.from.is_none() || self.to.is_none() {
                    return Err(CensoError::Config(
                        "the range view requires --from and --to".to_string(),
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Parse a `YYYY-MM` month argument into `(year, month)`.
pub fn parse_month_arg(raw: &str) -> Result<(i32, u32)> {
    let invalid = || CensoError::DateArg(raw.to_string());

    let (y, m) = raw.split_once('-').ok_or_else(invalid)?;
    let year: i32 = y.parse().map_err(|_| invalid())?;
    let month: u32 = m.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) || !(2000..=2099).contains(&year) {
        return Err(invalid());
    }
    Ok((year, month))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(args: &[&str]) -> Settings {
        Settings::try_parse_from(args.iter().copied()).expect("arguments parse")
    }

    // ── Settings parsing ──────────────────────────────────────────────────────

    #[test]
    fn test_settings_defaults() {
        let s = parse_args(&["censo-camas", "./data"]);
        assert_eq!(s.view, "monthly");
        assert_eq!(s.monthly_cap, 36);
        assert_eq!(s.log_level, "INFO");
        assert!(!s.patients);
        assert!(s.year.is_none());
    }

    #[test]
    fn test_settings_quarterly_args() {
        let s = parse_args(&[
            "censo-camas",
            "./data",
            "--view",
            "quarterly",
            "--year",
            "2025",
            "--quarter",
            "2",
        ]);
        assert_eq!(s.view, "quarterly");
        assert_eq!(s.year, Some(2025));
        assert_eq!(s.quarter, Some(2));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_settings_rejects_unknown_view() {
        let result = Settings::try_parse_from(["censo-camas", "./data", "--view", "weekly"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_rejects_quarter_out_of_range() {
        let result = Settings::try_parse_from([
            "censo-camas",
            "./data",
            "--view",
            "quarterly",
            "--year",
            "2025",
            "--quarter",
            "5",
        ]);
        assert!(result.is_err());
    }

    // ── validate ──────────────────────────────────────────────────────────────

    #[test]
    fn test_validate_quarterly_missing_year() {
        let s = parse_args(&["censo-camas", "./data", "--view", "quarterly", "--quarter", "1"]);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_yearly_missing_year() {
        let s = parse_args(&["censo-camas", "./data", "--view", "yearly"]);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_range_missing_bounds() {
        let s = parse_args(&["censo-camas", "./data", "--view", "range", "--from", "2025-01"]);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_monthly_needs_nothing() {
        let s = parse_args(&["censo-camas", "./data"]);
        assert!(s.validate().is_ok());
    }

    // ── parse_month_arg ───────────────────────────────────────────────────────

    #[test]
    fn test_parse_month_arg_valid() {
        assert_eq!(parse_month_arg("2025-01").unwrap(), (2025, 1));
        assert_eq!(parse_month_arg("2025-12").unwrap(), (2025, 12));
    }

    #[test]
    fn test_parse_month_arg_invalid() {
        assert!(parse_month_arg("2025").is_err());
        assert!(parse_month_arg("2025-13").is_err());
        assert!(parse_month_arg("1999-05").is_err());
        assert!(parse_month_arg("abcd-ef").is_err());
    }
}
