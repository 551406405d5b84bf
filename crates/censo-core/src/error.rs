use std::path::PathBuf;
use thiserror::Error;

/// All errors surfaced by the census pipeline.
#[derive(Error, Debug)]
pub enum CensoError {
    /// A workbook file could not be opened or read from disk.
    #[error("Failed to read workbook {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A workbook could not be decoded into sheets and cells. Fatal for
    /// that file; other files in a batch continue.
    #[error("Failed to decode workbook {file}: {cause}")]
    WorkbookDecode { file: String, cause: String },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A date argument string did not match the expected format.
    #[error("Invalid date argument: {0}")]
    DateArg(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for raw I/O errors that do not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the census crates.
pub type Result<T> = std::result::Result<T, CensoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = CensoError::FileRead {
            path: PathBuf::from("/censo/11. NOVIEMBRE 2025.json"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read workbook"));
        assert!(msg.contains("NOVIEMBRE"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_workbook_decode() {
        let err = CensoError::WorkbookDecode {
            file: "octubre.json".to_string(),
            cause: "missing sheets array".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to decode workbook octubre.json: missing sheets array"
        );
    }

    #[test]
    fn test_error_display_date_arg() {
        let err = CensoError::DateArg("2025-13".to_string());
        assert_eq!(err.to_string(), "Invalid date argument: 2025-13");
    }

    #[test]
    fn test_error_display_config() {
        let err = CensoError::Config("--quarter requires --year".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: --quarter requires --year"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CensoError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: CensoError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
