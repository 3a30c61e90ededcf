//! Error types for OpenLIMS

use thiserror::Error;

/// Result type alias for OpenLIMS operations
pub type Result<T> = std::result::Result<T, LimsError>;

/// Errors shared across workspace members
///
/// Domain failures stay in the per-feature error enums on the server side;
/// this type covers the infrastructure concerns this crate itself owns.
#[derive(Error, Debug)]
pub enum LimsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LimsError::Config("missing DATABASE_URL".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing DATABASE_URL");
    }

    #[test]
    fn test_from_serde_error() {
        let serde_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: LimsError = serde_err.into();
        assert!(matches!(err, LimsError::Serialization(_)));
    }
}
