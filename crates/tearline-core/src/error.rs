//! Error types for tearline

use thiserror::Error;

/// The main error type for tearline operations
#[derive(Debug, Error)]
pub enum TearlineError {
    #[error("Failed to load asset '{path}': {reason}")]
    AssetLoad { path: String, reason: String },

    #[error("Video playback was rejected: {0}")]
    AutoplayBlocked(String),

    #[error("Missing geometry data: {0}")]
    MissingGeometry(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Component is not mounted: {0}")]
    NotMounted(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),
}

impl TearlineError {
    /// Shorthand for an asset failure on a given path
    pub fn asset(path: impl Into<String>, reason: impl ToString) -> Self {
        TearlineError::AssetLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for tearline operations
pub type Result<T> = std::result::Result<T, TearlineError>;

impl From<toml::de::Error> for TearlineError {
    fn from(err: toml::de::Error) -> Self {
        TearlineError::TomlParse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_error_formats_path_and_reason() {
        let err = TearlineError::asset("/card.png", "404");
        assert_eq!(err.to_string(), "Failed to load asset '/card.png': 404");
    }

    #[test]
    fn toml_errors_convert() {
        let parsed: std::result::Result<toml::Value, _> = toml::from_str("a = ");
        let err: TearlineError = parsed.unwrap_err().into();
        assert!(matches!(err, TearlineError::TomlParse(_)));
    }
}
