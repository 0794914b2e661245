use thiserror::Error;

/// Top-level error type for Jarvis.
///
/// Covers the failures that can happen outside a chat turn: loading
/// configuration and (de)serializing payloads. Errors raised while a
/// turn is being handled live in `jarvis_chat::ChatError` instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum JarvisError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid thread key: {0}")]
    InvalidThreadKey(String),
}

impl From<toml::de::Error> for JarvisError {
    fn from(err: toml::de::Error) -> Self {
        JarvisError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for JarvisError {
    fn from(err: serde_json::Error) -> Self {
        JarvisError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Jarvis operations.
pub type Result<T> = std::result::Result<T, JarvisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = JarvisError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = JarvisError::InvalidThreadKey("C1:".to_string());
        assert_eq!(err.to_string(), "Invalid thread key: C1:");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: JarvisError = io_err.into();
        assert!(matches!(err, JarvisError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let parse_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: JarvisError = parse_err.into();
        assert!(matches!(err, JarvisError::Config(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: JarvisError = json_err.into();
        assert!(matches!(err, JarvisError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error: "));
    }
}
