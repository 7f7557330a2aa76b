//! Error types for grid_cache

use thiserror::Error;

/// Failure to obtain image bytes for a slot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Request never produced a response (DNS, connect, TLS, body read)
    #[error("Network error: {0}")]
    Transport(String),
    /// Server answered with something other than 200
    #[error("Error response code: {0}")]
    HttpStatus(u16),
    /// Body was empty or could not be decoded as an image
    #[error("Invalid response data")]
    InvalidPayload,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

/// Failure of the on-disk resource store
#[derive(Debug, Error)]
pub enum StoreError {
    /// No file exists under the requested name
    #[error("Resource not found: {0}")]
    NotFound(String),
    /// File exists (or should) but could not be read or written
    #[error("I/O error for resource {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure of the key/value settings backend
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Settings serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure to load configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid endpoint URL: {0}")]
    Endpoint(String),
}

/// Unified error type for grid_cache operations
#[derive(Debug, Error)]
pub enum GridError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result alias for grid_cache operations
pub type Result<T> = std::result::Result<T, GridError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_messages() {
        assert_eq!(
            FetchError::HttpStatus(404).to_string(),
            "Error response code: 404"
        );
        assert_eq!(FetchError::InvalidPayload.to_string(), "Invalid response data");
        assert_eq!(
            FetchError::Transport("connection refused".to_string()).to_string(),
            "Network error: connection refused"
        );
    }

    #[test]
    fn test_store_error_names_resource() {
        let err = StoreError::NotFound("abc.jpeg".to_string());
        assert!(err.to_string().contains("abc.jpeg"));
    }

    #[test]
    fn test_grid_error_is_transparent() {
        let err: GridError = FetchError::HttpStatus(500).into();
        assert_eq!(err.to_string(), "Error response code: 500");
    }
}
