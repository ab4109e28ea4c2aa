//! Cache configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config:
//!
//! ```
//! use rttp_cache::config::CacheConfig;
//!
//! let config = CacheConfig::from_json(r#"{ "vary_headers": ["Accept-Language"] }"#).unwrap();
//! assert_eq!(config.status_header, "X-Cache-Status");
//! assert_eq!(config.vary_headers, vec!["Accept-Language".to_owned()]);
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Largest body the store keeps (8 MiB).
pub const DEFAULT_MAX_ENTRY_BYTES: usize = 8 * 1024 * 1024;

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid header name in {field}: {name:?}")]
    InvalidHeaderName { field: &'static str, name: String },
}

/// Settings for a [`CacheController`](crate::cache::CacheController).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Response header carrying the transaction outcome.
    pub status_header: String,
    /// Request headers that select between variants of one resource.
    pub vary_headers: Vec<String>,
    /// Bodies larger than this are served but not stored.
    pub max_entry_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            status_header: "X-Cache-Status".to_owned(),
            vary_headers: vec!["Accept-Encoding".to_owned()],
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
        }
    }
}

impl CacheConfig {
    /// Parses and validates a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Checks that every configured header name is a valid HTTP token.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_token(&self.status_header) {
            return Err(ConfigError::InvalidHeaderName {
                field: "status_header",
                name: self.status_header.clone(),
            });
        }
        if let Some(bad) = self.vary_headers.iter().find(|name| !is_token(name)) {
            return Err(ConfigError::InvalidHeaderName {
                field: "vary_headers",
                name: bad.clone(),
            });
        }
        Ok(())
    }
}

// RFC 9110 §5.6.2 token.
fn is_token(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#'
                        | b'$'
                        | b'%'
                        | b'&'
                        | b'\''
                        | b'*'
                        | b'+'
                        | b'-'
                        | b'.'
                        | b'^'
                        | b'_'
                        | b'`'
                        | b'|'
                        | b'~'
                )
        })
}
