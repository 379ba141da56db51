//! JSON fetching seam.

use std::path::PathBuf;
use std::time::Duration;

/// Errors raised while fetching a JSON document.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON from {location}: {source}")]
    Json {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no fetch capability available")]
    Unavailable,
}

/// Fetches a JSON document from a URL or a file path.
pub trait JsonFetcher: Send + Sync {
    fn fetch_json(&self, location: &str) -> Result<serde_json::Value, DataError>;
}

/// Reads `http(s)` locations with `ureq` (sending `Accept: application/json`)
/// and everything else from the filesystem.
pub struct UreqJsonFetcher {
    agent: ureq::Agent,
}

impl UreqJsonFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl JsonFetcher for UreqJsonFetcher {
    fn fetch_json(&self, location: &str) -> Result<serde_json::Value, DataError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let response = self
                .agent
                .get(location)
                .set("Accept", "application/json")
                .call()
                .map_err(|e| DataError::Http {
                    url: location.to_string(),
                    source: Box::new(e),
                })?;
            return serde_json::from_reader(response.into_reader()).map_err(|e| DataError::Json {
                location: location.to_string(),
                source: e,
            });
        }

        let contents = std::fs::read_to_string(location).map_err(|e| DataError::Io {
            path: PathBuf::from(location),
            source: e,
        })?;
        serde_json::from_str(&contents).map_err(|e| DataError::Json {
            location: location.to_string(),
            source: e,
        })
    }
}
