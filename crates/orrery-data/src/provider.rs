//! Archive-first data loading with an offline fallback.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use orrery_config::DataConfig;

use crate::fetch::{DataError, JsonFetcher, UreqJsonFetcher};
use crate::record::{ExoplanetRecord, records_from_json};

pub const DEFAULT_LIMIT: u32 = 500;

const ARCHIVE_QUERY: &str = "select+pl_name,discoverymethod,pl_orbper,pl_orbsmax,pl_rade,pl_masse,sy_dist+from+ps+where+pl_orbsmax+is+not+null+and+pl_rade+is+not+null+and+pl_masse+is+not+null";

/// TAP query URL for up to `limit` planets ordered by semi-major axis.
pub fn archive_url(limit: u32) -> String {
    format!(
        "https://exoplanetarchive.ipac.caltech.edu/TAP/sync?query={ARCHIVE_QUERY}+order+by+pl_orbsmax&format=json&max_rows={limit}"
    )
}

/// Where a [`LoadResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Primary,
    Fallback,
    Empty,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Primary => write!(f, "NASA Exoplanet Archive"),
            DataSource::Fallback => write!(f, "offline sample"),
            DataSource::Empty => write!(f, "empty"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Maximum rows requested from the archive.
    pub limit: u32,
    /// Skip the archive and go straight to the sample.
    pub fallback_only: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            fallback_only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    pub source: DataSource,
    pub records: Vec<ExoplanetRecord>,
}

impl LoadResult {
    pub fn empty() -> Self {
        Self {
            source: DataSource::Empty,
            records: Vec::new(),
        }
    }
}

/// Loads exoplanet records, falling back from the archive to the offline sample.
#[derive(Clone)]
pub struct ExoplanetDataLoader {
    fetcher: Option<Arc<dyn JsonFetcher>>,
    fallback_location: String,
    offline: bool,
}

impl ExoplanetDataLoader {
    /// A loader without a fetcher always yields [`DataSource::Empty`].
    pub fn new(fetcher: Option<Arc<dyn JsonFetcher>>, fallback_location: impl Into<String>) -> Self {
        Self {
            fetcher,
            fallback_location: fallback_location.into(),
            offline: false,
        }
    }

    pub fn from_config(config: &DataConfig) -> Self {
        let fetcher = UreqJsonFetcher::new(Duration::from_secs(config.request_timeout_secs));
        Self {
            fetcher: Some(Arc::new(fetcher)),
            fallback_location: config.fallback_data_path.clone(),
            offline: config.offline,
        }
    }

    /// Load records. Never fails; see [`DataSource`] for the outcome.
    pub fn load_exoplanet_data(&self, options: &LoadOptions) -> LoadResult {
        let Some(fetcher) = self.fetcher.as_deref() else {
            log::warn!("No JSON fetcher available; exoplanet data disabled");
            return LoadResult::empty();
        };

        if !options.fallback_only && !self.offline {
            match fetch_records(fetcher, &archive_url(options.limit)) {
                Ok(records) if !records.is_empty() => {
                    return LoadResult {
                        source: DataSource::Primary,
                        records,
                    };
                }
                Ok(_) => log::warn!("Exoplanet archive returned no rows, using offline sample"),
                Err(e) => log::warn!("Exoplanet archive unavailable, using offline sample: {e}"),
            }
        }

        match fetch_records(fetcher, &self.fallback_location) {
            Ok(records) if !records.is_empty() => LoadResult {
                source: DataSource::Fallback,
                records,
            },
            Ok(_) => {
                log::error!("Offline sample {} is empty", self.fallback_location);
                LoadResult::empty()
            }
            Err(e) => {
                log::error!("Offline sample failed to load: {e}");
                LoadResult::empty()
            }
        }
    }
}

/// Fetch and parse; a non-array document yields an empty list.
fn fetch_records(
    fetcher: &dyn JsonFetcher,
    location: &str,
) -> Result<Vec<ExoplanetRecord>, DataError> {
    let value = fetcher.fetch_json(location)?;
    Ok(records_from_json(value).unwrap_or_default())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    /// Serves canned documents and records every requested location.
    #[derive(Default)]
    pub(crate) struct MockFetcher {
        pub archive: Option<Value>,
        pub sample: Option<Value>,
        pub calls: Mutex<Vec<String>>,
    }

    impl JsonFetcher for MockFetcher {
        fn fetch_json(&self, location: &str) -> Result<Value, DataError> {
            self.calls.lock().unwrap().push(location.to_string());
            let doc = if location.starts_with("https://") {
                &self.archive
            } else {
                &self.sample
            };
            doc.clone().ok_or(DataError::Unavailable)
        }
    }

    pub(crate) fn planets(names: &[&str]) -> Value {
        Value::Array(
            names
                .iter()
                .map(|n| json!({"pl_name": n, "pl_orbsmax": 1.0, "pl_masse": 5.0, "pl_rade": 1.5}))
                .collect(),
        )
    }

    fn mock_loader(mock: MockFetcher) -> (ExoplanetDataLoader, Arc<MockFetcher>) {
        let mock = Arc::new(mock);
        let fetcher: Arc<dyn JsonFetcher> = mock.clone();
        (ExoplanetDataLoader::new(Some(fetcher), "sample.json"), mock)
    }

    #[test]
    fn test_archive_success_is_primary() {
        let (loader, mock) = mock_loader(MockFetcher {
            archive: Some(planets(&["a", "b"])),
            sample: Some(planets(&["s"])),
            ..Default::default()
        });
        let result = loader.load_exoplanet_data(&LoadOptions::default());
        assert_eq!(result.source, DataSource::Primary);
        assert_eq!(result.records.len(), 2);
        assert_eq!(mock.calls.lock().unwrap().len(), 1, "sample must not be fetched");
    }

    #[test]
    fn test_empty_archive_falls_back_to_sample() {
        let (loader, _) = mock_loader(MockFetcher {
            archive: Some(json!([])),
            sample: Some(planets(&["s1", "s2", "s3"])),
            ..Default::default()
        });
        let result = loader.load_exoplanet_data(&LoadOptions::default());
        assert_eq!(result.source, DataSource::Fallback);
        assert_eq!(result.records.len(), 3);
    }

    #[test]
    fn test_non_list_archive_falls_back() {
        let (loader, _) = mock_loader(MockFetcher {
            archive: Some(json!({"message": "maintenance"})),
            sample: Some(planets(&["s"])),
            ..Default::default()
        });
        assert_eq!(
            loader.load_exoplanet_data(&LoadOptions::default()).source,
            DataSource::Fallback
        );
    }

    #[test]
    fn test_everything_failing_is_empty() {
        let (loader, _) = mock_loader(MockFetcher {
            archive: Some(json!([])),
            sample: Some(json!([])),
            ..Default::default()
        });
        assert_eq!(loader.load_exoplanet_data(&LoadOptions::default()), LoadResult::empty());

        let (unreachable, _) = mock_loader(MockFetcher::default());
        assert_eq!(
            unreachable.load_exoplanet_data(&LoadOptions::default()).source,
            DataSource::Empty
        );
    }

    #[test]
    fn test_fallback_only_skips_archive() {
        let (loader, mock) = mock_loader(MockFetcher {
            archive: Some(planets(&["a"])),
            sample: Some(planets(&["s"])),
            ..Default::default()
        });
        let result = loader.load_exoplanet_data(&LoadOptions {
            fallback_only: true,
            ..Default::default()
        });
        assert_eq!(result.source, DataSource::Fallback);
        assert_eq!(mock.calls.lock().unwrap().as_slice(), ["sample.json"]);
    }

    #[test]
    fn test_archive_url_carries_limit() {
        let url = archive_url(42);
        assert!(url.ends_with("&format=json&max_rows=42"));
        assert!(url.contains("order+by+pl_orbsmax"));
        let (loader, mock) = mock_loader(MockFetcher::default());
        loader.load_exoplanet_data(&LoadOptions {
            limit: 7,
            fallback_only: false,
        });
        assert!(mock.calls.lock().unwrap()[0].ends_with("max_rows=7"));
    }

    #[test]
    fn test_missing_fetcher_is_empty() {
        let loader = ExoplanetDataLoader::new(None, "sample.json");
        assert_eq!(loader.load_exoplanet_data(&LoadOptions::default()), LoadResult::empty());
    }

    #[test]
    fn test_bundled_sample_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/sample_exoplanets.json");
        let contents = std::fs::read_to_string(path).unwrap();
        let records = records_from_json(serde_json::from_str(&contents).unwrap()).unwrap();
        assert!(records.len() >= 10);
        assert!(records.iter().all(|r| r.pl_name.is_some()));
    }
}
