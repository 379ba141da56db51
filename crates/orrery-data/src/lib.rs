//! Exoplanet records from the NASA Exoplanet Archive, with an offline sample
//! as fallback.
//!
//! [`ExoplanetDataLoader`] never fails: every error is logged and the result
//! degrades to the sample, then to an empty set. [`ReloadTask`] runs a load on
//! a background thread so the frame loop never waits on the network.

pub mod fetch;
pub mod provider;
pub mod record;
pub mod task;

pub use fetch::{DataError, JsonFetcher, UreqJsonFetcher};
pub use provider::{DataSource, ExoplanetDataLoader, LoadOptions, LoadResult, archive_url};
pub use record::ExoplanetRecord;
pub use task::ReloadTask;
