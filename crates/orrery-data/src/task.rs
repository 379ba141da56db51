//! Background exoplanet reloads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crate::provider::{ExoplanetDataLoader, LoadOptions, LoadResult};

/// A data load running on its own thread.
///
/// The result is delivered over a single-slot channel and picked up with
/// [`try_take`](Self::try_take). Once cancelled, the result is discarded even
/// if the worker finishes afterwards. Dropping the task cancels it without
/// joining, so a slow network request never blocks the caller.
pub struct ReloadTask {
    receiver: crossbeam_channel::Receiver<LoadResult>,
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ReloadTask {
    pub fn spawn(loader: ExoplanetDataLoader, options: LoadOptions) -> std::io::Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let handle = std::thread::Builder::new()
            .name("exoplanet-reload".to_string())
            .spawn(move || {
                let result = loader.load_exoplanet_data(&options);
                if !flag.load(Ordering::Acquire) {
                    let _ = tx.send(result);
                }
            })?;

        Ok(Self {
            receiver: rx,
            cancelled,
            handle: Some(handle),
        })
    }

    /// The finished result, if it has arrived and the task was not cancelled.
    pub fn try_take(&mut self) -> Option<LoadResult> {
        if self.is_cancelled() {
            return None;
        }
        let result = self.receiver.try_recv().ok()?;
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        Some(result)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Whether the worker thread has exited (with or without a result).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for ReloadTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{DataError, JsonFetcher};
    use crate::provider::DataSource;
    use crate::provider::tests::{MockFetcher, planets};
    use std::time::{Duration, Instant};

    /// Blocks until released so tests can cancel mid-flight.
    struct GatedFetcher {
        gate: crossbeam_channel::Receiver<()>,
    }

    impl JsonFetcher for GatedFetcher {
        fn fetch_json(&self, _location: &str) -> Result<serde_json::Value, DataError> {
            let _ = self.gate.recv_timeout(Duration::from_secs(5));
            Ok(planets(&["late"]))
        }
    }

    fn wait(task: &mut ReloadTask) -> LoadResult {
        let start = Instant::now();
        loop {
            if let Some(result) = task.try_take() {
                return result;
            }
            assert!(start.elapsed() < Duration::from_secs(5), "Timed out waiting for reload");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_result_is_delivered() {
        let fetcher: Arc<dyn JsonFetcher> = Arc::new(MockFetcher {
            archive: Some(planets(&["a", "b", "c"])),
            ..Default::default()
        });
        let loader = ExoplanetDataLoader::new(Some(fetcher), "sample.json");
        let mut task = ReloadTask::spawn(loader, LoadOptions::default()).unwrap();

        let result = wait(&mut task);
        assert_eq!(result.source, DataSource::Primary);
        assert_eq!(result.records.len(), 3);
        assert!(task.try_take().is_none(), "result is delivered once");
    }

    #[test]
    fn test_cancelled_result_is_discarded() {
        let (release, gate) = crossbeam_channel::bounded(1);
        let fetcher: Arc<dyn JsonFetcher> = Arc::new(GatedFetcher { gate });
        let loader = ExoplanetDataLoader::new(Some(fetcher), "sample.json");
        let mut task = ReloadTask::spawn(loader, LoadOptions::default()).unwrap();

        task.cancel();
        release.send(()).unwrap();

        let start = Instant::now();
        while !task.is_finished() {
            assert!(start.elapsed() < Duration::from_secs(5), "worker did not exit");
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(task.try_take().is_none());
    }
}
