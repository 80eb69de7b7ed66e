//! In-memory serving system.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use fvr_normalize::PredictionDoc;
use fvr_serving::{Credentials, ServingError, ServingSystem};

#[derive(Default)]
pub struct FakeServing {
    snapshots: HashMap<(String, String), PredictionDoc>,
    failure: Option<ServingError>,
    download_calls: AtomicUsize,
}

impl FakeServing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(mut self, dataset: &str, time_key: &str, doc: PredictionDoc) -> Self {
        self.snapshots
            .insert((dataset.to_string(), time_key.to_string()), doc);
        self
    }

    /// Every download fails with `err`.
    pub fn with_failure(mut self, err: ServingError) -> Self {
        self.failure = Some(err);
        self
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ServingSystem for FakeServing {
    fn source_name(&self) -> &'static str {
        "fake"
    }

    async fn authenticate(&self, _credentials: &Credentials) -> Result<(), ServingError> {
        Ok(())
    }

    async fn download(&self, dataset: &str, time_key: &str) -> Result<PredictionDoc, ServingError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        self.snapshots
            .get(&(dataset.to_string(), time_key.to_string()))
            .cloned()
            .ok_or_else(|| ServingError::not_found(format!("forecast of '{dataset}' for {time_key}")))
    }
}
