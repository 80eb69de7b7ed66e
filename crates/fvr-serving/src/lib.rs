//! fvr-serving
//!
//! Canonical snapshot fetching: the serving-system boundary, the Zoltar
//! adapter, and [`fetch`], which hands the live snapshot to the normalizer
//! as a [`RawTable`].
//!
//! No retries and no caching: every call goes to the serving system.

pub mod system;
pub mod zoltar;

use fvr_normalize::RawTable;

pub use system::{Credentials, ServingError, ServingSystem};
pub use zoltar::ZoltarClient;

/// Download the live snapshot for (`dataset`, `time_key`).
///
/// A missing project, model or forecast surfaces as
/// [`ServingError::NotFound`]; callers treat that as "not published".
pub async fn fetch(
    serving: &dyn ServingSystem,
    dataset: &str,
    time_key: &str,
) -> Result<RawTable, ServingError> {
    let doc = serving.download(dataset, time_key).await?;
    tracing::debug!(
        dataset,
        time_key,
        source = serving.source_name(),
        elements = doc.predictions.len(),
        "canonical snapshot fetched"
    );
    Ok(RawTable::Predictions(doc))
}
