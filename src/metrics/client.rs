use thiserror::Error;

use crate::metrics::MetricDataPoint;

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("failed to begin transaction")]
    BeginTransaction(#[source] sqlx::Error),

    #[error("failed to execute bulk insert query")]
    Insert(#[source] sqlx::Error),

    #[error("failed to commit transaction")]
    Commit(#[source] sqlx::Error),

    #[error("failed to encode dimensions")]
    Encode(#[from] serde_json::Error),
}

/// Accepts one batch of data points for a namespace.
pub trait MetricsClient {
    fn submit(
        &self,
        namespace: &str,
        data_points: &[MetricDataPoint],
    ) -> impl Future<Output = Result<(), SubmitError>> + Send;
}
