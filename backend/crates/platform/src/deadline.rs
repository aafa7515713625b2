//! Deadlines for calls to external collaborators
//!
//! A call that outlives its deadline is dropped (cancelling the in-flight
//! future) and reported as [`DeadlineExceeded`]. Nothing here retries.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Reference deadline for a single store call
pub const STORE_DEADLINE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation exceeded its {0:?} deadline")]
pub struct DeadlineExceeded(pub Duration);

/// Run `fut`, abandoning it after `deadline`
pub async fn with_deadline<F>(deadline: Duration, fut: F) -> Result<F::Output, DeadlineExceeded>
where
    F: Future,
{
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| DeadlineExceeded(deadline))
}
