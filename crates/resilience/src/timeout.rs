//! Deadlines around single operations.

use std::future::Future;
use std::time::Duration;

use crate::error::TimeoutError;

/// Await `future`, giving up after `duration`.
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use std::time::Duration;
///
/// let value = beacon_resilience::timeout(Duration::from_secs(1), async { 7 }).await;
/// assert_eq!(value, Ok(7));
/// # }
/// ```
pub async fn timeout<F>(duration: Duration, future: F) -> Result<F::Output, TimeoutError>
where
    F: Future,
{
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| TimeoutError { duration })
}
