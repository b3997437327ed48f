use std::time::Duration;

use log::error;
use rocket::tokio::task::spawn_blocking;
use rocket::tokio::time::timeout;

use crate::error::ArenaError;

/// Run store work on the blocking pool, giving up after `deadline`.
///
/// An expired job keeps running to completion in the background, so a
/// commit that already started is never rolled back. The same holds for a
/// job still queued behind a lock: an add or clear that timed out waiting
/// for a battle can still take effect once the battle releases staging.
pub async fn with_deadline<T, F>(deadline: Duration, job: F) -> Result<T, ArenaError>
where
    F: FnOnce() -> Result<T, ArenaError> + Send + 'static,
    T: Send + 'static,
{
    match timeout(deadline, spawn_blocking(job)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => {
            error!("Store job failed: {join_error}");
            Err(ArenaError::Persistence(format!("store job failed: {join_error}")))
        }
        Err(_) => {
            error!("Store job exceeded {} ms", deadline.as_millis());
            Err(ArenaError::Persistence(format!(
                "store did not answer within {} ms",
                deadline.as_millis()
            )))
        }
    }
}
