//! Async counterpart of [`ConditionWaiter::wait`](super::ConditionWaiter::wait)
//! for predicates that need to `.await` (async HTTP checks, channel reads).
//!
//! Timing is measured with `tokio::time::Instant`, so tests running with a
//! paused clock see exact multiples of the poll interval.

use log::{debug, trace, warn};
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use super::WaitSpec;
use crate::error::{BoxError, WaitError};

/// Poll an async predicate until it holds, faults, or the deadline passes.
pub async fn wait_async<F, Fut, E>(spec: WaitSpec<F>) -> Result<(), WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: Into<BoxError>,
{
    run(spec, None).await
}

/// Like [`wait_async`], but a `true` sent on `shutdown` while sleeping between
/// attempts ends the wait with [`WaitError::Cancelled`]. A dropped sender
/// never cancels. A predicate evaluation already in flight is not interrupted.
pub async fn wait_async_with_shutdown<F, Fut, E>(
    spec: WaitSpec<F>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: Into<BoxError>,
{
    run(spec, Some(&mut shutdown)).await
}

async fn run<F, Fut, E>(
    spec: WaitSpec<F>,
    mut shutdown: Option<&mut watch::Receiver<bool>>,
) -> Result<(), WaitError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: Into<BoxError>,
{
    let (label, poll_interval, max_wait, mut predicate) = spec.into_parts();
    let start = Instant::now();
    let mut attempts: u64 = 0;

    loop {
        attempts += 1;
        match predicate().await {
            Ok(true) => {
                debug!(
                    "Condition {label} fulfilled after {attempts} attempt(s) in {:?}",
                    start.elapsed()
                );
                return Ok(());
            }
            Ok(false) => {}
            Err(e) => {
                let source: BoxError = e.into();
                warn!("Condition check for {label} failed on attempt {attempts}: {source}");
                return Err(WaitError::Predicate { label, source });
            }
        }

        let elapsed = start.elapsed();
        if elapsed >= max_wait {
            warn!("Timed out waiting for {label} after {elapsed:?} ({attempts} attempts)");
            return Err(WaitError::Timeout {
                label,
                elapsed,
                max_wait,
                attempts,
            });
        }

        trace!("Condition {label} not yet fulfilled, retrying in {poll_interval:?}");
        if pause(poll_interval, shutdown.as_deref_mut()).await {
            let elapsed = start.elapsed();
            debug!("Wait for {label} cancelled after {elapsed:?}");
            return Err(WaitError::Cancelled { label, elapsed });
        }
    }
}

/// Sleep for `interval`. Returns `true` if shutdown was requested meanwhile.
async fn pause(interval: Duration, shutdown: Option<&mut watch::Receiver<bool>>) -> bool {
    let Some(shutdown) = shutdown else {
        tokio::time::sleep(interval).await;
        return false;
    };

    if *shutdown.borrow() {
        return true;
    }

    let sleep = tokio::time::sleep(interval);
    tokio::pin!(sleep);
    let mut watching = true;

    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            changed = shutdown.changed(), if watching => match changed {
                Ok(()) if *shutdown.borrow() => return true,
                Ok(()) => {}
                Err(_) => watching = false,
            },
        }
    }
}
