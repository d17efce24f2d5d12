pub mod async_waiter;
pub mod clock;

use log::{debug, trace, warn};
use std::convert::Infallible;
use std::time::Duration;

use crate::config::WaitConfig;
use crate::error::{BoxError, WaitError};
use crate::{DEFAULT_MAX_WAIT_MS, DEFAULT_POLL_INTERVAL_MS};
use clock::{Clock, SystemClock};

/// A check that reports whether a condition holds right now.
///
/// `Ok(false)` means "not yet" and is retried. `Err` means the observation
/// itself is broken and ends the wait immediately.
pub trait Predicate {
    fn evaluate(&mut self) -> Result<bool, BoxError>;
}

impl<F, E> Predicate for F
where
    F: FnMut() -> Result<bool, E>,
    E: Into<BoxError>,
{
    fn evaluate(&mut self) -> Result<bool, BoxError> {
        self().map_err(Into::into)
    }
}

/// Adapt a plain boolean check into a [`Predicate`].
pub fn infallible<F>(mut check: F) -> impl FnMut() -> Result<bool, Infallible>
where
    F: FnMut() -> bool,
{
    move || Ok(check())
}

/// One polling operation: what to call it, how often to check, how long to
/// keep trying, and what to check.
#[derive(Debug, Clone)]
pub struct WaitSpec<P> {
    label: String,
    poll_interval: Duration,
    max_wait: Duration,
    predicate: P,
}

impl<P> WaitSpec<P> {
    /// Spec with the crate default timings.
    pub fn new(label: impl Into<String>, predicate: P) -> Self {
        Self {
            label: label.into(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_wait: Duration::from_millis(DEFAULT_MAX_WAIT_MS),
            predicate,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Take both timings from a loaded configuration.
    pub fn with_config(self, config: &WaitConfig) -> Self {
        self.with_poll_interval(config.poll_interval())
            .with_max_wait(config.max_wait())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    pub(crate) fn into_parts(self) -> (String, Duration, Duration, P) {
        (self.label, self.poll_interval, self.max_wait, self.predicate)
    }
}

/// Blocking poller.
///
/// The calling thread is blocked for at most `max_wait` plus the duration of
/// one predicate evaluation: a predicate that blocks is never interrupted, so
/// a slow final check overshoots the deadline by however long it takes.
#[derive(Debug, Clone, Default)]
pub struct ConditionWaiter<C = SystemClock> {
    config: WaitConfig,
    clock: C,
}

impl ConditionWaiter<SystemClock> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: WaitConfig) -> Self {
        Self {
            config,
            clock: SystemClock,
        }
    }
}

impl<C: Clock> ConditionWaiter<C> {
    pub fn with_clock(config: WaitConfig, clock: C) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &WaitConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Build a spec using this waiter's default timings.
    pub fn spec<P>(&self, label: impl Into<String>, predicate: P) -> WaitSpec<P> {
        WaitSpec::new(label, predicate).with_config(&self.config)
    }

    /// Wait on a boolean check with this waiter's default timings.
    pub fn wait_until<F>(&self, label: impl Into<String>, check: F) -> Result<(), WaitError>
    where
        F: FnMut() -> bool,
    {
        self.wait(self.spec(label, infallible(check)))
    }

    /// Poll `spec`'s predicate until it holds, faults, or the deadline passes.
    ///
    /// The deadline is checked only after a `false` evaluation, so the
    /// predicate runs at least once even with a zero `max_wait`. An evaluation
    /// that starts exactly at the deadline still counts; the wait fails once
    /// a `false` result is seen with `elapsed >= max_wait`.
    pub fn wait<P: Predicate>(&self, spec: WaitSpec<P>) -> Result<(), WaitError> {
        let (label, poll_interval, max_wait, mut predicate) = spec.into_parts();
        let start = self.clock.now();
        let mut attempts: u64 = 0;

        loop {
            attempts += 1;
            match predicate.evaluate() {
                Ok(true) => {
                    debug!(
                        "Condition {label} fulfilled after {attempts} attempt(s) in {:?}",
                        self.clock.now().saturating_duration_since(start)
                    );
                    return Ok(());
                }
                Ok(false) => {}
                Err(source) => {
                    warn!("Condition check for {label} failed on attempt {attempts}: {source}");
                    return Err(WaitError::Predicate { label, source });
                }
            }

            let elapsed = self.clock.now().saturating_duration_since(start);
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
            self.clock.sleep(poll_interval);
        }
    }
}
