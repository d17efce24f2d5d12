//! # condwait
//!
//! Bounded condition polling for tests that observe components which start up
//! asynchronously: deployed web applications, registered servlets, reachable
//! servers, activated bundles.
//!
//! The core is [`ConditionWaiter`]: evaluate a predicate, succeed on `true`,
//! fail fast on a predicate fault, otherwise sleep for a fixed interval until
//! the deadline is reached.

pub mod config;
pub mod error;
pub mod probe;
pub mod waiter;

#[cfg(any(test, feature = "test-harness"))]
pub mod test_harness;

// Default timing constants
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_MAX_WAIT_MS: u64 = 10_000;

// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "CONDWAIT";

pub use crate::config::{load_config, WaitConfig};
pub use crate::error::{BoxError, ProbeError, WaitError};
pub use crate::probe::{file_exists, tcp_reachable, AsyncHttpProbe, EventFlag, HttpProbe};
pub use crate::waiter::async_waiter::{wait_async, wait_async_with_shutdown};
pub use crate::waiter::clock::{Clock, ManualClock, SystemClock};
pub use crate::waiter::{infallible, ConditionWaiter, Predicate, WaitSpec};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
