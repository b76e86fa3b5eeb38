//! Bounded polling for element lookups and readiness checks.
//!
//! Everything that waits in this crate goes through [`poll_until`]: a probe
//! is evaluated at a fixed interval until it yields a value, the budget
//! elapses, or the probe itself fails. There is no cancellation beyond the
//! bounded timeout.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::result::PalparResult;

/// Default implicit wait for element lookups (10 seconds)
pub const DEFAULT_IMPLICIT_WAIT_MS: u64 = 10_000;

/// Default wait for the app's initial screen (30 seconds)
pub const DEFAULT_APP_LOAD_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (250ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_IMPLICIT_WAIT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create wait options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds.
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Timeout as a `Duration`.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll interval as a `Duration`.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Poll `probe` until it yields a value or the wait budget elapses.
///
/// Returns `Ok(Some(value))` on success, `Ok(None)` if the budget elapsed
/// with the probe still empty, and `Err` as soon as the probe itself fails.
/// The probe always runs at least once, even with a zero timeout.
pub async fn poll_until<T, F, Fut>(options: WaitOptions, mut probe: F) -> PalparResult<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PalparResult<Option<T>>>,
{
    let deadline = Instant::now() + options.timeout();
    loop {
        if let Some(value) = probe().await? {
            return Ok(Some(value));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        tokio::time::sleep(options.poll_interval()).await;
    }
}
