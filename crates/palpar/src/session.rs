//! Active automation session bound to the target application.
//!
//! A [`Session`] owns nothing remote beyond its id: the driver is shared, and
//! element references obtained through it are valid only until [`Session::end`]
//! consumes the handle. The scenario is the sole mutator during its run; the
//! handle is never shared across threads.

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Capabilities;
use crate::driver::MobileDriver;
use crate::locator::{FallbackChain, Locator};
use crate::protocol::ElementRef;
use crate::result::{PalparError, PalparResult};
use crate::wait::{poll_until, WaitOptions};

/// Handle to one running app-under-test instance.
pub struct Session {
    id: String,
    driver: Arc<dyn MobileDriver>,
    implicit_wait: WaitOptions,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("implicit_wait", &self.implicit_wait)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session on the given driver.
    pub async fn create(
        driver: Arc<dyn MobileDriver>,
        capabilities: &Capabilities,
        implicit_wait: WaitOptions,
    ) -> PalparResult<Self> {
        let id = driver.create_session(capabilities).await?;
        info!(session = %id, "session created");
        Ok(Self {
            id,
            driver,
            implicit_wait,
        })
    }

    /// The server-assigned session id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The implicit wait applied by [`Session::find`].
    #[must_use]
    pub const fn implicit_wait(&self) -> WaitOptions {
        self.implicit_wait
    }

    /// Resolve a single element, polling up to the implicit wait.
    ///
    /// # Errors
    ///
    /// [`PalparError::ElementNotFound`] naming the locator if nothing matches
    /// within the wait budget.
    pub async fn find(&self, locator: &Locator) -> PalparResult<ElementRef> {
        debug!(locator = %locator, "find");
        let found = poll_until(self.implicit_wait, || {
            self.driver.find_element(&self.id, locator)
        })
        .await?;
        found.ok_or_else(|| PalparError::ElementNotFound {
            locator: locator.to_string(),
            waited_ms: self.implicit_wait.timeout_ms,
        })
    }

    /// Existence query: all elements matching `locator`, without waiting.
    ///
    /// Zero matches is an empty `Vec`, never an error.
    pub async fn find_all(&self, locator: &Locator) -> PalparResult<Vec<ElementRef>> {
        self.driver.find_elements(&self.id, locator).await
    }

    /// Short-circuit existence check over an ordered fallback chain.
    ///
    /// Locators are queried left-to-right; the first non-empty result wins
    /// and later alternates are not queried.
    pub async fn exists_any(&self, chain: &FallbackChain) -> PalparResult<bool> {
        for locator in chain.locators() {
            if !self.find_all(locator).await?.is_empty() {
                debug!(locator = %locator, "marker present");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Bounded existence check over an ordered fallback chain.
    ///
    /// Like [`Session::exists_any`], but polls up to the implicit wait before
    /// concluding absence, so a screen still rendering after a tap is not
    /// mistaken for a failed navigation. Each pass evaluates the chain
    /// left-to-right with the same short-circuiting. Returns `Ok(false)` when
    /// the budget elapses with no match.
    pub async fn any_appears(&self, chain: &FallbackChain) -> PalparResult<bool> {
        let found = poll_until(self.implicit_wait, || async {
            Ok(self.exists_any(chain).await?.then_some(()))
        })
        .await?;
        Ok(found.is_some())
    }

    /// Wait until any locator in `chain` matches, polling with `wait`.
    ///
    /// Used for the app-load wait, where the budget differs from the
    /// per-element implicit wait.
    pub async fn wait_for_any(
        &self,
        chain: &FallbackChain,
        wait: WaitOptions,
    ) -> PalparResult<()> {
        let found = poll_until(wait, || async {
            Ok(self.exists_any(chain).await?.then_some(()))
        })
        .await?;
        found.ok_or_else(|| PalparError::Timeout {
            ms: wait.timeout_ms,
            what: format!("waiting for any of: {chain}"),
        })
    }

    /// Clear the element at `locator` and type `text` into it.
    pub async fn type_text(&self, locator: &Locator, text: &str) -> PalparResult<()> {
        let element = self.find(locator).await?;
        self.driver.clear_element(&self.id, &element).await?;
        self.driver.send_keys(&self.id, &element, text).await
    }

    /// Tap the element at `locator`.
    pub async fn tap(&self, locator: &Locator) -> PalparResult<()> {
        let element = self.find(locator).await?;
        self.driver.click(&self.id, &element).await
    }

    /// Current UI hierarchy, for failure diagnostics.
    pub async fn page_source(&self) -> PalparResult<String> {
        self.driver.page_source(&self.id).await
    }

    /// Terminate the session. Consumes the handle, so element references
    /// cannot outlive teardown.
    pub async fn end(self) -> PalparResult<()> {
        info!(session = %self.id, "ending session");
        self.driver.delete_session(&self.id).await
    }
}
