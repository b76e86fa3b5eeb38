//! Abstract mobile automation driver trait.
//!
//! The rest of the crate depends only on this operation set: find-by-locator
//! (single, all), send-input, click, session lifecycle, status. The wire
//! format is owned by the concrete implementation.
//!
//! # Implementations
//!
//! - [`crate::client::AppiumClient`] - default, speaks the WebDriver protocol
//!   over HTTP
//! - [`MockDriver`] - in-memory screens for unit and integration testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::Capabilities;
use crate::locator::Locator;
use crate::protocol::{ElementRef, ServerStatus};
use crate::result::{PalparError, PalparResult};

/// Abstract driver for mobile UI automation.
///
/// All operations are issued against a session id previously returned by
/// [`MobileDriver::create_session`]. Element references are only valid within
/// that session.
#[async_trait]
pub trait MobileDriver: Send + Sync {
    /// Query server readiness.
    async fn status(&self) -> PalparResult<ServerStatus>;

    /// Create a session bound to the target application.
    async fn create_session(&self, capabilities: &Capabilities) -> PalparResult<String>;

    /// Find the first element matching `locator`.
    ///
    /// Returns `Ok(None)` when nothing matches; waiting is the caller's job.
    async fn find_element(
        &self,
        session: &str,
        locator: &Locator,
    ) -> PalparResult<Option<ElementRef>>;

    /// Find all elements matching `locator`.
    ///
    /// Zero matches is an empty `Vec`, never an error.
    async fn find_elements(
        &self,
        session: &str,
        locator: &Locator,
    ) -> PalparResult<Vec<ElementRef>>;

    /// Clear an editable element's content.
    async fn clear_element(&self, session: &str, element: &ElementRef) -> PalparResult<()>;

    /// Type text into an element.
    async fn send_keys(&self, session: &str, element: &ElementRef, text: &str)
        -> PalparResult<()>;

    /// Tap/click an element.
    async fn click(&self, session: &str, element: &ElementRef) -> PalparResult<()>;

    /// Fetch the current UI hierarchy for diagnostics.
    async fn page_source(&self, session: &str) -> PalparResult<String>;

    /// Terminate the session and release its remote resources.
    async fn delete_session(&self, session: &str) -> PalparResult<()>;
}

/// In-memory driver for testing.
///
/// Screens are a map from locator to element references; `reveal_on_click`
/// entries model navigation (tapping LOGIN makes the inventory markers
/// appear). Calls are recorded for verification, and session deletions are
/// counted so teardown-exactly-once is checkable.
#[derive(Debug, Default)]
pub struct MockDriver {
    elements: Mutex<HashMap<Locator, Vec<ElementRef>>>,
    reveals: Mutex<HashMap<String, Vec<(Locator, ElementRef)>>>,
    pending: Mutex<Vec<(Instant, Locator, ElementRef)>>,
    transition_latency: Mutex<Option<Duration>>,
    typed: Mutex<HashMap<String, String>>,
    failures: Mutex<HashMap<String, String>>,
    call_history: Mutex<Vec<String>>,
    active_session: Mutex<Option<String>>,
    delete_count: AtomicUsize,
}

impl MockDriver {
    /// Create an empty mock driver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an element on the current screen, returning its reference.
    pub fn add_element(&self, locator: Locator) -> ElementRef {
        let element = ElementRef::new(Uuid::new_v4().to_string());
        self.elements
            .lock()
            .unwrap()
            .entry(locator)
            .or_default()
            .push(element.clone());
        element
    }

    /// When `trigger` is clicked, make an element matching `locator` appear.
    pub fn reveal_on_click(&self, trigger: &ElementRef, locator: Locator) {
        let revealed = ElementRef::new(Uuid::new_v4().to_string());
        self.reveals
            .lock()
            .unwrap()
            .entry(trigger.id.clone())
            .or_default()
            .push((locator, revealed));
    }

    /// Delay click-revealed elements by `latency` before they become
    /// findable, modelling screen-transition time after a tap.
    pub fn set_transition_latency(&self, latency: Duration) {
        *self.transition_latency.lock().unwrap() = Some(latency);
    }

    /// Make the named method fail with a session error.
    pub fn fail_on(&self, method: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(method.to_string(), message.to_string());
    }

    /// Text typed into the given element so far.
    #[must_use]
    pub fn typed_text(&self, element: &ElementRef) -> Option<String> {
        self.typed.lock().unwrap().get(&element.id).cloned()
    }

    /// Recorded calls, in order.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.call_history.lock().unwrap().clone()
    }

    /// Whether a call starting with `prefix` was recorded.
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.call_history
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.starts_with(prefix))
    }

    /// How many times `delete_session` was invoked.
    #[must_use]
    pub fn delete_session_count(&self) -> usize {
        self.delete_count.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) {
        self.call_history.lock().unwrap().push(call);
    }

    fn check_failure(&self, method: &str) -> PalparResult<()> {
        if let Some(message) = self.failures.lock().unwrap().get(method) {
            return Err(PalparError::session(message.clone()));
        }
        Ok(())
    }

    fn promote_due_reveals(&self) {
        let mut pending = self.pending.lock().unwrap();
        if pending.is_empty() {
            return;
        }
        let now = Instant::now();
        let mut elements = self.elements.lock().unwrap();
        pending.retain(|(ready_at, locator, element)| {
            if *ready_at <= now {
                elements
                    .entry(locator.clone())
                    .or_default()
                    .push(element.clone());
                false
            } else {
                true
            }
        });
    }

    fn check_session(&self, session: &str) -> PalparResult<()> {
        match self.active_session.lock().unwrap().as_deref() {
            Some(active) if active == session => Ok(()),
            Some(_) | None => Err(PalparError::session(format!(
                "no active session matching {session}"
            ))),
        }
    }
}

#[async_trait]
impl MobileDriver for MockDriver {
    async fn status(&self) -> PalparResult<ServerStatus> {
        self.check_failure("status")?;
        Ok(ServerStatus {
            ready: true,
            message: "mock ready".to_string(),
        })
    }

    async fn create_session(&self, capabilities: &Capabilities) -> PalparResult<String> {
        self.check_failure("create_session")?;
        let id = Uuid::new_v4().to_string();
        self.record(format!(
            "create_session:{}:{}",
            capabilities.platform_name, id
        ));
        *self.active_session.lock().unwrap() = Some(id.clone());
        Ok(id)
    }

    async fn find_element(
        &self,
        session: &str,
        locator: &Locator,
    ) -> PalparResult<Option<ElementRef>> {
        self.check_failure("find_element")?;
        self.check_session(session)?;
        self.promote_due_reveals();
        self.record(format!("find_element:{locator}"));
        Ok(self
            .elements
            .lock()
            .unwrap()
            .get(locator)
            .and_then(|found| found.first().cloned()))
    }

    async fn find_elements(
        &self,
        session: &str,
        locator: &Locator,
    ) -> PalparResult<Vec<ElementRef>> {
        self.check_failure("find_elements")?;
        self.check_session(session)?;
        self.promote_due_reveals();
        self.record(format!("find_elements:{locator}"));
        Ok(self
            .elements
            .lock()
            .unwrap()
            .get(locator)
            .cloned()
            .unwrap_or_default())
    }

    async fn clear_element(&self, session: &str, element: &ElementRef) -> PalparResult<()> {
        self.check_failure("clear_element")?;
        self.check_session(session)?;
        self.record(format!("clear_element:{}", element.id));
        self.typed.lock().unwrap().remove(&element.id);
        Ok(())
    }

    async fn send_keys(
        &self,
        session: &str,
        element: &ElementRef,
        text: &str,
    ) -> PalparResult<()> {
        self.check_failure("send_keys")?;
        self.check_session(session)?;
        self.record(format!("send_keys:{}:{text}", element.id));
        self.typed
            .lock()
            .unwrap()
            .entry(element.id.clone())
            .or_default()
            .push_str(text);
        Ok(())
    }

    async fn click(&self, session: &str, element: &ElementRef) -> PalparResult<()> {
        self.check_failure("click")?;
        self.check_session(session)?;
        self.record(format!("click:{}", element.id));
        if let Some(revealed) = self.reveals.lock().unwrap().remove(&element.id) {
            let latency = *self.transition_latency.lock().unwrap();
            if let Some(latency) = latency {
                let ready_at = Instant::now() + latency;
                let mut pending = self.pending.lock().unwrap();
                for (locator, elem) in revealed {
                    pending.push((ready_at, locator, elem));
                }
            } else {
                let mut elements = self.elements.lock().unwrap();
                for (locator, elem) in revealed {
                    elements.entry(locator).or_default().push(elem);
                }
            }
        }
        Ok(())
    }

    async fn page_source(&self, session: &str) -> PalparResult<String> {
        self.check_failure("page_source")?;
        self.check_session(session)?;
        self.record("page_source".to_string());
        let elements = self.elements.lock().unwrap();
        let mut source = String::from("<hierarchy>");
        for (locator, found) in elements.iter() {
            for elem in found {
                source.push_str(&format!("<node locator=\"{locator}\" id=\"{}\"/>", elem.id));
            }
        }
        source.push_str("</hierarchy>");
        Ok(source)
    }

    async fn delete_session(&self, session: &str) -> PalparResult<()> {
        self.check_failure("delete_session")?;
        self.delete_count.fetch_add(1, Ordering::SeqCst);
        self.record(format!("delete_session:{session}"));
        *self.active_session.lock().unwrap() = None;
        Ok(())
    }
}
