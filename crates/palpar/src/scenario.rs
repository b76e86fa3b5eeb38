//! Test scenarios: linear UI interaction flows with a boolean postcondition.
//!
//! A scenario borrows a ready [`Session`] and returns a plain result; it owns
//! no lifecycle. Setup and teardown belong to [`crate::harness::Harness`].

use async_trait::async_trait;
use tracing::info;

use crate::locator::{FallbackChain, Locator};
use crate::result::{PalparError, PalparResult};
use crate::session::Session;

/// A runnable UI test scenario.
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Scenario name for reporting.
    fn name(&self) -> &str;

    /// Execute the scenario against an active session.
    ///
    /// # Errors
    ///
    /// Any error terminates the scenario immediately; there is no retry or
    /// partial-failure recovery.
    async fn run(&self, session: &Session) -> PalparResult<()>;
}

/// Accessibility id of the username input field.
pub const USERNAME_FIELD: &str = "test-Username";
/// Accessibility id of the password input field.
pub const PASSWORD_FIELD: &str = "test-Password";
/// Accessibility id of the login button.
pub const LOGIN_BUTTON: &str = "test-LOGIN";
/// Cross-platform accessibility id marking the inventory screen.
pub const PRODUCTS_MARKER: &str = "test-Products";
/// Android resource id marking the inventory list.
pub const PRODUCT_LIST_RESOURCE_ID: &str = "com.swaglabsmobileapp:id/product_list";

/// Fixed message reported when the login postcondition is false.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed or inventory screen not found";

/// Login flow against the SwagLabs demo application.
///
/// Enters credentials, taps LOGIN, and verifies the inventory screen via an
/// ordered pair of success markers: the cross-platform accessibility id
/// first, the Android resource id as the fallback. The marker check polls up
/// to the session's implicit wait, so a slow post-login transition is not
/// reported as a rejected login.
#[derive(Debug, Clone)]
pub struct LoginScenario {
    /// Username to enter
    pub username: String,
    /// Password to enter
    pub password: String,
}

impl Default for LoginScenario {
    fn default() -> Self {
        Self::new("standard_user", "secret_sauce")
    }
}

impl LoginScenario {
    /// Create a login scenario with the given credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The post-login success markers, in evaluation order.
    #[must_use]
    pub fn success_markers() -> FallbackChain {
        FallbackChain::first(Locator::accessibility_id(PRODUCTS_MARKER))
            .or(Locator::id(PRODUCT_LIST_RESOURCE_ID))
    }
}

#[async_trait]
impl Scenario for LoginScenario {
    fn name(&self) -> &str {
        "swaglabs_login"
    }

    async fn run(&self, session: &Session) -> PalparResult<()> {
        info!(username = %self.username, "entering credentials");
        session
            .type_text(&Locator::accessibility_id(USERNAME_FIELD), &self.username)
            .await?;
        session
            .type_text(&Locator::accessibility_id(PASSWORD_FIELD), &self.password)
            .await?;

        info!("tapping login");
        session.tap(&Locator::accessibility_id(LOGIN_BUTTON)).await?;

        let logged_in = session.any_appears(&Self::success_markers()).await?;
        if logged_in {
            Ok(())
        } else {
            Err(PalparError::assertion(LOGIN_FAILED_MESSAGE))
        }
    }
}
