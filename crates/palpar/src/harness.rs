//! Lifecycle orchestration: config, server, session, app-load wait, teardown.
//!
//! The harness hands each scenario a ready [`Session`] and takes it back
//! afterwards; scenarios never own setup or teardown. Teardown runs exactly
//! once per scenario execution regardless of which step failed: the session
//! handle is consumed on the single teardown path.

use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::client::AppiumClient;
use crate::config::HarnessConfig;
use crate::driver::MobileDriver;
use crate::reporter::ScenarioReport;
use crate::result::PalparResult;
use crate::scenario::Scenario;
use crate::server::AppiumServer;
use crate::session::Session;

/// Owns the automation server handle and drives scenario execution.
pub struct Harness {
    config: HarnessConfig,
    driver: Arc<dyn MobileDriver>,
    server: Option<AppiumServer>,
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("config", &self.config)
            .field("server_started", &self.server.is_some())
            .finish_non_exhaustive()
    }
}

impl Harness {
    /// Create a harness talking HTTP to the configured endpoint.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be constructed.
    pub fn new(config: HarnessConfig) -> PalparResult<Self> {
        let driver: Arc<dyn MobileDriver> = Arc::new(AppiumClient::new(&config.endpoint)?);
        Ok(Self {
            config,
            driver,
            server: None,
        })
    }

    /// Create a harness with an injected driver (used by tests).
    #[must_use]
    pub fn with_driver(config: HarnessConfig, driver: Arc<dyn MobileDriver>) -> Self {
        Self {
            config,
            driver,
            server: None,
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Ensure the automation server is running and reachable.
    ///
    /// Idempotent; later calls reuse the handle from the first.
    pub async fn start_server(&mut self) -> PalparResult<()> {
        if self.server.is_none() {
            let server = AppiumServer::ensure_running(
                &self.config.endpoint,
                self.config.server.as_ref(),
                &self.driver,
            )
            .await?;
            self.server = Some(server);
        }
        Ok(())
    }

    /// Create a session bound to the configured application.
    async fn initialize_session(&self) -> PalparResult<Session> {
        Session::create(
            Arc::clone(&self.driver),
            &self.config.capabilities,
            self.config.implicit_wait(),
        )
        .await
    }

    /// Block until the app's initial screen is interactable.
    ///
    /// With no configured app-ready markers this is a no-op; the implicit
    /// wait on the first element lookup covers slow launches.
    async fn wait_for_app_to_load(&self, session: &Session) -> PalparResult<()> {
        if let Some(chain) = self.config.app_ready_chain() {
            info!(markers = %chain, "waiting for app to load");
            session
                .wait_for_any(&chain, self.config.app_load_wait())
                .await?;
        }
        Ok(())
    }

    /// Run one scenario end to end and report the outcome.
    ///
    /// Setup failures are reported with the infrastructure category. Once a
    /// session exists, it is torn down on every path, exactly once.
    pub async fn run_scenario(&mut self, scenario: &dyn Scenario) -> ScenarioReport {
        let start = Instant::now();
        let name = scenario.name().to_string();
        info!(scenario = %name, "starting scenario");

        if let Err(e) = self.start_server().await {
            return ScenarioReport::failed(name, start.elapsed(), &e);
        }

        let session = match self.initialize_session().await {
            Ok(session) => session,
            Err(e) => return ScenarioReport::failed(name, start.elapsed(), &e),
        };

        let outcome = self.load_and_run(scenario, &session).await;
        let teardown = session.end().await;

        match (outcome, teardown) {
            (Ok(()), Ok(())) => ScenarioReport::passed(name, start.elapsed()),
            (Ok(()), Err(teardown_err)) => {
                ScenarioReport::failed(name, start.elapsed(), &teardown_err)
            }
            (Err(scenario_err), teardown) => {
                if let Err(teardown_err) = teardown {
                    // The scenario failure stays the reported cause
                    warn!(error = %teardown_err, "teardown also failed");
                }
                ScenarioReport::failed(name, start.elapsed(), &scenario_err)
            }
        }
    }

    async fn load_and_run(
        &self,
        scenario: &dyn Scenario,
        session: &Session,
    ) -> PalparResult<()> {
        self.wait_for_app_to_load(session).await?;
        scenario.run(session).await
    }

    /// Stop a harness-managed server, if one was launched.
    pub async fn shutdown(&mut self) -> PalparResult<()> {
        if let Some(mut server) = self.server.take() {
            server.shutdown().await?;
        }
        Ok(())
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        if self.server.as_ref().is_some_and(AppiumServer::is_managed) {
            // kill_on_drop on the child covers the process; this is only a
            // breadcrumb for runs that skipped shutdown()
            warn!("harness dropped without shutdown(); managed server killed on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Capabilities;
    use crate::driver::MockDriver;
    use crate::locator::Locator;
    use crate::result::{FailureCategory, PalparError};
    use crate::session::Session;

    use async_trait::async_trait;

    struct NoopScenario;

    #[async_trait]
    impl Scenario for NoopScenario {
        fn name(&self) -> &str {
            "noop"
        }

        async fn run(&self, _session: &Session) -> PalparResult<()> {
            Ok(())
        }
    }

    struct FailingScenario;

    #[async_trait]
    impl Scenario for FailingScenario {
        fn name(&self) -> &str {
            "failing"
        }

        async fn run(&self, _session: &Session) -> PalparResult<()> {
            Err(PalparError::assertion("postcondition false"))
        }
    }

    fn test_config() -> HarnessConfig {
        HarnessConfig::new()
            .with_capabilities(Capabilities::android("emulator-5554", "com.swaglabsmobileapp"))
            .with_implicit_wait_ms(50)
    }

    #[tokio::test]
    async fn test_passing_scenario_tears_down_once() {
        let driver = Arc::new(MockDriver::new());
        let mut harness = Harness::with_driver(test_config(), driver.clone());

        let report = harness.run_scenario(&NoopScenario).await;
        assert!(report.is_passed());
        assert_eq!(driver.delete_session_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_scenario_tears_down_once() {
        let driver = Arc::new(MockDriver::new());
        let mut harness = Harness::with_driver(test_config(), driver.clone());

        let report = harness.run_scenario(&FailingScenario).await;
        assert_eq!(report.category, Some(FailureCategory::Assertion));
        assert_eq!(driver.delete_session_count(), 1);
    }

    #[tokio::test]
    async fn test_session_creation_failure_is_infrastructure() {
        let mock = MockDriver::new();
        mock.fail_on("create_session", "device offline");
        let driver = Arc::new(mock);
        let mut harness = Harness::with_driver(test_config(), driver.clone());

        let report = harness.run_scenario(&NoopScenario).await;
        assert!(report.is_infrastructure_failure());
        // No session was created, so nothing to tear down
        assert_eq!(driver.delete_session_count(), 0);
    }

    #[tokio::test]
    async fn test_app_load_timeout_still_tears_down() {
        let driver = Arc::new(MockDriver::new());
        let config = test_config()
            .with_app_load_timeout_ms(50)
            .with_app_ready_marker(Locator::accessibility_id("test-Username"));
        let mut harness = Harness::with_driver(config, driver.clone());

        let report = harness.run_scenario(&NoopScenario).await;
        assert!(report.is_infrastructure_failure());
        assert_eq!(driver.delete_session_count(), 1);
    }

    #[tokio::test]
    async fn test_app_ready_marker_present() {
        let driver = Arc::new(MockDriver::new());
        driver.add_element(Locator::accessibility_id("test-Username"));
        let config = test_config().with_app_ready_marker(Locator::accessibility_id("test-Username"));
        let mut harness = Harness::with_driver(config, driver.clone());

        let report = harness.run_scenario(&NoopScenario).await;
        assert!(report.is_passed());
    }

    #[tokio::test]
    async fn test_start_server_is_idempotent() {
        let driver = Arc::new(MockDriver::new());
        let mut harness = Harness::with_driver(test_config(), driver.clone());
        harness.start_server().await.unwrap();
        harness.start_server().await.unwrap();
        harness.shutdown().await.unwrap();
    }
}
