//! Palpar: Rust-Native Mobile E2E Testing Client
//!
//! Palpar (Spanish: "to feel/touch") drives a mobile application under test
//! through an Appium-compatible automation server, speaking the W3C WebDriver
//! wire protocol over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    PALPAR Architecture                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario   │    │ Session /  │    │ Appium     │            │
//! │   │ (Rust)     │───►│ Harness    │───►│ Server     │───► device │
//! │   │            │    │            │    │ (HTTP)     │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Scenarios are plain values implementing [`Scenario`]: they borrow a ready
//! [`Session`] from the [`Harness`] and return a result. Lifecycle concerns
//! (configuration, server startup, session creation, app-load waiting,
//! teardown) live in the harness, which guarantees teardown runs exactly once
//! per scenario no matter which step failed.
//!
//! # Example
//!
//! ```ignore
//! use palpar::{Capabilities, Harness, HarnessConfig, Locator, LoginScenario};
//!
//! let config = HarnessConfig::new()
//!     .with_capabilities(Capabilities::android("emulator-5554", "com.swaglabsmobileapp"))
//!     .with_app_ready_marker(Locator::accessibility_id("test-Username"));
//!
//! let mut harness = Harness::new(config)?;
//! let report = harness.run_scenario(&LoginScenario::default()).await;
//! assert!(report.is_passed());
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod driver;
pub mod harness;
pub mod locator;
pub mod protocol;
pub mod reporter;
pub mod result;
pub mod scenario;
pub mod server;
pub mod session;
pub mod wait;

pub use client::AppiumClient;
pub use config::{Capabilities, HarnessConfig, ServerEndpoint};
pub use driver::{MobileDriver, MockDriver};
pub use harness::Harness;
pub use locator::{FallbackChain, Locator, Strategy};
pub use protocol::{ElementRef, ServerStatus};
pub use reporter::{Reporter, ScenarioReport, TestStatus};
pub use result::{FailureCategory, PalparError, PalparResult};
pub use scenario::{LoginScenario, Scenario};
pub use server::{AppiumServer, ServerConfig};
pub use session::Session;
pub use wait::WaitOptions;

/// Initialise a global tracing subscriber from `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
