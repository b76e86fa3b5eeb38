//! Run configuration: server endpoint, session capabilities, wait policy.
//!
//! The implicit wait (how long element lookups poll before declaring
//! [`crate::PalparError::ElementNotFound`]) is an explicit, configurable value
//! rather than a hidden client default. Config can be built in code, loaded
//! from a JSON file, or overridden from the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::locator::{FallbackChain, Locator};
use crate::result::{PalparError, PalparResult};
use crate::server::ServerConfig;
use crate::wait::{WaitOptions, DEFAULT_APP_LOAD_TIMEOUT_MS, DEFAULT_IMPLICIT_WAIT_MS};

/// Environment variable overriding the server host.
pub const ENV_HOST: &str = "APPIUM_HOST";
/// Environment variable overriding the server port.
pub const ENV_PORT: &str = "APPIUM_PORT";
/// Environment variable overriding the server base path.
pub const ENV_BASE_PATH: &str = "APPIUM_BASE_PATH";

/// Where the automation server listens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEndpoint {
    /// Host name or address
    pub host: String,
    /// TCP port
    pub port: u16,
    /// URL prefix (old Appium setups use "/wd/hub", modern ones "")
    pub base_path: String,
}

impl Default for ServerEndpoint {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4723,
            base_path: String::new(),
        }
    }
}

impl ServerEndpoint {
    /// Create an endpoint for the given host and port with no base path.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            base_path: String::new(),
        }
    }

    /// Set the URL prefix.
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Apply `APPIUM_HOST`/`APPIUM_PORT`/`APPIUM_BASE_PATH` overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = std::env::var(ENV_PORT)
            .ok()
            .and_then(|p| p.parse().ok())
        {
            self.port = port;
        }
        if let Ok(base_path) = std::env::var(ENV_BASE_PATH) {
            self.base_path = base_path;
        }
        self
    }

    /// Full base URL, without a trailing slash.
    #[must_use]
    pub fn url(&self) -> String {
        let base = self.base_path.trim_end_matches('/');
        format!("http://{}:{}{}", self.host, self.port, base)
    }
}

/// Session capabilities for the target device and application.
///
/// Serialises to a W3C `alwaysMatch` object with vendor keys under the
/// `appium:` prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Platform name ("Android" or "iOS")
    pub platform_name: String,
    /// Automation backend ("UiAutomator2", "XCUITest", ...)
    pub automation_name: String,
    /// Device name or identifier
    pub device_name: String,
    /// Path or URL of the app package to install
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    /// Android application package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_package: Option<String>,
    /// Android activity to launch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_activity: Option<String>,
    /// iOS bundle identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    /// Keep app state between sessions
    #[serde(default)]
    pub no_reset: bool,
    /// Seconds the server keeps an idle session alive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_command_timeout_secs: Option<u64>,
}

impl Capabilities {
    /// Capabilities for an Android device running the given app package.
    #[must_use]
    pub fn android(device_name: impl Into<String>, app_package: impl Into<String>) -> Self {
        Self {
            platform_name: "Android".to_string(),
            automation_name: "UiAutomator2".to_string(),
            device_name: device_name.into(),
            app_package: Some(app_package.into()),
            ..Self::default()
        }
    }

    /// Capabilities for an iOS device running the given bundle.
    #[must_use]
    pub fn ios(device_name: impl Into<String>, bundle_id: impl Into<String>) -> Self {
        Self {
            platform_name: "iOS".to_string(),
            automation_name: "XCUITest".to_string(),
            device_name: device_name.into(),
            bundle_id: Some(bundle_id.into()),
            ..Self::default()
        }
    }

    /// Set the app package path or URL.
    #[must_use]
    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Set the Android launch activity.
    #[must_use]
    pub fn with_app_activity(mut self, activity: impl Into<String>) -> Self {
        self.app_activity = Some(activity.into());
        self
    }

    /// Keep app state between sessions.
    #[must_use]
    pub const fn with_no_reset(mut self, no_reset: bool) -> Self {
        self.no_reset = no_reset;
        self
    }

    /// Resolve to the W3C `alwaysMatch` object.
    #[must_use]
    pub fn to_always_match(&self) -> serde_json::Value {
        let mut caps = serde_json::Map::new();
        caps.insert(
            "platformName".to_string(),
            serde_json::Value::from(self.platform_name.clone()),
        );
        let mut vendor = |key: &str, value: serde_json::Value| {
            caps.insert(format!("appium:{key}"), value);
        };
        vendor(
            "automationName",
            serde_json::Value::from(self.automation_name.clone()),
        );
        vendor(
            "deviceName",
            serde_json::Value::from(self.device_name.clone()),
        );
        if let Some(app) = &self.app {
            vendor("app", serde_json::Value::from(app.clone()));
        }
        if let Some(pkg) = &self.app_package {
            vendor("appPackage", serde_json::Value::from(pkg.clone()));
        }
        if let Some(activity) = &self.app_activity {
            vendor("appActivity", serde_json::Value::from(activity.clone()));
        }
        if let Some(bundle) = &self.bundle_id {
            vendor("bundleId", serde_json::Value::from(bundle.clone()));
        }
        if self.no_reset {
            vendor("noReset", serde_json::Value::from(true));
        }
        if let Some(secs) = self.new_command_timeout_secs {
            vendor("newCommandTimeout", serde_json::Value::from(secs));
        }
        serde_json::Value::Object(caps)
    }
}

/// Complete harness configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Automation server endpoint
    #[serde(default)]
    pub endpoint: ServerEndpoint,
    /// Target device and app
    #[serde(default)]
    pub capabilities: Capabilities,
    /// How long element lookups poll before failing
    #[serde(default = "default_implicit_wait_ms")]
    pub implicit_wait_ms: u64,
    /// How long to wait for the app's initial screen
    #[serde(default = "default_app_load_timeout_ms")]
    pub app_load_timeout_ms: u64,
    /// Markers whose presence means the initial screen is interactable
    #[serde(default)]
    pub app_ready_markers: Vec<Locator>,
    /// Launch settings for a harness-managed server process, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,
}

fn default_implicit_wait_ms() -> u64 {
    DEFAULT_IMPLICIT_WAIT_MS
}

fn default_app_load_timeout_ms() -> u64 {
    DEFAULT_APP_LOAD_TIMEOUT_MS
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            endpoint: ServerEndpoint::default(),
            capabilities: Capabilities::default(),
            implicit_wait_ms: DEFAULT_IMPLICIT_WAIT_MS,
            app_load_timeout_ms: DEFAULT_APP_LOAD_TIMEOUT_MS,
            app_ready_markers: Vec::new(),
            server: None,
        }
    }
}

impl HarnessConfig {
    /// Create a config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file.
    ///
    /// `APPIUM_HOST`, `APPIUM_PORT`, and `APPIUM_BASE_PATH` layer over the
    /// file's endpoint, so one config file serves local and CI runs.
    pub fn from_file(path: impl AsRef<Path>) -> PalparResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| PalparError::Config {
            message: format!("cannot read {}: {e}", path.display()),
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| PalparError::Config {
            message: format!("cannot parse {}: {e}", path.display()),
        })?;
        Ok(config.with_endpoint_env_overrides())
    }

    /// Apply the `APPIUM_*` endpoint overrides to this config.
    #[must_use]
    pub fn with_endpoint_env_overrides(mut self) -> Self {
        self.endpoint = self.endpoint.with_env_overrides();
        self
    }

    /// Set the server endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: ServerEndpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Set the session capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the implicit element wait in milliseconds.
    #[must_use]
    pub const fn with_implicit_wait_ms(mut self, ms: u64) -> Self {
        self.implicit_wait_ms = ms;
        self
    }

    /// Set the app-load wait in milliseconds.
    #[must_use]
    pub const fn with_app_load_timeout_ms(mut self, ms: u64) -> Self {
        self.app_load_timeout_ms = ms;
        self
    }

    /// Add a marker whose presence means the initial screen is ready.
    #[must_use]
    pub fn with_app_ready_marker(mut self, locator: Locator) -> Self {
        self.app_ready_markers.push(locator);
        self
    }

    /// Let the harness launch and own the server process.
    #[must_use]
    pub fn with_managed_server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Wait options for element lookups.
    #[must_use]
    pub fn implicit_wait(&self) -> WaitOptions {
        WaitOptions::new().with_timeout(self.implicit_wait_ms)
    }

    /// Wait options for the app-load wait.
    #[must_use]
    pub fn app_load_wait(&self) -> WaitOptions {
        WaitOptions::new().with_timeout(self.app_load_timeout_ms)
    }

    /// The app-ready markers as a fallback chain, if any were configured.
    #[must_use]
    pub fn app_ready_chain(&self) -> Option<FallbackChain> {
        let mut markers = self.app_ready_markers.iter().cloned();
        let first = markers.next()?;
        Some(markers.fold(FallbackChain::first(first), FallbackChain::or))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    mod endpoint_tests {
        use super::*;

        #[test]
        fn test_default_endpoint() {
            let endpoint = ServerEndpoint::default();
            assert_eq!(endpoint.url(), "http://127.0.0.1:4723");
        }

        #[test]
        fn test_base_path_join() {
            let endpoint = ServerEndpoint::new("localhost", 4444).with_base_path("/wd/hub");
            assert_eq!(endpoint.url(), "http://localhost:4444/wd/hub");
        }

        #[test]
        fn test_base_path_trailing_slash_stripped() {
            let endpoint = ServerEndpoint::default().with_base_path("/wd/hub/");
            assert_eq!(endpoint.url(), "http://127.0.0.1:4723/wd/hub");
        }
    }

    mod capabilities_tests {
        use super::*;

        #[test]
        fn test_android_always_match() {
            let caps = Capabilities::android("emulator-5554", "com.swaglabsmobileapp")
                .with_app_activity(".MainActivity")
                .with_no_reset(true);
            let json = caps.to_always_match();
            assert_eq!(json["platformName"], "Android");
            assert_eq!(json["appium:automationName"], "UiAutomator2");
            assert_eq!(json["appium:deviceName"], "emulator-5554");
            assert_eq!(json["appium:appPackage"], "com.swaglabsmobileapp");
            assert_eq!(json["appium:appActivity"], ".MainActivity");
            assert_eq!(json["appium:noReset"], true);
        }

        #[test]
        fn test_ios_always_match() {
            let caps = Capabilities::ios("iPhone 14", "com.saucelabs.SwagLabsMobileApp");
            let json = caps.to_always_match();
            assert_eq!(json["platformName"], "iOS");
            assert_eq!(json["appium:automationName"], "XCUITest");
            assert_eq!(
                json["appium:bundleId"],
                "com.saucelabs.SwagLabsMobileApp"
            );
        }

        #[test]
        fn test_unset_fields_omitted() {
            let json = Capabilities::android("dev", "pkg").to_always_match();
            assert!(json.get("appium:app").is_none());
            assert!(json.get("appium:bundleId").is_none());
            assert!(json.get("appium:noReset").is_none());
        }
    }

    mod harness_config_tests {
        use super::*;
        use serial_test::serial;

        #[test]
        fn test_defaults() {
            let config = HarnessConfig::default();
            assert_eq!(config.implicit_wait_ms, DEFAULT_IMPLICIT_WAIT_MS);
            assert_eq!(config.app_load_timeout_ms, DEFAULT_APP_LOAD_TIMEOUT_MS);
            assert!(config.server.is_none());
            assert!(config.app_ready_chain().is_none());
        }

        #[test]
        fn test_builder() {
            let config = HarnessConfig::new()
                .with_implicit_wait_ms(2_000)
                .with_app_ready_marker(Locator::accessibility_id("test-Username"))
                .with_app_ready_marker(Locator::id("com.swaglabsmobileapp:id/username"));
            assert_eq!(config.implicit_wait().timeout_ms, 2_000);
            let chain = config.app_ready_chain().unwrap();
            assert_eq!(chain.len(), 2);
        }

        #[test]
        #[serial]
        fn test_from_file() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            write!(
                file,
                r#"{{
                    "endpoint": {{"host": "10.0.0.5", "port": 4725, "base_path": "/wd/hub"}},
                    "capabilities": {{
                        "platform_name": "Android",
                        "automation_name": "UiAutomator2",
                        "device_name": "emulator-5554",
                        "app_package": "com.swaglabsmobileapp"
                    }},
                    "implicit_wait_ms": 5000
                }}"#
            )
            .unwrap();

            let config = HarnessConfig::from_file(file.path()).unwrap();
            assert_eq!(config.endpoint.url(), "http://10.0.0.5:4725/wd/hub");
            assert_eq!(config.implicit_wait_ms, 5_000);
            // Unspecified fields fall back to defaults
            assert_eq!(config.app_load_timeout_ms, DEFAULT_APP_LOAD_TIMEOUT_MS);
        }

        #[test]
        #[serial]
        fn test_from_file_layers_env_overrides() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            write!(
                file,
                r#"{{"endpoint": {{"host": "10.0.0.5", "port": 4725, "base_path": ""}}}}"#
            )
            .unwrap();

            std::env::set_var(ENV_HOST, "192.168.1.9");
            std::env::set_var(ENV_PORT, "4900");
            std::env::set_var(ENV_BASE_PATH, "/wd/hub");
            let config = HarnessConfig::from_file(file.path());
            std::env::remove_var(ENV_HOST);
            std::env::remove_var(ENV_PORT);
            std::env::remove_var(ENV_BASE_PATH);

            let config = config.unwrap();
            assert_eq!(config.endpoint.url(), "http://192.168.1.9:4900/wd/hub");
        }

        #[test]
        fn test_from_file_missing() {
            let err = HarnessConfig::from_file("/nonexistent/palpar.json").unwrap_err();
            assert!(matches!(err, PalparError::Config { .. }));
        }
    }
}
