//! Automation server process lifecycle.
//!
//! The harness can either point at an already-running server or launch one
//! itself. A launched process is killed on drop so a panicking test run does
//! not leak servers.

use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::config::ServerEndpoint;
use crate::driver::MobileDriver;
use crate::result::{PalparError, PalparResult};
use crate::wait::{poll_until, WaitOptions};

/// Default time allowed for a launched server to become ready (30 seconds)
pub const DEFAULT_STARTUP_TIMEOUT_MS: u64 = 30_000;

/// Launch settings for a harness-managed server process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Executable to launch
    pub command: String,
    /// Arguments passed to the executable
    #[serde(default)]
    pub args: Vec<String>,
    /// How long to poll `/status` before giving up
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,
}

fn default_startup_timeout_ms() -> u64 {
    DEFAULT_STARTUP_TIMEOUT_MS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: "appium".to_string(),
            args: Vec::new(),
            startup_timeout_ms: DEFAULT_STARTUP_TIMEOUT_MS,
        }
    }
}

impl ServerConfig {
    /// Launch settings for a plain `appium` invocation on the given endpoint.
    #[must_use]
    pub fn appium(endpoint: &ServerEndpoint) -> Self {
        let mut args = vec![
            "--address".to_string(),
            endpoint.host.clone(),
            "--port".to_string(),
            endpoint.port.to_string(),
        ];
        if !endpoint.base_path.is_empty() {
            args.push("--base-path".to_string());
            args.push(endpoint.base_path.clone());
        }
        Self {
            command: "appium".to_string(),
            args,
            startup_timeout_ms: DEFAULT_STARTUP_TIMEOUT_MS,
        }
    }

    /// Set the startup timeout in milliseconds.
    #[must_use]
    pub const fn with_startup_timeout_ms(mut self, ms: u64) -> Self {
        self.startup_timeout_ms = ms;
        self
    }
}

/// A reachable automation server, possibly owned as a child process.
pub struct AppiumServer {
    child: Option<Child>,
    endpoint: ServerEndpoint,
}

impl std::fmt::Debug for AppiumServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppiumServer")
            .field("managed", &self.child.is_some())
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl AppiumServer {
    /// Ensure a server is running and reachable at `endpoint`.
    ///
    /// An already-reachable server is reused untouched. Otherwise, if
    /// `config` is given, the process is launched and polled until its
    /// `/status` reports ready; with no `config`, an unreachable endpoint is
    /// an error.
    pub async fn ensure_running(
        endpoint: &ServerEndpoint,
        config: Option<&ServerConfig>,
        driver: &Arc<dyn MobileDriver>,
    ) -> PalparResult<Self> {
        if matches!(driver.status().await, Ok(status) if status.ready) {
            info!(endpoint = %endpoint.url(), "reusing running automation server");
            return Ok(Self {
                child: None,
                endpoint: endpoint.clone(),
            });
        }

        let Some(config) = config else {
            return Err(PalparError::ServerUnreachable {
                endpoint: endpoint.url(),
                message: "server not reachable and no launch command configured".to_string(),
            });
        };

        info!(command = %config.command, "launching automation server");
        let child = Command::new(&config.command)
            .args(&config.args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PalparError::ServerLaunch {
                message: format!("cannot spawn {}: {e}", config.command),
            })?;

        let wait = WaitOptions::new().with_timeout(config.startup_timeout_ms);
        let ready = poll_until(wait, || async {
            match driver.status().await {
                Ok(status) if status.ready => Ok(Some(())),
                // Not up yet; keep polling until the startup budget elapses
                Ok(_) | Err(_) => Ok(None),
            }
        })
        .await?;

        if ready.is_none() {
            return Err(PalparError::ServerUnreachable {
                endpoint: endpoint.url(),
                message: format!(
                    "server did not become ready within {}ms",
                    config.startup_timeout_ms
                ),
            });
        }

        debug!(endpoint = %endpoint.url(), "automation server ready");
        Ok(Self {
            child: Some(child),
            endpoint: endpoint.clone(),
        })
    }

    /// Whether this handle owns the server process.
    #[must_use]
    pub const fn is_managed(&self) -> bool {
        self.child.is_some()
    }

    /// The endpoint this server listens on.
    #[must_use]
    pub const fn endpoint(&self) -> &ServerEndpoint {
        &self.endpoint
    }

    /// Terminate a managed server process. No-op for external servers.
    pub async fn shutdown(&mut self) -> PalparResult<()> {
        if let Some(mut child) = self.child.take() {
            info!("stopping managed automation server");
            if let Err(e) = child.kill().await {
                warn!(error = %e, "failed to kill automation server");
                return Err(PalparError::ServerLaunch {
                    message: format!("failed to stop server: {e}"),
                });
            }
            let _ = child.wait().await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;

    #[test]
    fn test_appium_config_args() {
        let endpoint = ServerEndpoint::new("127.0.0.1", 4723).with_base_path("/wd/hub");
        let config = ServerConfig::appium(&endpoint);
        assert_eq!(config.command, "appium");
        assert_eq!(
            config.args,
            vec!["--address", "127.0.0.1", "--port", "4723", "--base-path", "/wd/hub"]
        );
    }

    #[test]
    fn test_appium_config_no_base_path() {
        let config = ServerConfig::appium(&ServerEndpoint::default());
        assert!(!config.args.contains(&"--base-path".to_string()));
    }

    #[tokio::test]
    async fn test_reuses_reachable_server() {
        let driver: Arc<dyn MobileDriver> = Arc::new(MockDriver::new());
        let server = AppiumServer::ensure_running(&ServerEndpoint::default(), None, &driver)
            .await
            .unwrap();
        assert!(!server.is_managed());
    }

    #[tokio::test]
    async fn test_unreachable_without_launch_config() {
        let mock = MockDriver::new();
        mock.fail_on("status", "connection refused");
        let driver: Arc<dyn MobileDriver> = Arc::new(mock);

        let err = AppiumServer::ensure_running(&ServerEndpoint::default(), None, &driver)
            .await
            .unwrap_err();
        assert!(matches!(err, PalparError::ServerUnreachable { .. }));
    }

    #[tokio::test]
    async fn test_shutdown_external_server_is_noop() {
        let driver: Arc<dyn MobileDriver> = Arc::new(MockDriver::new());
        let mut server = AppiumServer::ensure_running(&ServerEndpoint::default(), None, &driver)
            .await
            .unwrap();
        server.shutdown().await.unwrap();
    }
}
