//! HTTP client speaking the WebDriver wire protocol to an Appium server.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{Capabilities, ServerEndpoint};
use crate::driver::MobileDriver;
use crate::locator::Locator;
use crate::protocol::{
    ElementRef, FindParams, NewSessionParams, SendKeysParams, ServerStatus, SessionValue,
    WireError, WireResponse, NO_SUCH_ELEMENT,
};
use crate::result::{PalparError, PalparResult};

/// Default timeout for individual protocol commands (2 minutes; session
/// creation can install the app under test)
const COMMAND_TIMEOUT_SECS: u64 = 120;

/// WebDriver-over-HTTP implementation of [`MobileDriver`].
#[derive(Debug, Clone)]
pub struct AppiumClient {
    base_url: String,
    client: reqwest::Client,
}

impl AppiumClient {
    /// Create a client for the given endpoint.
    ///
    /// # Errors
    ///
    /// Fails if the underlying HTTP client cannot be constructed, in which
    /// case no command could succeed anyway.
    pub fn new(endpoint: &ServerEndpoint) -> PalparResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(COMMAND_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url: endpoint.url(),
            client,
        })
    }

    /// Create a client with a custom reqwest client (for custom timeouts, etc.).
    #[must_use]
    pub fn with_client(endpoint: &ServerEndpoint, client: reqwest::Client) -> Self {
        Self {
            base_url: endpoint.url(),
            client,
        }
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Turn a non-2xx response into a protocol error.
    async fn protocol_error(resp: reqwest::Response) -> PalparError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        match serde_json::from_str::<WireResponse<WireError>>(&body) {
            Ok(wire) => PalparError::Protocol {
                status,
                error: wire.value.error,
                message: wire.value.message,
            },
            Err(_) => PalparError::Protocol {
                status,
                error: "unknown error".to_string(),
                message: body,
            },
        }
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> PalparResult<T> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let resp = self.client.post(&url).json(body).send().await?;
        if !resp.status().is_success() {
            return Err(Self::protocol_error(resp).await);
        }
        let wire: WireResponse<T> = resp.json().await?;
        Ok(wire.value)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> PalparResult<T> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(Self::protocol_error(resp).await);
        }
        let wire: WireResponse<T> = resp.json().await?;
        Ok(wire.value)
    }
}

#[async_trait]
impl MobileDriver for AppiumClient {
    async fn status(&self) -> PalparResult<ServerStatus> {
        self.get("/status").await
    }

    async fn create_session(&self, capabilities: &Capabilities) -> PalparResult<String> {
        let params = NewSessionParams::new(capabilities.to_always_match());
        let value: SessionValue = self.post("/session", &params).await?;
        debug!(session = %value.session_id, "session created");
        Ok(value.session_id)
    }

    async fn find_element(
        &self,
        session: &str,
        locator: &Locator,
    ) -> PalparResult<Option<ElementRef>> {
        let params = FindParams::from(locator);
        let result: PalparResult<ElementRef> =
            self.post(&format!("/session/{session}/element"), &params).await;
        match result {
            Ok(element) => Ok(Some(element)),
            // A single-element lookup that matches nothing is not a fault;
            // the caller decides whether to keep waiting.
            Err(PalparError::Protocol { error, .. }) if error == NO_SUCH_ELEMENT => Ok(None),
            Err(other) => Err(other),
        }
    }

    async fn find_elements(
        &self,
        session: &str,
        locator: &Locator,
    ) -> PalparResult<Vec<ElementRef>> {
        let params = FindParams::from(locator);
        self.post(&format!("/session/{session}/elements"), &params)
            .await
    }

    async fn clear_element(&self, session: &str, element: &ElementRef) -> PalparResult<()> {
        let _: serde_json::Value = self
            .post(
                &format!("/session/{session}/element/{}/clear", element.id),
                &serde_json::json!({}),
            )
            .await?;
        Ok(())
    }

    async fn send_keys(
        &self,
        session: &str,
        element: &ElementRef,
        text: &str,
    ) -> PalparResult<()> {
        let params = SendKeysParams {
            text: text.to_string(),
        };
        let _: serde_json::Value = self
            .post(
                &format!("/session/{session}/element/{}/value", element.id),
                &params,
            )
            .await?;
        Ok(())
    }

    async fn click(&self, session: &str, element: &ElementRef) -> PalparResult<()> {
        let _: serde_json::Value = self
            .post(
                &format!("/session/{session}/element/{}/click", element.id),
                &serde_json::json!({}),
            )
            .await?;
        Ok(())
    }

    async fn page_source(&self, session: &str) -> PalparResult<String> {
        self.get(&format!("/session/{session}/source")).await
    }

    async fn delete_session(&self, session: &str) -> PalparResult<()> {
        let url = self.url(&format!("/session/{session}"));
        debug!(url = %url, "DELETE");
        let resp = self.client.delete(&url).send().await?;
        if !resp.status().is_success() {
            // The session is gone either way; report but do not mask a
            // scenario failure with a teardown failure.
            let err = Self::protocol_error(resp).await;
            warn!(error = %err, "delete_session returned an error");
            return Err(err);
        }
        Ok(())
    }
}
