//! WebDriver wire protocol types (Appium dialect).
//!
//! Serde types for the subset of the W3C WebDriver protocol the driver
//! operation set needs: session creation, element lookup (single and all),
//! element interaction, status, and session deletion. The exact wire format
//! stays inside this module and [`crate::client`]; the rest of the crate
//! depends only on the driver trait.

use serde::{Deserialize, Serialize};

use crate::locator::Locator;

/// W3C element identifier key in find-element responses.
pub const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// WebDriver error code for a lookup that matched nothing. Existence
/// queries treat it as an empty result rather than a failure.
pub const NO_SUCH_ELEMENT: &str = "no such element";

/// Envelope wrapping every WebDriver response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireResponse<T> {
    /// The payload
    pub value: T,
}

/// Error payload returned with non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireError {
    /// WebDriver error code (e.g. "no such element")
    pub error: String,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
    /// Remote stacktrace, ignored except for debugging
    #[serde(default)]
    pub stacktrace: String,
}

/// Opaque handle to an element, valid only within its session.
///
/// Accepts both the W3C element key and the legacy JSONWP `ELEMENT` key that
/// older mobile drivers still emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
    /// Server-assigned element id
    #[serde(
        rename = "element-6066-11e4-a52e-4f735466cecf",
        alias = "ELEMENT"
    )]
    pub id: String,
}

impl ElementRef {
    /// Create an element reference from a raw id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Body of a find-element(s) request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindParams {
    /// Location strategy wire name
    pub using: String,
    /// Selector string
    pub value: String,
}

impl From<&Locator> for FindParams {
    fn from(locator: &Locator) -> Self {
        Self {
            using: locator.strategy.as_wire_str().to_string(),
            value: locator.value.clone(),
        }
    }
}

/// Body of an element send-keys request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendKeysParams {
    /// Text to type into the element
    pub text: String,
}

/// Body of a new-session request (W3C capabilities shape).
#[derive(Debug, Clone, Serialize)]
pub struct NewSessionParams {
    /// W3C capabilities object
    pub capabilities: W3cCapabilities,
}

/// The `capabilities` object of a new-session request.
#[derive(Debug, Clone, Serialize)]
pub struct W3cCapabilities {
    /// Capabilities every returned session must satisfy
    #[serde(rename = "alwaysMatch")]
    pub always_match: serde_json::Value,
    /// Alternate capability sets (unused; always a single empty entry)
    #[serde(rename = "firstMatch")]
    pub first_match: Vec<serde_json::Value>,
}

impl NewSessionParams {
    /// Wrap resolved capabilities in the W3C envelope.
    #[must_use]
    pub fn new(always_match: serde_json::Value) -> Self {
        Self {
            capabilities: W3cCapabilities {
                always_match,
                first_match: vec![serde_json::json!({})],
            },
        }
    }
}

/// Value of a successful new-session response.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionValue {
    /// Server-assigned session id
    #[serde(rename = "sessionId")]
    pub session_id: String,
    /// Capabilities the server actually granted
    #[serde(default)]
    pub capabilities: serde_json::Value,
}

/// Value of a `GET /status` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStatus {
    /// Whether the server can accept new sessions
    pub ready: bool,
    /// Optional human-readable state description
    #[serde(default)]
    pub message: String,
}
