//! Locator abstraction for element selection.
//!
//! A [`Locator`] pairs a location [`Strategy`] with a selector string. It is
//! immutable and constructed per lookup; nothing here holds a live element.
//!
//! Platform differences are encoded with a [`FallbackChain`]: an explicit
//! ordered list of locators evaluated short-circuit left-to-right, where the
//! first non-empty match wins. The order is deterministic and part of the
//! scenario contract.

use serde::{Deserialize, Serialize};

/// Location strategy understood by the automation protocol.
///
/// Wire names follow the Appium/WebDriver convention, including the
/// vendor-prefixed Android and iOS strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Cross-platform accessibility identifier (`content-desc` on Android,
    /// `accessibilityIdentifier` on iOS)
    AccessibilityId,
    /// Platform-native resource id (e.g. an Android `resource-id`)
    Id,
    /// XPath over the page source
    XPath,
    /// Native widget class name
    ClassName,
    /// Android UiAutomator expression
    AndroidUiAutomator,
    /// iOS NSPredicate expression
    IosPredicate,
}

impl Strategy {
    /// The protocol wire name for this strategy.
    #[must_use]
    pub const fn as_wire_str(&self) -> &'static str {
        match self {
            Self::AccessibilityId => "accessibility id",
            Self::Id => "id",
            Self::XPath => "xpath",
            Self::ClassName => "class name",
            Self::AndroidUiAutomator => "-android uiautomator",
            Self::IosPredicate => "-ios predicate string",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_wire_str())
    }
}

/// A (strategy, value) pair identifying a UI element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    /// Location strategy
    pub strategy: Strategy,
    /// Selector string for the strategy
    pub value: String,
}

impl Locator {
    /// Create a locator with an explicit strategy.
    #[must_use]
    pub fn new(strategy: Strategy, value: impl Into<String>) -> Self {
        Self {
            strategy,
            value: value.into(),
        }
    }

    /// Locate by accessibility identifier.
    #[must_use]
    pub fn accessibility_id(value: impl Into<String>) -> Self {
        Self::new(Strategy::AccessibilityId, value)
    }

    /// Locate by platform resource id.
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::new(Strategy::Id, value)
    }

    /// Locate by XPath expression.
    #[must_use]
    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, value)
    }

    /// Locate by native class name.
    #[must_use]
    pub fn class_name(value: impl Into<String>) -> Self {
        Self::new(Strategy::ClassName, value)
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.strategy.as_wire_str(), self.value)
    }
}

/// Ordered list of alternate locators for one logical element.
///
/// Evaluated left-to-right with short-circuiting; the order encodes
/// platform-specific UI differences (cross-platform marker first, native
/// fallback second) and must stay deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackChain {
    locators: Vec<Locator>,
}

impl FallbackChain {
    /// Start a chain with its primary locator.
    #[must_use]
    pub fn first(locator: Locator) -> Self {
        Self {
            locators: vec![locator],
        }
    }

    /// Append a fallback tried only if all earlier locators matched nothing.
    #[must_use]
    pub fn or(mut self, locator: Locator) -> Self {
        self.locators.push(locator);
        self
    }

    /// The locators in evaluation order.
    #[must_use]
    pub fn locators(&self) -> &[Locator] {
        &self.locators
    }

    /// Number of alternates in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locators.len()
    }

    /// Whether the chain is empty (cannot match anything).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}

impl std::fmt::Display for FallbackChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.locators.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(" | "))
    }
}

impl From<Locator> for FallbackChain {
    fn from(locator: Locator) -> Self {
        Self::first(locator)
    }
}
