//! Capability interface to an external browser automation library.
//!
//! The engine never drives a browser directly. An adapter opens pages, and a
//! page exposes the handful of primitives page objects need: navigation,
//! locating, clicking, filling, waiting and reading state. Every method that
//! waits on page state is an `await` point; these are the only places a
//! scenario suspends.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::storage::SessionState;

/// How to find an element on the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// A CSS selector.
    Css(String),
    /// Visible text content.
    Text(String),
    /// A `data-test` attribute value.
    TestId(String),
}

impl Locator {
    /// Locate by CSS selector.
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Locate by visible text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Locate by `data-test` attribute.
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(selector) => write!(f, "css={selector}"),
            Self::Text(text) => write!(f, "text={text}"),
            Self::TestId(id) => write!(f, "data-test={id}"),
        }
    }
}

/// Error surfaced by a browser adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrowserError {
    /// No element matches the locator.
    #[error("element not found: {0}")]
    ElementNotFound(Locator),
    /// A wait did not complete in time.
    #[error("timed out after {timeout:?} waiting for {target}")]
    Timeout {
        /// What was being waited for.
        target: String,
        /// How long the wait lasted.
        timeout: Duration,
    },
    /// Navigation did not reach the requested URL.
    #[error("navigation to '{url}' failed: {reason}")]
    Navigation {
        /// Requested URL.
        url: String,
        /// Adapter-provided explanation.
        reason: String,
    },
    /// The page was used after being closed.
    #[error("page is closed")]
    Closed,
    /// Any other adapter failure.
    #[error("{0}")]
    Adapter(String),
}

/// A single browser page owned by one scenario.
#[async_trait]
pub trait BrowserPage: Send {
    /// Navigate to `url`, resolved against the page's origin when relative.
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Click the element matching `locator`.
    async fn click(&mut self, locator: &Locator) -> Result<(), BrowserError>;

    /// Replace the value of the input matching `locator`.
    async fn fill(&mut self, locator: &Locator, value: &str) -> Result<(), BrowserError>;

    /// Wait until the element matching `locator` is visible.
    async fn wait_for_visible(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), BrowserError>;

    /// Whether an element matching `locator` is currently visible.
    async fn is_visible(&mut self, locator: &Locator) -> Result<bool, BrowserError>;

    /// Text content of the element matching `locator`.
    async fn text_content(&mut self, locator: &Locator) -> Result<String, BrowserError>;

    /// URL currently displayed.
    async fn current_url(&mut self) -> Result<String, BrowserError>;

    /// Snapshot of cookies and local storage, in the adapter's own format.
    async fn storage_state(&mut self) -> Result<serde_json::Value, BrowserError>;

    /// Close the page. Closing twice is not an error.
    async fn close(&mut self) -> Result<(), BrowserError>;
}

/// Opens independent browser pages.
#[async_trait]
pub trait BrowserAdapter: Send + Sync {
    /// Open a fresh page in its own browser context, seeded with `state` when
    /// given.
    async fn open_page(
        &self,
        state: Option<&SessionState>,
    ) -> Result<Box<dyn BrowserPage>, BrowserError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Locator::css("#login-button"), "css=#login-button")]
    #[case(Locator::text("Products"), "text=Products")]
    #[case(Locator::test_id("username"), "data-test=username")]
    fn locators_display_with_strategy_prefix(#[case] locator: Locator, #[case] expected: &str) {
        assert_eq!(locator.to_string(), expected);
    }

    #[test]
    fn timeout_message_names_target() {
        let err = BrowserError::Timeout {
            target: "data-test=title".into(),
            timeout: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "timed out after 5s waiting for data-test=title");
    }
}
