//! In-memory browser adapter for exercising steps without a browser.
//!
//! [`RecordingBrowser`] accepts every call, records it as a short string
//! (`"click data-test=login-button"`), and can be scripted to fail or stall
//! on specific calls. All pages opened from one browser share its log.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use hashbrown::HashMap;

use crate::browser::{BrowserAdapter, BrowserError, BrowserPage, Locator};
use crate::storage::SessionState;

#[derive(Default)]
struct Script {
    calls: Vec<String>,
    opened: usize,
    closed: usize,
    seeded: Vec<Option<SessionState>>,
    failures: HashMap<String, BrowserError>,
    delays: HashMap<String, Duration>,
    texts: HashMap<Locator, String>,
    open_failure: Option<BrowserError>,
    open_delay: Option<Duration>,
    storage: serde_json::Value,
}

/// Scriptable browser adapter that records every call.
#[derive(Clone, Default)]
pub struct RecordingBrowser {
    script: Arc<Mutex<Script>>,
}

impl RecordingBrowser {
    /// Create a browser whose pages accept every call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        match self.script.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Open a page directly, bypassing [`BrowserAdapter::open_page`].
    #[must_use]
    pub fn page(&self) -> RecordingPage {
        self.lock().opened += 1;
        RecordingPage {
            browser: self.clone(),
            url: String::from("about:blank"),
            closed: false,
        }
    }

    /// Fail the recorded call `call` with `error`.
    pub fn fail_on(&self, call: impl Into<String>, error: BrowserError) {
        self.lock().failures.insert(call.into(), error);
    }

    /// Delay the recorded call `call` by `delay` before it completes.
    pub fn delay_on(&self, call: impl Into<String>, delay: Duration) {
        self.lock().delays.insert(call.into(), delay);
    }

    /// Make [`BrowserAdapter::open_page`] fail with `error`.
    pub fn fail_open(&self, error: BrowserError) {
        self.lock().open_failure = Some(error);
    }

    /// Stall [`BrowserAdapter::open_page`] for `delay` before it answers.
    pub fn delay_open(&self, delay: Duration) {
        self.lock().open_delay = Some(delay);
    }

    /// Text returned for `locator` by `text_content`.
    pub fn set_text(&self, locator: Locator, text: impl Into<String>) {
        self.lock().texts.insert(locator, text.into());
    }

    /// Value returned by `storage_state`.
    pub fn set_storage_state(&self, state: serde_json::Value) {
        self.lock().storage = state;
    }

    /// Every call recorded so far, across all pages.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of pages opened.
    #[must_use]
    pub fn opened_pages(&self) -> usize {
        self.lock().opened
    }

    /// Number of pages closed.
    #[must_use]
    pub fn closed_pages(&self) -> usize {
        self.lock().closed
    }

    /// Session state each page was opened with, in opening order.
    #[must_use]
    pub fn seeded_states(&self) -> Vec<Option<SessionState>> {
        self.lock().seeded.clone()
    }

    async fn record(&self, call: String) -> Result<(), BrowserError> {
        let (delay, failure) = {
            let mut script = self.lock();
            script.calls.push(call.clone());
            (
                script.delays.get(&call).copied(),
                script.failures.get(&call).cloned(),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        failure.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl BrowserAdapter for RecordingBrowser {
    async fn open_page(
        &self,
        state: Option<&SessionState>,
    ) -> Result<Box<dyn BrowserPage>, BrowserError> {
        let delay = self.lock().open_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        {
            let mut script = self.lock();
            if let Some(err) = script.open_failure.clone() {
                return Err(err);
            }
            script.seeded.push(state.cloned());
        }
        Ok(Box::new(self.page()))
    }
}

/// A page opened from a [`RecordingBrowser`].
pub struct RecordingPage {
    browser: RecordingBrowser,
    url: String,
    closed: bool,
}

impl RecordingPage {
    async fn record(&self, call: String) -> Result<(), BrowserError> {
        if self.closed {
            return Err(BrowserError::Closed);
        }
        self.browser.record(call).await
    }
}

#[async_trait]
impl BrowserPage for RecordingPage {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.record(format!("goto {url}")).await?;
        url.clone_into(&mut self.url);
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), BrowserError> {
        self.record(format!("click {locator}")).await
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> Result<(), BrowserError> {
        self.record(format!("fill {locator} {value}")).await
    }

    async fn wait_for_visible(
        &mut self,
        locator: &Locator,
        _timeout: Duration,
    ) -> Result<(), BrowserError> {
        self.record(format!("wait {locator}")).await
    }

    async fn is_visible(&mut self, locator: &Locator) -> Result<bool, BrowserError> {
        self.record(format!("visible {locator}")).await?;
        Ok(true)
    }

    async fn text_content(&mut self, locator: &Locator) -> Result<String, BrowserError> {
        self.record(format!("text {locator}")).await?;
        Ok(self
            .browser
            .lock()
            .texts
            .get(locator)
            .cloned()
            .unwrap_or_default())
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        self.record(String::from("url")).await?;
        Ok(self.url.clone())
    }

    async fn storage_state(&mut self) -> Result<serde_json::Value, BrowserError> {
        self.record(String::from("storage_state")).await?;
        Ok(self.browser.lock().storage.clone())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        if !self.closed {
            self.closed = true;
            self.browser.lock().closed += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_and_scripted_failures() {
        let browser = RecordingBrowser::new();
        browser.fail_on(
            "click data-test=login-button",
            BrowserError::ElementNotFound(Locator::test_id("login-button")),
        );
        let mut page = browser.page();

        assert!(page.goto("/").await.is_ok());
        assert!(page.click(&Locator::test_id("login-button")).await.is_err());
        assert_eq!(browser.calls(), vec!["goto /", "click data-test=login-button"]);
        assert_eq!(page.current_url().await.ok().as_deref(), Some("/"));
    }

    #[tokio::test]
    async fn closed_pages_reject_calls() {
        let browser = RecordingBrowser::new();
        let mut page = browser.page();
        assert!(page.close().await.is_ok());
        assert_eq!(page.goto("/").await, Err(BrowserError::Closed));
        assert_eq!(browser.closed_pages(), 1);
    }
}
