//! Page-object layer.
//!
//! Page objects translate semantic actions ("log in with credentials") into
//! adapter calls. Every action runs through [`perform`], which re-raises any
//! failure inside it as an [`ActionError`] naming the action while keeping the
//! underlying error reachable through [`std::error::Error::source`].
//!
//! Reusable regions (a header present on every page) are plain fields of the
//! page objects that contain them. A page object owns its regions for its own
//! lifetime and never shares them with another page.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::browser::{BrowserError, BrowserPage, Locator};

/// How long element waits last unless a caller says otherwise.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

/// A failed page-object action.
#[derive(Debug, Error)]
#[error("{action} failed: {cause}")]
pub struct ActionError {
    action: String,
    #[source]
    cause: ActionCause,
}

impl ActionError {
    /// Name of the action that failed.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// The failure inside the action.
    #[must_use]
    pub fn cause(&self) -> &ActionCause {
        &self.cause
    }

    /// The adapter error at the bottom of any nested actions.
    #[must_use]
    pub fn root_browser_error(&self) -> &BrowserError {
        match &self.cause {
            ActionCause::Browser(err) => err,
            ActionCause::Action(inner) => inner.root_browser_error(),
        }
    }
}

/// What went wrong inside an action.
#[derive(Debug, Error)]
pub enum ActionCause {
    /// An adapter call failed.
    #[error(transparent)]
    Browser(#[from] BrowserError),
    /// A nested action failed.
    #[error(transparent)]
    Action(Box<ActionError>),
}

impl From<ActionError> for ActionCause {
    fn from(err: ActionError) -> Self {
        Self::Action(Box::new(err))
    }
}

/// Run `work` as the action `action`, wrapping any failure with its name.
///
/// # Errors
/// Returns [`ActionError`] when `work` fails.
///
/// # Examples
/// ```
/// use pagewright::{BrowserError, perform};
///
/// # futures::executor::block_on(async {
/// let err = perform("add backpack to cart", async {
///     Err::<(), _>(BrowserError::Closed)
/// })
/// .await
/// .expect_err("action fails");
/// assert_eq!(err.to_string(), "add backpack to cart failed: page is closed");
/// # });
/// ```
pub async fn perform<T, E, F>(action: &str, work: F) -> Result<T, ActionError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<ActionCause>,
{
    work.await.map_err(|err| ActionError {
        action: action.to_owned(),
        cause: err.into(),
    })
}

/// A named element on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    locator: Locator,
}

impl Element {
    /// Describe the element called `name`, found by `locator`.
    #[must_use]
    pub fn new(name: impl Into<String>, locator: Locator) -> Self {
        Self {
            name: name.into(),
            locator,
        }
    }

    /// Human-readable element name used in action errors.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the element is found.
    #[must_use]
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Click the element.
    ///
    /// # Errors
    /// Returns [`ActionError`] when the adapter cannot click it.
    pub async fn click(&self, page: &mut dyn BrowserPage) -> Result<(), ActionError> {
        perform(&format!("click {}", self.name), page.click(&self.locator)).await
    }

    /// Replace the element's value with `value`.
    ///
    /// # Errors
    /// Returns [`ActionError`] when the adapter cannot fill it.
    pub async fn fill(&self, page: &mut dyn BrowserPage, value: &str) -> Result<(), ActionError> {
        perform(&format!("fill {}", self.name), page.fill(&self.locator, value)).await
    }

    /// Read the element's text content.
    ///
    /// # Errors
    /// Returns [`ActionError`] when the element cannot be read.
    pub async fn text(&self, page: &mut dyn BrowserPage) -> Result<String, ActionError> {
        perform(&format!("read {}", self.name), page.text_content(&self.locator)).await
    }

    /// Wait up to `timeout` for the element to become visible.
    ///
    /// # Errors
    /// Returns [`ActionError`] when the element does not appear in time.
    pub async fn wait_visible(
        &self,
        page: &mut dyn BrowserPage,
        timeout: Duration,
    ) -> Result<(), ActionError> {
        perform(
            &format!("wait for {}", self.name),
            page.wait_for_visible(&self.locator, timeout),
        )
        .await
    }

    /// Whether the element is visible right now.
    ///
    /// # Errors
    /// Returns [`ActionError`] when the adapter cannot answer.
    pub async fn is_visible(&self, page: &mut dyn BrowserPage) -> Result<bool, ActionError> {
        perform(
            &format!("check visibility of {}", self.name),
            page.is_visible(&self.locator),
        )
        .await
    }
}

/// Join a page path onto an optional base URL.
///
/// Absolute URLs are returned unchanged.
#[must_use]
pub fn resolve_url(base_url: Option<&str>, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_owned();
    }
    match base_url {
        Some(base) => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        ),
        None => path.to_owned(),
    }
}

/// A logical UI page.
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Name used in action errors.
    fn name(&self) -> &str;

    /// Path of the page relative to the application's base URL.
    fn path(&self) -> &str;

    /// Element whose visibility signals that the page has loaded.
    fn ready_marker(&self) -> &Element;

    /// Navigate to the page and wait until it has loaded.
    ///
    /// # Errors
    /// Returns [`ActionError`] when navigation fails or the page never loads.
    async fn open(
        &self,
        page: &mut dyn BrowserPage,
        base_url: Option<&str>,
    ) -> Result<(), ActionError> {
        let url = resolve_url(base_url, self.path());
        perform(&format!("open {}", self.name()), async {
            page.goto(&url).await?;
            self.ready_marker().wait_visible(page, DEFAULT_WAIT).await?;
            Ok::<(), ActionCause>(())
        })
        .await
    }

    /// Wait until the page's ready marker is visible.
    ///
    /// # Errors
    /// Returns [`ActionError`] when the marker does not appear in time.
    async fn wait_until_loaded(&self, page: &mut dyn BrowserPage) -> Result<(), ActionError> {
        perform(
            &format!("wait for {} to load", self.name()),
            self.ready_marker().wait_visible(page, DEFAULT_WAIT),
        )
        .await
    }

    /// Whether the page is currently displayed.
    ///
    /// # Errors
    /// Returns [`ActionError`] when the adapter cannot answer.
    async fn is_displayed(&self, page: &mut dyn BrowserPage) -> Result<bool, ActionError> {
        self.ready_marker().is_visible(page).await
    }
}
