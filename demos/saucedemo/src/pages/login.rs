use async_trait::async_trait;
use pagewright::page::ActionCause;
use pagewright::{ActionError, BrowserPage, Element, Locator, PageObject, perform};

/// The sign-in form at the root of the storefront.
#[derive(Debug, Clone)]
pub struct LoginPage {
    username: Element,
    password: Element,
    login_button: Element,
    error: Element,
}

impl Default for LoginPage {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginPage {
    /// Describe the login page.
    #[must_use]
    pub fn new() -> Self {
        Self {
            username: Element::new("username field", Locator::test_id("username")),
            password: Element::new("password field", Locator::test_id("password")),
            login_button: Element::new("login button", Locator::test_id("login-button")),
            error: Element::new("login error", Locator::test_id("error")),
        }
    }

    /// Submit the form with `username` and `password`.
    ///
    /// # Errors
    /// Returns [`ActionError`] naming the field or button that failed.
    pub async fn log_in(
        &self,
        page: &mut dyn BrowserPage,
        username: &str,
        password: &str,
    ) -> Result<(), ActionError> {
        perform(&format!("log in as {username}"), async {
            self.username.fill(page, username).await?;
            self.password.fill(page, password).await?;
            self.login_button.click(page).await?;
            Ok::<(), ActionCause>(())
        })
        .await
    }

    /// The error banner's text, if one is shown.
    ///
    /// # Errors
    /// Returns [`ActionError`] when the adapter cannot read the page.
    pub async fn error_message(
        &self,
        page: &mut dyn BrowserPage,
    ) -> Result<Option<String>, ActionError> {
        if self.error.is_visible(page).await? {
            self.error.text(page).await.map(Some)
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl PageObject for LoginPage {
    fn name(&self) -> &str {
        "login page"
    }

    fn path(&self) -> &str {
        "/"
    }

    fn ready_marker(&self) -> &Element {
        &self.login_button
    }
}
