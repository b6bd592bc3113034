use pagewright::page::{ActionCause, DEFAULT_WAIT};
use pagewright::{ActionError, BrowserError, BrowserPage, Element, Locator, perform};

/// The header bar shown on every page behind the login.
#[derive(Debug, Clone)]
pub struct HeaderRegion {
    logo: Element,
    cart_link: Element,
    cart_badge: Element,
    menu_button: Element,
    logout_link: Element,
}

impl Default for HeaderRegion {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderRegion {
    /// Describe the header.
    #[must_use]
    pub fn new() -> Self {
        Self {
            logo: Element::new("app logo", Locator::css(".app_logo")),
            cart_link: Element::new("cart link", Locator::test_id("shopping-cart-link")),
            cart_badge: Element::new("cart badge", Locator::test_id("shopping-cart-badge")),
            menu_button: Element::new("menu button", Locator::css("#react-burger-menu-btn")),
            logout_link: Element::new("logout link", Locator::test_id("logout-sidebar-link")),
        }
    }

    /// The logo element.
    #[must_use]
    pub fn logo(&self) -> &Element {
        &self.logo
    }

    /// Number of items in the cart. The badge is absent for an empty cart.
    ///
    /// # Errors
    /// Returns [`ActionError`] when the badge cannot be read or does not hold
    /// a number.
    pub async fn cart_count(&self, page: &mut dyn BrowserPage) -> Result<u32, ActionError> {
        perform("read cart badge", async {
            if !self.cart_badge.is_visible(page).await? {
                return Ok::<u32, ActionCause>(0);
            }
            let text = self.cart_badge.text(page).await?;
            text.trim().parse().map_err(|_| {
                ActionCause::from(BrowserError::Adapter(format!(
                    "cart badge shows '{text}'"
                )))
            })
        })
        .await
    }

    /// Open the cart.
    ///
    /// # Errors
    /// Returns [`ActionError`] when the link cannot be clicked.
    pub async fn open_cart(&self, page: &mut dyn BrowserPage) -> Result<(), ActionError> {
        self.cart_link.click(page).await
    }

    /// Log out through the side menu.
    ///
    /// # Errors
    /// Returns [`ActionError`] naming the menu element that failed.
    pub async fn log_out(&self, page: &mut dyn BrowserPage) -> Result<(), ActionError> {
        perform("log out", async {
            self.menu_button.click(page).await?;
            self.logout_link.wait_visible(page, DEFAULT_WAIT).await?;
            self.logout_link.click(page).await?;
            Ok::<(), ActionCause>(())
        })
        .await
    }
}
