//! An in-process stand-in for the Swag Labs demo storefront.
//!
//! [`Storefront`] implements [`BrowserAdapter`] without a real browser. Each
//! page renders the storefront's screens as a flat list of visible elements
//! keyed by locator, which is enough for the page objects to log in, browse
//! the inventory and manage the cart. Session state uses the cookie and local
//! storage layout of a browser storage-state file.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pagewright::{BrowserAdapter, BrowserError, BrowserPage, Locator, SessionState};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Origin used when no base URL is configured.
pub const DEFAULT_ORIGIN: &str = "https://www.saucedemo.com";

/// Password shared by every demo account.
pub const PASSWORD: &str = "secret_sauce";

/// Products listed on the inventory page, in display order.
pub const PRODUCTS: &[&str] = &[
    "Sauce Labs Backpack",
    "Sauce Labs Bike Light",
    "Sauce Labs Bolt T-Shirt",
    "Sauce Labs Fleece Jacket",
    "Sauce Labs Onesie",
];

const SESSION_COOKIE: &str = "session-username";
const CART_KEY: &str = "cart-contents";
const INVENTORY_PATH: &str = "/inventory.html";
const CART_PATH: &str = "/cart.html";

/// `data-test` suffix used for a product's cart buttons.
///
/// ```
/// assert_eq!(saucedemo::storefront::product_slug("Sauce Labs Backpack"), "sauce-labs-backpack");
/// ```
#[must_use]
pub fn product_slug(product: &str) -> String {
    product.to_lowercase().replace(' ', "-")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Account {
    Standard,
    LockedOut,
    Problem,
    PerformanceGlitch,
}

impl Account {
    fn lookup(username: &str) -> Option<Self> {
        match username {
            "standard_user" => Some(Self::Standard),
            "locked_out_user" => Some(Self::LockedOut),
            "problem_user" => Some(Self::Problem),
            "performance_glitch_user" => Some(Self::PerformanceGlitch),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StorageSnapshot {
    #[serde(default)]
    cookies: Vec<Cookie>,
    #[serde(default)]
    origins: Vec<OriginStorage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Cookie {
    name: String,
    value: String,
    domain: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OriginStorage {
    origin: String,
    #[serde(rename = "localStorage")]
    local_storage: Vec<StorageEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StorageEntry {
    name: String,
    value: String,
}

/// Simulated storefront browser.
///
/// Clones share the login counter, so a test can hand one clone to the
/// runner and inspect another afterwards.
#[derive(Debug, Clone)]
pub struct Storefront {
    origin: String,
    hidden: Vec<Locator>,
    glitch_delay: Duration,
    logins: Arc<AtomicUsize>,
}

impl Default for Storefront {
    fn default() -> Self {
        Self::new(DEFAULT_ORIGIN)
    }
}

impl Storefront {
    /// A storefront served from `origin`.
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_owned(),
            hidden: Vec::new(),
            glitch_delay: Duration::from_millis(50),
            logins: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Never render the element matching `locator`.
    #[must_use]
    pub fn without(mut self, locator: Locator) -> Self {
        self.hidden.push(locator);
        self
    }

    /// How long `performance_glitch_user` waits after submitting the login
    /// form.
    #[must_use]
    pub fn with_glitch_delay(mut self, delay: Duration) -> Self {
        self.glitch_delay = delay;
        self
    }

    /// Successful logins across every page opened so far.
    #[must_use]
    pub fn login_count(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserAdapter for Storefront {
    async fn open_page(
        &self,
        state: Option<&SessionState>,
    ) -> Result<Box<dyn BrowserPage>, BrowserError> {
        let mut page = StorefrontPage::new(self.clone());
        if let Some(state) = state {
            page.restore(state)?;
        }
        Ok(Box::new(page))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Blank,
    Login,
    Inventory,
    Cart,
}

/// One tab on the simulated storefront.
#[derive(Debug)]
pub struct StorefrontPage {
    store: Storefront,
    screen: Screen,
    path: String,
    user: Option<String>,
    cart: Vec<String>,
    username: String,
    password: String,
    error: Option<String>,
    menu_open: bool,
    closed: bool,
}

impl StorefrontPage {
    fn new(store: Storefront) -> Self {
        Self {
            store,
            screen: Screen::Blank,
            path: String::new(),
            user: None,
            cart: Vec::new(),
            username: String::new(),
            password: String::new(),
            error: None,
            menu_open: false,
            closed: false,
        }
    }

    fn restore(&mut self, state: &SessionState) -> Result<(), BrowserError> {
        let snapshot: StorageSnapshot = serde_json::from_value(state.data.clone())
            .map_err(|err| BrowserError::Adapter(format!("unreadable storage state: {err}")))?;
        self.user = snapshot
            .cookies
            .into_iter()
            .find(|cookie| cookie.name == SESSION_COOKIE)
            .map(|cookie| cookie.value);
        let stored_cart = snapshot
            .origins
            .iter()
            .filter(|origin| origin.origin == self.store.origin)
            .flat_map(|origin| &origin.local_storage)
            .find(|entry| entry.name == CART_KEY);
        if let Some(entry) = stored_cart {
            self.cart = serde_json::from_str(&entry.value)
                .map_err(|err| BrowserError::Adapter(format!("unreadable cart contents: {err}")))?;
        }
        Ok(())
    }

    fn snapshot(&self) -> StorageSnapshot {
        let origin = self.store.origin.as_str();
        let domain = origin
            .split_once("://")
            .map_or(origin, |(_, host)| host)
            .to_owned();
        let cookies = self
            .user
            .iter()
            .map(|user| Cookie {
                name: SESSION_COOKIE.to_owned(),
                value: user.clone(),
                domain: domain.clone(),
            })
            .collect();
        let cart = serde_json::to_string(&self.cart).unwrap_or_else(|_| "[]".to_owned());
        StorageSnapshot {
            cookies,
            origins: vec![OriginStorage {
                origin: self.store.origin.clone(),
                local_storage: vec![StorageEntry {
                    name: CART_KEY.to_owned(),
                    value: cart,
                }],
            }],
        }
    }

    fn ensure_open(&self) -> Result<(), BrowserError> {
        if self.closed {
            Err(BrowserError::Closed)
        } else {
            Ok(())
        }
    }

    fn show(&mut self, screen: Screen, path: &str) {
        self.screen = screen;
        path.clone_into(&mut self.path);
        self.menu_open = false;
    }

    /// Visible elements of the current screen with their text content.
    fn elements(&self) -> Vec<(Locator, String)> {
        let mut elements = Vec::new();
        match self.screen {
            Screen::Blank => {}
            Screen::Login => {
                elements.push((Locator::css(".login_logo"), "Swag Labs".to_owned()));
                elements.push((Locator::test_id("username"), self.username.clone()));
                elements.push((Locator::test_id("password"), self.password.clone()));
                elements.push((Locator::test_id("login-button"), "Login".to_owned()));
                if let Some(error) = &self.error {
                    elements.push((Locator::test_id("error"), error.clone()));
                }
            }
            Screen::Inventory => {
                self.header(&mut elements);
                elements.push((Locator::css(".title"), "Products".to_owned()));
                elements.push((Locator::test_id("inventory-container"), String::new()));
                for product in PRODUCTS {
                    let slug = product_slug(product);
                    elements.push((Locator::text(*product), (*product).to_owned()));
                    if self.cart.iter().any(|item| item == product) {
                        elements.push((Locator::test_id(format!("remove-{slug}")), "Remove".to_owned()));
                    } else {
                        elements.push((
                            Locator::test_id(format!("add-to-cart-{slug}")),
                            "Add to cart".to_owned(),
                        ));
                    }
                }
            }
            Screen::Cart => {
                self.header(&mut elements);
                elements.push((Locator::css(".title"), "Your Cart".to_owned()));
                elements.push((Locator::test_id("cart-list"), String::new()));
                for item in &self.cart {
                    elements.push((Locator::text(item.as_str()), item.clone()));
                }
            }
        }
        elements.retain(|(locator, _)| !self.store.hidden.contains(locator));
        elements
    }

    fn header(&self, elements: &mut Vec<(Locator, String)>) {
        elements.push((Locator::css(".app_logo"), "Swag Labs".to_owned()));
        elements.push((Locator::test_id("shopping-cart-link"), String::new()));
        if !self.cart.is_empty() {
            elements.push((
                Locator::test_id("shopping-cart-badge"),
                self.cart.len().to_string(),
            ));
        }
        elements.push((Locator::css("#react-burger-menu-btn"), "Open Menu".to_owned()));
        if self.menu_open {
            elements.push((Locator::test_id("logout-sidebar-link"), "Logout".to_owned()));
        }
    }

    fn find(&self, locator: &Locator) -> Result<String, BrowserError> {
        self.elements()
            .into_iter()
            .find(|(candidate, _)| candidate == locator)
            .map(|(_, text)| text)
            .ok_or_else(|| BrowserError::ElementNotFound(locator.clone()))
    }

    async fn submit_login(&mut self) {
        let username = self.username.clone();
        let outcome = if username.is_empty() {
            Err("Epic sadface: Username is required")
        } else if self.password.is_empty() {
            Err("Epic sadface: Password is required")
        } else {
            match Account::lookup(&username) {
                Some(_) if self.password != PASSWORD => {
                    Err("Epic sadface: Username and password do not match any user in this service")
                }
                None => Err("Epic sadface: Username and password do not match any user in this service"),
                Some(Account::LockedOut) => Err("Epic sadface: Sorry, this user has been locked out."),
                Some(account) => Ok(account),
            }
        };
        match outcome {
            Ok(account) => {
                if account == Account::PerformanceGlitch {
                    tokio::time::sleep(self.store.glitch_delay).await;
                }
                self.store.logins.fetch_add(1, Ordering::SeqCst);
                debug!(user = %username, ?account, "logged in");
                self.user = Some(username);
                self.error = None;
                self.show(Screen::Inventory, INVENTORY_PATH);
            }
            Err(message) => {
                debug!(user = %username, message, "login rejected");
                self.error = Some(message.to_owned());
            }
        }
    }

    fn toggle_cart(&mut self, product: &str, add: bool) {
        if add {
            self.cart.push(product.to_owned());
        } else {
            self.cart.retain(|item| item != product);
        }
    }

    fn cart_button(id: &str) -> Option<(&'static str, bool)> {
        PRODUCTS.iter().find_map(|product| {
            let slug = product_slug(product);
            if id.strip_prefix("add-to-cart-") == Some(slug.as_str()) {
                Some((*product, true))
            } else if id.strip_prefix("remove-") == Some(slug.as_str()) {
                Some((*product, false))
            } else {
                None
            }
        })
    }
}

#[async_trait]
impl BrowserPage for StorefrontPage {
    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        let path = url.strip_prefix(self.store.origin.as_str()).unwrap_or(url);
        let path = if path.is_empty() { "/" } else { path };
        let screen = match path {
            "/" | "/index.html" => Screen::Login,
            INVENTORY_PATH => Screen::Inventory,
            CART_PATH => Screen::Cart,
            _ => {
                return Err(BrowserError::Navigation {
                    url: url.to_owned(),
                    reason: "404 not found".to_owned(),
                });
            }
        };
        self.error = None;
        if screen != Screen::Login && self.user.is_none() {
            self.error = Some(format!(
                "Epic sadface: You can only access '{path}' when you are logged in."
            ));
            self.show(Screen::Login, "/");
        } else {
            self.show(screen, path);
        }
        Ok(())
    }

    async fn click(&mut self, locator: &Locator) -> Result<(), BrowserError> {
        self.ensure_open()?;
        self.find(locator)?;
        let Locator::TestId(id) = locator else {
            if *locator == Locator::css("#react-burger-menu-btn") {
                self.menu_open = true;
            }
            return Ok(());
        };
        match id.as_str() {
            "login-button" => self.submit_login().await,
            "shopping-cart-link" => self.show(Screen::Cart, CART_PATH),
            "logout-sidebar-link" => {
                self.user = None;
                self.username.clear();
                self.password.clear();
                self.show(Screen::Login, "/");
            }
            other => {
                if let Some((product, add)) = Self::cart_button(other) {
                    self.toggle_cart(product, add);
                }
            }
        }
        Ok(())
    }

    async fn fill(&mut self, locator: &Locator, value: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        self.find(locator)?;
        match locator {
            Locator::TestId(id) if id == "username" => value.clone_into(&mut self.username),
            Locator::TestId(id) if id == "password" => value.clone_into(&mut self.password),
            _ => {
                return Err(BrowserError::Adapter(format!(
                    "element {locator} is not an input"
                )));
            }
        }
        Ok(())
    }

    async fn wait_for_visible(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        self.ensure_open()?;
        match self.find(locator) {
            Ok(_) => Ok(()),
            Err(_) => Err(BrowserError::Timeout {
                target: locator.to_string(),
                timeout,
            }),
        }
    }

    async fn is_visible(&mut self, locator: &Locator) -> Result<bool, BrowserError> {
        self.ensure_open()?;
        Ok(self.find(locator).is_ok())
    }

    async fn text_content(&mut self, locator: &Locator) -> Result<String, BrowserError> {
        self.ensure_open()?;
        self.find(locator)
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        self.ensure_open()?;
        if self.screen == Screen::Blank {
            return Ok("about:blank".to_owned());
        }
        Ok(format!("{}{}", self.store.origin, self.path))
    }

    async fn storage_state(&mut self) -> Result<serde_json::Value, BrowserError> {
        self.ensure_open()?;
        serde_json::to_value(self.snapshot()).map_err(|err| BrowserError::Adapter(err.to_string()))
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    async fn page(store: &Storefront, state: Option<&SessionState>) -> Box<dyn BrowserPage> {
        match store.open_page(state).await {
            Ok(page) => page,
            Err(err) => panic!("page should open: {err}"),
        }
    }

    async fn log_in(page: &mut dyn BrowserPage, username: &str, password: &str) {
        assert!(page.goto("/").await.is_ok());
        assert!(page.fill(&Locator::test_id("username"), username).await.is_ok());
        assert!(page.fill(&Locator::test_id("password"), password).await.is_ok());
        assert!(page.click(&Locator::test_id("login-button")).await.is_ok());
    }

    #[rstest]
    #[case("standard_user", PASSWORD, None)]
    #[case("problem_user", PASSWORD, None)]
    #[case("locked_out_user", PASSWORD, Some("Epic sadface: Sorry, this user has been locked out."))]
    #[case("standard_user", "wrong", Some("Epic sadface: Username and password do not match any user in this service"))]
    #[case("", PASSWORD, Some("Epic sadface: Username is required"))]
    #[case("standard_user", "", Some("Epic sadface: Password is required"))]
    #[tokio::test]
    async fn login_outcomes(
        #[case] username: &str,
        #[case] password: &str,
        #[case] error: Option<&str>,
    ) {
        let store = Storefront::default();
        let mut page = page(&store, None).await;
        log_in(page.as_mut(), username, password).await;

        let shown = page.text_content(&Locator::test_id("error")).await.ok();
        assert_eq!(shown.as_deref(), error);
        let title = page.text_content(&Locator::css(".title")).await.ok();
        if error.is_none() {
            assert_eq!(title.as_deref(), Some("Products"));
            assert_eq!(store.login_count(), 1);
        } else {
            assert_eq!(title, None);
            assert_eq!(store.login_count(), 0);
        }
    }

    #[tokio::test]
    async fn inventory_requires_a_session() {
        let store = Storefront::new("https://shop.test/");
        let mut page = page(&store, None).await;
        assert!(page.goto("https://shop.test/inventory.html").await.is_ok());
        assert_eq!(page.current_url().await.ok().as_deref(), Some("https://shop.test/"));
        let error = page.text_content(&Locator::test_id("error")).await.ok();
        assert_eq!(
            error.as_deref(),
            Some("Epic sadface: You can only access '/inventory.html' when you are logged in.")
        );
    }

    #[tokio::test]
    async fn storage_state_restores_session_and_cart() {
        let store = Storefront::default();
        let mut first = page(&store, None).await;
        log_in(first.as_mut(), "standard_user", PASSWORD).await;
        assert!(
            first
                .click(&Locator::test_id("add-to-cart-sauce-labs-backpack"))
                .await
                .is_ok()
        );
        let Ok(data) = first.storage_state().await else {
            panic!("state should serialise");
        };
        let state = SessionState::new("standard_user", data);

        let mut second = page(&store, Some(&state)).await;
        assert!(second.goto("/inventory.html").await.is_ok());
        let badge = second.text_content(&Locator::test_id("shopping-cart-badge")).await.ok();
        assert_eq!(badge.as_deref(), Some("1"));
        assert!(
            second
                .is_visible(&Locator::test_id("remove-sauce-labs-backpack"))
                .await
                .unwrap_or(false)
        );
        assert_eq!(store.login_count(), 1);
    }

    #[tokio::test]
    async fn hidden_elements_are_not_found() {
        let store = Storefront::default().without(Locator::test_id("login-button"));
        let mut page = page(&store, None).await;
        assert!(page.goto("/").await.is_ok());
        assert_eq!(
            page.click(&Locator::test_id("login-button")).await,
            Err(BrowserError::ElementNotFound(Locator::test_id("login-button")))
        );
    }

    #[tokio::test]
    async fn unknown_paths_fail_navigation() {
        let store = Storefront::default();
        let mut page = page(&store, None).await;
        assert!(matches!(
            page.goto("/checkout.html").await,
            Err(BrowserError::Navigation { .. })
        ));
    }

    #[tokio::test]
    async fn closed_pages_reject_calls() {
        let store = Storefront::default();
        let mut page = page(&store, None).await;
        assert!(page.close().await.is_ok());
        assert!(page.close().await.is_ok());
        assert_eq!(page.goto("/").await, Err(BrowserError::Closed));
    }

    #[tokio::test]
    async fn corrupt_state_is_an_adapter_error() {
        let store = Storefront::default();
        let state = SessionState::new("standard_user", serde_json::json!({ "cookies": 3 }));
        assert!(matches!(
            store.open_page(Some(&state)).await,
            Err(BrowserError::Adapter(_))
        ));
    }
}
