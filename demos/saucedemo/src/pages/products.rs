use async_trait::async_trait;
use pagewright::{ActionError, BrowserPage, Element, Locator, PageObject, perform};

use super::HeaderRegion;
use crate::storefront::product_slug;

/// The inventory listing shown after a successful login.
#[derive(Debug, Clone)]
pub struct ProductsPage {
    title: Element,
    inventory: Element,
    header: HeaderRegion,
}

impl Default for ProductsPage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductsPage {
    /// Describe the products page.
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: Element::new("page title", Locator::css(".title")),
            inventory: Element::new("inventory list", Locator::test_id("inventory-container")),
            header: HeaderRegion::new(),
        }
    }

    /// The header region.
    #[must_use]
    pub fn header(&self) -> &HeaderRegion {
        &self.header
    }

    /// Text of the page title.
    ///
    /// # Errors
    /// Returns [`ActionError`] when the title is not on the page.
    pub async fn title(&self, page: &mut dyn BrowserPage) -> Result<String, ActionError> {
        self.title.text(page).await
    }

    /// Add `product` to the cart with its listing button.
    ///
    /// # Errors
    /// Returns [`ActionError`] when the product has no add button, for
    /// example because it is already in the cart.
    pub async fn add_to_cart(
        &self,
        page: &mut dyn BrowserPage,
        product: &str,
    ) -> Result<(), ActionError> {
        let button = Element::new(
            format!("add {product} button"),
            Locator::test_id(format!("add-to-cart-{}", product_slug(product))),
        );
        perform(&format!("add {product} to the cart"), button.click(page)).await
    }
}

#[async_trait]
impl PageObject for ProductsPage {
    fn name(&self) -> &str {
        "products page"
    }

    fn path(&self) -> &str {
        "/inventory.html"
    }

    fn ready_marker(&self) -> &Element {
        &self.inventory
    }
}
