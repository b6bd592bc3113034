//! Step definitions for the storefront features.

use pagewright::{ExecutionContext, PageObject, RegistrationError, StepArgs, StepError, StepFuture, StepRegistry};

use crate::pages::{LoginPage, ProductsPage};

/// Register every storefront step with `registry`.
///
/// # Errors
/// Returns [`RegistrationError`] when a pattern clashes with one already
/// registered.
pub fn register(registry: &mut StepRegistry) -> Result<(), RegistrationError> {
    registry.given("the User is on the login page", open_login_page)?;
    registry.given("the User is on the Products page", open_products_page)?;
    registry.when(
        "the User tries to login with {string} as username and {string} as password",
        try_login,
    )?;
    registry.when("the User adds {string} to the cart", add_to_cart)?;
    registry.when("the User logs out", log_out)?;
    registry.then("the User should be on the Products page", on_products_page)?;
    registry.then("the User should be on the login page", on_login_page)?;
    registry.then("the User should see the error {string}", sees_error)?;
    registry.then("the cart badge should show {int}", cart_badge_shows)?;
    Ok(())
}

fn open_login_page(ctx: &mut ExecutionContext, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let base_url = ctx.base_url().map(str::to_owned);
        LoginPage::new()
            .open(ctx.page()?, base_url.as_deref())
            .await?;
        Ok(())
    })
}

fn open_products_page(ctx: &mut ExecutionContext, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let base_url = ctx.base_url().map(str::to_owned);
        ProductsPage::new()
            .open(ctx.page()?, base_url.as_deref())
            .await?;
        Ok(())
    })
}

fn try_login(ctx: &mut ExecutionContext, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let username = args.string(0)?;
        let password = args.string(1)?;
        LoginPage::new()
            .log_in(ctx.page()?, username, password)
            .await?;
        Ok(())
    })
}

fn add_to_cart(ctx: &mut ExecutionContext, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let product = args.string(0)?;
        ProductsPage::new().add_to_cart(ctx.page()?, product).await?;
        Ok(())
    })
}

fn log_out(ctx: &mut ExecutionContext, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        ProductsPage::new().header().log_out(ctx.page()?).await?;
        Ok(())
    })
}

fn on_products_page(ctx: &mut ExecutionContext, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let products = ProductsPage::new();
        let page = ctx.page()?;
        products.wait_until_loaded(page).await?;
        let title = products.title(page).await?;
        if title != "Products" {
            return Err(StepError::assertion(format!(
                "expected the Products title, found '{title}'"
            )));
        }
        if !products.header().logo().is_visible(page).await? {
            return Err(StepError::assertion("the header logo is missing"));
        }
        Ok(())
    })
}

fn on_login_page(ctx: &mut ExecutionContext, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        LoginPage::new().wait_until_loaded(ctx.page()?).await?;
        Ok(())
    })
}

fn sees_error(ctx: &mut ExecutionContext, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let expected = args.string(0)?;
        match LoginPage::new().error_message(ctx.page()?).await? {
            Some(shown) if shown == expected => Ok(()),
            Some(shown) => Err(StepError::assertion(format!(
                "expected error '{expected}', found '{shown}'"
            ))),
            None => Err(StepError::assertion(format!(
                "expected error '{expected}', but none is shown"
            ))),
        }
    })
}

fn cart_badge_shows(ctx: &mut ExecutionContext, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let expected = args.int(0)?;
        let count = ProductsPage::new()
            .header()
            .cart_count(ctx.page()?)
            .await?;
        if i64::from(count) == expected {
            Ok(())
        } else {
            Err(StepError::assertion(format!(
                "expected {expected} items in the cart, found {count}"
            )))
        }
    })
}
