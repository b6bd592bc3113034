//! Login and shopping suites for the Swag Labs demo storefront.
//!
//! The suites run against [`Storefront`], a simulated storefront that stands
//! in for a real browser. The features live in `features/`:
//!
//! - `login.feature` logs in with each demo account through a Scenario
//!   Outline and checks the error banner for rejected logins.
//! - `auth.feature` holds the `@login:standard_user` flow used to produce the
//!   role's stored session.
//! - `products.feature` runs as `@role:standard_user`, starting from the
//!   stored session instead of logging in again.

pub mod pages;
pub mod steps;
pub mod storefront;

use std::sync::Arc;

use pagewright::{BrowserAdapter, RegistrationError, RunConfig, StepRegistry};
use pagewright_cli::Project;

pub use storefront::Storefront;
use storefront::DEFAULT_ORIGIN;

/// The demo suite.
#[derive(Debug, Clone, Default)]
pub struct SauceDemo {
    storefront: Option<Storefront>,
}

impl SauceDemo {
    /// A suite that serves the storefront from the configured base URL.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A suite that runs against `storefront` whatever the configuration.
    #[must_use]
    pub fn with_storefront(storefront: Storefront) -> Self {
        Self {
            storefront: Some(storefront),
        }
    }
}

impl Project for SauceDemo {
    fn register_steps(&self, registry: &mut StepRegistry) -> Result<(), RegistrationError> {
        steps::register(registry)
    }

    fn browser(&self, config: &RunConfig) -> eyre::Result<Arc<dyn BrowserAdapter>> {
        let storefront = self.storefront.clone().unwrap_or_else(|| {
            Storefront::new(config.base_url.as_deref().unwrap_or(DEFAULT_ORIGIN))
        });
        Ok(Arc::new(storefront))
    }
}
