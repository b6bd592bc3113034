//! Scenario-scoped execution context.
//!
//! A context is created for one scenario, owns that scenario's browser page
//! and any named page objects or fixtures the steps create, and is torn down
//! when the scenario ends. Contexts are never shared between scenarios.

use std::any::Any;
use std::time::Duration;

use hashbrown::HashMap;

use crate::browser::{BrowserError, BrowserPage};
use crate::error::StepError;

/// How long teardown may take before the page is abandoned.
pub(crate) const TEARDOWN_GRACE: Duration = Duration::from_secs(10);

/// A fixture together with the page it drives.
///
/// Returned by [`ExecutionContext::bind`] so a step can use a page object and
/// the page at the same time.
pub struct Bound<'a, T> {
    /// The fixture.
    pub object: &'a mut T,
    /// The scenario's page.
    pub page: &'a mut dyn BrowserPage,
    /// Base URL of the application under test, if configured.
    pub base_url: Option<&'a str>,
}

/// Mutable state shared by the steps of one scenario.
pub struct ExecutionContext {
    page: Option<Box<dyn BrowserPage>>,
    fixtures: HashMap<String, Box<dyn Any + Send>>,
    base_url: Option<String>,
}

impl ExecutionContext {
    /// Create a context owning `page`.
    #[must_use]
    pub fn new(page: Box<dyn BrowserPage>) -> Self {
        Self {
            page: Some(page),
            fixtures: HashMap::new(),
            base_url: None,
        }
    }

    /// Set the base URL page objects resolve their paths against.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }

    /// Base URL of the application under test.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// The scenario's browser page.
    ///
    /// # Errors
    /// Returns [`StepError::NoPage`] after teardown.
    pub fn page(&mut self) -> Result<&mut dyn BrowserPage, StepError> {
        match self.page.as_mut() {
            Some(page) => Ok(page.as_mut()),
            None => Err(StepError::NoPage),
        }
    }

    /// Store `value` under `name`, replacing any previous fixture of that
    /// name.
    pub fn insert<T: Any + Send>(&mut self, name: impl Into<String>, value: T) {
        self.fixtures.insert(name.into(), Box::new(value));
    }

    /// Whether a fixture called `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fixtures.contains_key(name)
    }

    /// Borrow the fixture called `name`.
    ///
    /// # Errors
    /// Returns [`StepError::Fixture`] when it is absent or has another type.
    pub fn get<T: Any + Send>(&self, name: &str) -> Result<&T, StepError> {
        self.fixtures
            .get(name)
            .ok_or_else(|| missing(name))?
            .downcast_ref::<T>()
            .ok_or_else(|| wrong_type(name))
    }

    /// Mutably borrow the fixture called `name`.
    ///
    /// # Errors
    /// Returns [`StepError::Fixture`] when it is absent or has another type.
    pub fn get_mut<T: Any + Send>(&mut self, name: &str) -> Result<&mut T, StepError> {
        self.fixtures
            .get_mut(name)
            .ok_or_else(|| missing(name))?
            .downcast_mut::<T>()
            .ok_or_else(|| wrong_type(name))
    }

    /// Remove and return the fixture called `name`.
    ///
    /// # Errors
    /// Returns [`StepError::Fixture`] when it is absent or has another type.
    /// A fixture of the wrong type is left in place.
    pub fn take<T: Any + Send>(&mut self, name: &str) -> Result<T, StepError> {
        let boxed = self.fixtures.remove(name).ok_or_else(|| missing(name))?;
        match boxed.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(original) => {
                self.fixtures.insert(name.to_owned(), original);
                Err(wrong_type(name))
            }
        }
    }

    /// Get the fixture called `name`, creating it with `init` when absent.
    ///
    /// # Errors
    /// Returns [`StepError::Fixture`] when a fixture of another type is
    /// stored under `name`.
    pub fn get_or_insert_with<T, F>(&mut self, name: &str, init: F) -> Result<&mut T, StepError>
    where
        T: Any + Send,
        F: FnOnce() -> T,
    {
        self.fixtures
            .entry(name.to_owned())
            .or_insert_with(|| Box::new(init()))
            .downcast_mut::<T>()
            .ok_or_else(|| wrong_type(name))
    }

    /// Borrow the fixture called `name` alongside the page.
    ///
    /// # Errors
    /// Returns [`StepError::Fixture`] for a missing or mistyped fixture and
    /// [`StepError::NoPage`] after teardown.
    pub fn bind<T: Any + Send>(&mut self, name: &str) -> Result<Bound<'_, T>, StepError> {
        let object = self
            .fixtures
            .get_mut(name)
            .ok_or_else(|| missing(name))?
            .downcast_mut::<T>()
            .ok_or_else(|| wrong_type(name))?;
        let page = self.page.as_mut().ok_or(StepError::NoPage)?.as_mut();
        Ok(Bound {
            object,
            page,
            base_url: self.base_url.as_deref(),
        })
    }

    /// Drop every fixture and close the page.
    ///
    /// Safe to call more than once; later calls do nothing.
    ///
    /// # Errors
    /// Returns the adapter's error when closing the page fails. The context
    /// is torn down regardless.
    pub async fn teardown(&mut self) -> Result<(), BrowserError> {
        self.fixtures.clear();
        match self.page.take() {
            Some(mut page) => page.close().await,
            None => Ok(()),
        }
    }

    /// Whether [`teardown`](Self::teardown) has run.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.page.is_none()
    }
}

fn missing(name: &str) -> StepError {
    StepError::Fixture {
        name: name.to_owned(),
        problem: "is not present in the scenario context",
    }
}

fn wrong_type(name: &str) -> StepError {
    StepError::Fixture {
        name: name.to_owned(),
        problem: "has a different type than requested",
    }
}
