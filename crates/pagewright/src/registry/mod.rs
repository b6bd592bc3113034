//! Step registration and lookup.
//!
//! A [`StepRegistry`] is built explicitly at start-up and then shared
//! read-only. It is append-only and keyed by each pattern's canonical
//! signature, so two patterns differing only in keyword are duplicates.
//! Resolution is pure: the same text always yields the same definition and
//! captures.

mod args;
mod diagnostics;

use std::sync::Arc;

use futures::future::BoxFuture;
use hashbrown::HashMap;
use pagewright_patterns::{CompiledPattern, StepKeyword};

use crate::context::ExecutionContext;
use crate::error::{BindingError, RegistrationError, StepError};
use crate::feature::Step;

pub use args::StepArgs;
pub use diagnostics::{BindingDiagnostic, PatternOverlap};

/// Future returned by a step handler, borrowing the scenario's context.
pub type StepFuture<'a> = BoxFuture<'a, Result<(), StepError>>;

/// Code run for a matched step.
///
/// Implemented for every `Fn(&mut ExecutionContext, StepArgs) -> StepFuture`
/// that is `Send + Sync`, so plain functions and closures both work.
pub trait StepHandler: Send + Sync {
    /// Run the step against `ctx`.
    fn call<'a>(&self, ctx: &'a mut ExecutionContext, args: StepArgs) -> StepFuture<'a>;
}

impl<F> StepHandler for F
where
    F: for<'a> Fn(&'a mut ExecutionContext, StepArgs) -> StepFuture<'a> + Send + Sync,
{
    fn call<'a>(&self, ctx: &'a mut ExecutionContext, args: StepArgs) -> StepFuture<'a> {
        self(ctx, args)
    }
}

/// A registered step definition.
pub struct StepDefinition {
    pattern: CompiledPattern,
    keyword: Option<StepKeyword>,
    handler: Box<dyn StepHandler>,
}

impl StepDefinition {
    /// The compiled pattern.
    #[must_use]
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    /// Keyword the definition was registered under, for listings only.
    #[must_use]
    pub fn keyword(&self) -> Option<StepKeyword> {
        self.keyword
    }

    /// The handler.
    #[must_use]
    pub fn handler(&self) -> &dyn StepHandler {
        self.handler.as_ref()
    }
}

impl std::fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepDefinition")
            .field("pattern", &self.pattern.source())
            .field("keyword", &self.keyword)
            .finish_non_exhaustive()
    }
}

/// Step text bound to exactly one definition.
#[derive(Debug, Clone)]
pub struct ResolvedStep {
    /// The matching definition.
    pub definition: Arc<StepDefinition>,
    /// Values captured from the text, plus any doc string and table.
    pub args: StepArgs,
}

/// Explicitly constructed collection of step definitions.
#[derive(Debug, Default)]
pub struct StepRegistry {
    definitions: Vec<Arc<StepDefinition>>,
    by_signature: HashMap<String, usize>,
}

impl StepRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn insert<F>(
        &mut self,
        keyword: Option<StepKeyword>,
        pattern: &str,
        handler: F,
    ) -> Result<(), RegistrationError>
    where
        F: for<'a> Fn(&'a mut ExecutionContext, StepArgs) -> StepFuture<'a> + Send + Sync + 'static,
    {
        let compiled =
            CompiledPattern::compile(pattern).map_err(|source| RegistrationError::InvalidPattern {
                pattern: pattern.to_owned(),
                source,
            })?;
        if let Some(existing) = self
            .by_signature
            .get(compiled.signature())
            .and_then(|&index| self.definitions.get(index))
        {
            return Err(RegistrationError::DuplicatePattern {
                pattern: pattern.to_owned(),
                existing: existing.pattern.source().to_owned(),
            });
        }
        self.by_signature
            .insert(compiled.signature().to_owned(), self.definitions.len());
        self.definitions.push(Arc::new(StepDefinition {
            pattern: compiled,
            keyword,
            handler: Box::new(handler),
        }));
        Ok(())
    }

    /// Register `handler` for step text matching `pattern`, under any keyword.
    ///
    /// # Errors
    /// Returns [`RegistrationError::InvalidPattern`] when the pattern does not
    /// compile and [`RegistrationError::DuplicatePattern`] when an equivalent
    /// pattern is already registered.
    pub fn register<F>(&mut self, pattern: &str, handler: F) -> Result<(), RegistrationError>
    where
        F: for<'a> Fn(&'a mut ExecutionContext, StepArgs) -> StepFuture<'a> + Send + Sync + 'static,
    {
        self.insert(None, pattern, handler)
    }

    /// Register a step listed under `Given`. Matching ignores the keyword.
    ///
    /// # Errors
    /// As [`register`](Self::register).
    pub fn given<F>(&mut self, pattern: &str, handler: F) -> Result<(), RegistrationError>
    where
        F: for<'a> Fn(&'a mut ExecutionContext, StepArgs) -> StepFuture<'a> + Send + Sync + 'static,
    {
        self.insert(Some(StepKeyword::Given), pattern, handler)
    }

    /// Register a step listed under `When`. Matching ignores the keyword.
    ///
    /// # Errors
    /// As [`register`](Self::register).
    pub fn when<F>(&mut self, pattern: &str, handler: F) -> Result<(), RegistrationError>
    where
        F: for<'a> Fn(&'a mut ExecutionContext, StepArgs) -> StepFuture<'a> + Send + Sync + 'static,
    {
        self.insert(Some(StepKeyword::When), pattern, handler)
    }

    /// Register a step listed under `Then`. Matching ignores the keyword.
    ///
    /// # Errors
    /// As [`register`](Self::register).
    pub fn then<F>(&mut self, pattern: &str, handler: F) -> Result<(), RegistrationError>
    where
        F: for<'a> Fn(&'a mut ExecutionContext, StepArgs) -> StepFuture<'a> + Send + Sync + 'static,
    {
        self.insert(Some(StepKeyword::Then), pattern, handler)
    }

    /// Number of registered definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definitions in registration order.
    #[must_use]
    pub fn definitions(&self) -> &[Arc<StepDefinition>] {
        &self.definitions
    }

    /// Bind `text` to the single definition whose pattern matches it.
    ///
    /// # Errors
    /// Returns [`BindingError::NoMatchingStep`] when nothing matches and
    /// [`BindingError::AmbiguousStep`] when several definitions do.
    pub fn resolve(&self, text: &str) -> Result<ResolvedStep, BindingError> {
        let mut matches = self.definitions.iter().filter_map(|definition| {
            definition
                .pattern
                .match_text(text)
                .map(|values| (definition, values))
        });
        let Some((definition, values)) = matches.next() else {
            return Err(BindingError::NoMatchingStep {
                text: text.to_owned(),
            });
        };
        let others: Vec<_> = matches.collect();
        if !others.is_empty() {
            let candidates = std::iter::once(definition)
                .chain(others.into_iter().map(|(other, _)| other))
                .map(|candidate| candidate.pattern.source().to_owned())
                .collect();
            return Err(BindingError::AmbiguousStep {
                text: text.to_owned(),
                candidates,
            });
        }
        Ok(ResolvedStep {
            definition: Arc::clone(definition),
            args: StepArgs::new(values),
        })
    }

    /// Bind `step`, attaching its doc string and data table to the arguments.
    ///
    /// # Errors
    /// As [`resolve`](Self::resolve).
    pub fn resolve_step(&self, step: &Step) -> Result<ResolvedStep, BindingError> {
        let mut resolved = self.resolve(&step.text)?;
        resolved.args = resolved
            .args
            .with_docstring(step.docstring.clone())
            .with_table(step.table.clone());
        Ok(resolved)
    }
}
