//! Step and fixture registration.
//!
//! The registry holds every step definition known to a test run: pattern,
//! handler, required fixture names, and the source location of the
//! registration call. It is populated imperatively during the host test
//! binary's load phase and immutable from the matcher's point of view
//! thereafter.

use crate::steps::pattern::{StepParam, StepPattern};
use crate::world::World;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Opaque fixture value: host-provided resources such as page or browser
/// handles are not inspectable by the core.
pub type FixtureValue = Arc<dyn Any + Send + Sync>;

/// Factory producing a built-in fixture value for a new scenario.
pub type FixtureFactory = Arc<dyn Fn() -> FixtureValue + Send + Sync>;

/// Step handler: receives the World and the resolved invocation payload.
pub type StepHandler = Arc<dyn Fn(&mut World, StepContext) -> anyhow::Result<Value> + Send + Sync>;

/// Payload assembled by the matcher for one handler call.
#[derive(Debug, Clone)]
pub struct StepContext {
    /// Positional parameters extracted from the step text.
    pub params: Vec<StepParam>,

    /// Structured argument carried by the pickle step, if any.
    pub argument: Option<crate::pickle::PickleStepArgument>,
}

/// Where a step definition was registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Source file of the registration call.
    pub file: String,

    /// Line of the registration call.
    pub line: u32,
}

impl SourceLocation {
    fn from_caller(location: &std::panic::Location<'_>) -> Self {
        Self {
            file: location.file().to_owned(),
            line: location.line(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A registered step definition.
#[derive(Clone)]
pub struct StepDefinition {
    /// Text matcher for this definition.
    pub pattern: StepPattern,

    /// Handler executed when a step resolves to this definition.
    pub handler: StepHandler,

    /// Fixture names the handler requires to be present.
    pub required_fixtures: Vec<String>,

    /// Registration call site.
    pub location: SourceLocation,

    /// Optional path prefix restricting which generated files may use this
    /// definition.
    pub scope: Option<PathBuf>,
}

impl Debug for StepDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("pattern", &self.pattern.source())
            .field("required_fixtures", &self.required_fixtures)
            .field("location", &self.location)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Errors raised at registration time.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two definitions share a pattern visible from the same files, which
    /// would make matching ambiguous at run time.
    #[error("duplicate step pattern '{pattern}': first registered at {first}, again at {second}")]
    DuplicatePattern {
        /// Shared pattern text.
        pattern: String,
        /// Location of the earlier registration.
        first: SourceLocation,
        /// Location of the rejected registration.
        second: SourceLocation,
    },
}

/// Holds every registered step definition and fixture factory.
#[derive(Default, Clone)]
pub struct StepRegistry {
    steps: Vec<StepDefinition>,
    fixtures: HashMap<String, FixtureFactory>,
}

impl Debug for StepRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepRegistry")
            .field("steps", &self.steps)
            .field("fixtures", &self.fixtures.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StepRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a step definition.
    ///
    /// The registration call site is captured automatically and later used
    /// for ambiguity diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicatePattern`] when an identical pattern
    /// was already registered for the same scope. Matching must stay
    /// unambiguous, so ties are refused here rather than arbitrated later.
    #[track_caller]
    pub fn register_step(
        &mut self,
        pattern: StepPattern,
        handler: StepHandler,
        required_fixtures: &[&str],
    ) -> Result<(), RegistryError> {
        let location = SourceLocation::from_caller(std::panic::Location::caller());
        self.insert_step(pattern, handler, required_fixtures, location, None)
    }

    /// Register a step definition visible only to generated files under the
    /// given path prefix.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicatePattern`] as [`Self::register_step`]
    /// does, comparing only definitions with the same scope.
    #[track_caller]
    pub fn register_scoped_step(
        &mut self,
        pattern: StepPattern,
        handler: StepHandler,
        required_fixtures: &[&str],
        scope: PathBuf,
    ) -> Result<(), RegistryError> {
        let location = SourceLocation::from_caller(std::panic::Location::caller());
        self.insert_step(pattern, handler, required_fixtures, location, Some(scope))
    }

    fn insert_step(
        &mut self,
        pattern: StepPattern,
        handler: StepHandler,
        required_fixtures: &[&str],
        location: SourceLocation,
        scope: Option<PathBuf>,
    ) -> Result<(), RegistryError> {
        if let Some(existing) = self
            .steps
            .iter()
            .find(|def| def.pattern.source() == pattern.source() && def.scope == scope)
        {
            return Err(RegistryError::DuplicatePattern {
                pattern: pattern.source().to_owned(),
                first: existing.location.clone(),
                second: location,
            });
        }
        self.steps.push(StepDefinition {
            pattern,
            handler,
            required_fixtures: required_fixtures.iter().map(|name| (*name).to_owned()).collect(),
            location,
            scope,
        });
        Ok(())
    }

    /// Register a built-in fixture factory under the given name.
    ///
    /// Factories run once per scenario when the World is created; the last
    /// registration for a name wins.
    pub fn register_fixture(&mut self, name: impl Into<String>, factory: FixtureFactory) {
        self.fixtures.insert(name.into(), factory);
    }

    /// All registered definitions, in registration order.
    #[must_use]
    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    /// Whether a built-in fixture factory exists for `name`.
    #[must_use]
    pub fn has_fixture(&self, name: &str) -> bool {
        self.fixtures.contains_key(name)
    }

    /// Instantiate every built-in fixture for a new scenario.
    #[must_use]
    pub fn build_fixtures(&self) -> HashMap<String, FixtureValue> {
        self.fixtures
            .iter()
            .map(|(name, factory)| (name.clone(), factory()))
            .collect()
    }
}
