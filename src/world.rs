//! Per-scenario invocation context.
//!
//! A [`World`] is created for each scenario execution and destroyed at its
//! end. It owns the built-in fixtures instantiated from the registry, the
//! scenario's tags, the native run record, and the transient custom-fixture
//! map that exists only for the duration of a single
//! [`invoke_step`](World::invoke_step) call.
//!
//! Steps execute strictly sequentially within a scenario. The custom-fixture
//! scope is installed and released around each invocation, so a handler that
//! itself calls `invoke_step` must not assume its own fixtures survive the
//! nested call.

use crate::pickle::PickleStepArgument;
use crate::runtime::{CallSite, NativeAttachment, TestCaseRun, TestStep};
use crate::steps::{FixtureValue, StepContext, StepRegistry, find_step_definition};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by World fixture and attachment operations.
#[derive(Debug, Error)]
pub enum WorldError {
    /// A fixture required by the matched definition was not provided.
    #[error("missing fixture '{name}' required by step definition '{pattern}'")]
    MissingFixture {
        /// Required fixture name.
        name: String,
        /// Pattern of the definition that required it.
        pattern: String,
    },

    /// A fixture exists but holds a different type than requested.
    #[error("fixture '{name}' has a different type than requested")]
    FixtureType {
        /// Fixture name.
        name: String,
    },

    /// A fixture name resolved to no value at all.
    #[error("unknown fixture '{name}'")]
    UnknownFixture {
        /// Fixture name.
        name: String,
    },

    /// An attachment was captured outside any step invocation.
    #[error("no step is currently executing")]
    NoActiveStep,
}

/// Inputs for creating a [`World`].
#[derive(Debug, Clone)]
pub struct WorldOptions {
    /// Identifier the host runner assigned to this scenario execution.
    pub run_id: String,

    /// Path of the generated test file driving this scenario.
    pub test_file: PathBuf,

    /// Tags attached to the scenario's pickle.
    pub tags: Vec<String>,
}

/// Per-scenario execution context.
pub struct World {
    registry: Arc<StepRegistry>,
    builtin_fixtures: HashMap<String, FixtureValue>,
    custom_fixtures: HashMap<String, FixtureValue>,
    tags: Vec<String>,
    test_file: PathBuf,
    run: TestCaseRun,
    active_step: Option<usize>,
}

impl World {
    /// Create the context for one scenario execution.
    ///
    /// Built-in fixtures are instantiated from the registry's factories at
    /// this point and live until the World is dropped.
    #[must_use]
    pub fn new(registry: Arc<StepRegistry>, options: WorldOptions) -> Self {
        let builtin_fixtures = registry.build_fixtures();
        Self {
            registry,
            builtin_fixtures,
            custom_fixtures: HashMap::new(),
            tags: options.tags,
            test_file: options.test_file,
            run: TestCaseRun::new(options.run_id),
            active_step: None,
        }
    }

    /// Tags of the running scenario.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Path of the generated test file driving this scenario.
    #[must_use]
    pub fn test_file(&self) -> &Path {
        &self.test_file
    }

    /// The native run record accumulated so far.
    #[must_use]
    pub fn test_case_run(&self) -> &TestCaseRun {
        &self.run
    }

    /// Consume the World at scenario end, yielding the native run record.
    #[must_use]
    pub fn into_test_case_run(self) -> TestCaseRun {
        self.run
    }

    /// Resolve and execute one step.
    ///
    /// Resolution searches the registry for `text`, constrained by this
    /// World's generated file. The extracted parameters and the structured
    /// argument are handed to the matched handler; custom fixtures are
    /// visible to the handler for exactly the duration of this call.
    ///
    /// The call site is captured here, before delegation, so failures
    /// reported by the runner point at the generated test file rather than
    /// at this module.
    ///
    /// # Errors
    ///
    /// Fails with an undefined-step error naming `text` verbatim when no
    /// definition matches, with a missing-fixture error when a required
    /// fixture is absent, and otherwise propagates the handler's own error
    /// unchanged.
    #[track_caller]
    pub fn invoke_step(
        &mut self,
        text: &str,
        argument: Option<PickleStepArgument>,
        custom_fixtures: Option<HashMap<String, FixtureValue>>,
    ) -> anyhow::Result<Value> {
        let call_site = CallSite::from(std::panic::Location::caller());

        let registry = Arc::clone(&self.registry);
        let step_match = find_step_definition(&registry, text, &self.test_file)?;
        let custom = custom_fixtures.unwrap_or_default();
        for name in &step_match.definition.required_fixtures {
            if !custom.contains_key(name) && !self.builtin_fixtures.contains_key(name) {
                return Err(WorldError::MissingFixture {
                    name: name.clone(),
                    pattern: step_match.definition.pattern.source().to_owned(),
                }
                .into());
            }
        }

        let handler = Arc::clone(&step_match.definition.handler);
        let context = StepContext {
            params: step_match.params,
            argument,
        };

        self.begin_step(text, call_site);
        let result = self.with_fixture_scope(custom, |world| handler(world, context));
        self.end_step();
        result
    }

    /// Install `fixtures` for the duration of `f`, releasing them on every
    /// exit path, including a panicking handler, so one invocation's
    /// fixtures never leak into the next.
    fn with_fixture_scope<T>(
        &mut self,
        fixtures: HashMap<String, FixtureValue>,
        f: impl FnOnce(&mut Self) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        struct Scope<'a>(&'a mut World);

        impl Drop for Scope<'_> {
            fn drop(&mut self) {
                self.0.custom_fixtures.clear();
            }
        }

        self.custom_fixtures = fixtures;
        let mut scope = Scope(self);
        f(&mut *scope.0)
    }

    fn begin_step(&mut self, text: &str, call_site: CallSite) {
        let id = format!("{}-step-{}", self.run.id, self.run.steps.len());
        self.run.steps.push(TestStep {
            id,
            title: text.to_owned(),
            call_site,
            attachments: Vec::new(),
        });
        self.active_step = Some(self.run.steps.len() - 1);
    }

    fn end_step(&mut self) {
        self.active_step = None;
    }

    /// Look up a fixture by name and downcast it to `T`.
    ///
    /// Custom fixtures installed for the current invocation shadow built-in
    /// ones of the same name.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownFixture`] when the name resolves to
    /// nothing and [`WorldError::FixtureType`] when the stored value is not
    /// a `T`.
    pub fn use_fixture<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, WorldError> {
        let value = self
            .custom_fixtures
            .get(name)
            .or_else(|| self.builtin_fixtures.get(name))
            .ok_or_else(|| WorldError::UnknownFixture {
                name: name.to_owned(),
            })?;
        Arc::clone(value)
            .downcast::<T>()
            .map_err(|_| WorldError::FixtureType {
                name: name.to_owned(),
            })
    }

    /// Whether a custom fixture with `name` is currently in scope.
    #[must_use]
    pub fn has_custom_fixture(&self, name: &str) -> bool {
        self.custom_fixtures.contains_key(name)
    }

    /// Capture an inline attachment on the step currently executing.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NoActiveStep`] outside an `invoke_step` call.
    pub fn attach(
        &mut self,
        name: impl Into<String>,
        media_type: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Result<(), WorldError> {
        self.push_attachment(NativeAttachment::inline(name, media_type, body))
    }

    /// Capture a file-backed attachment on the step currently executing.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NoActiveStep`] outside an `invoke_step` call.
    pub fn attach_file(
        &mut self,
        name: impl Into<String>,
        media_type: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Result<(), WorldError> {
        self.push_attachment(NativeAttachment::from_file(name, media_type, path))
    }

    fn push_attachment(&mut self, attachment: NativeAttachment) -> Result<(), WorldError> {
        let index = self.active_step.ok_or(WorldError::NoActiveStep)?;
        if let Some(step) = self.run.steps.get_mut(index) {
            step.attachments.push(attachment);
        }
        Ok(())
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("tags", &self.tags)
            .field("test_file", &self.test_file)
            .field("run", &self.run)
            .field("custom_fixtures", &self.custom_fixtures.keys().collect::<Vec<_>>())
            .field("builtin_fixtures", &self.builtin_fixtures.keys().collect::<Vec<_>>())
            .finish()
    }
}
