//! Step registration and matching engine.
//!
//! Split into the pattern kinds ([`pattern`]), the registry populated at
//! load time ([`registry`]), and the resolver used by
//! [`World::invoke_step`](crate::world::World::invoke_step) ([`matcher`]).

pub mod matcher;
pub mod pattern;
pub mod registry;

pub use matcher::{StepMatch, StepMatchError, find_step_definition};
pub use pattern::{PatternError, StepParam, StepPattern};
pub use registry::{
    FixtureFactory, FixtureValue, RegistryError, SourceLocation, StepContext, StepDefinition,
    StepHandler, StepRegistry,
};
