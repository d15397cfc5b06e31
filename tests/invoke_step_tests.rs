#![allow(
    clippy::expect_used,
    reason = "invocation tests use expect for descriptive failures"
)]

//! Unit tests for step invocation through the World.
//!
//! Covers resolution against the registry, custom-fixture scoping,
//! call-site capture, and error propagation from handlers.

use picklegen::pickle::{PickleDocString, PickleStepArgument, parse_step_argument};
use picklegen::steps::{FixtureFactory, FixtureValue, StepHandler, StepPattern, StepRegistry};
use picklegen::world::{World, WorldOptions};
use rstest::rstest;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

fn world_for(registry: StepRegistry, test_file: &str) -> World {
    World::new(
        Arc::new(registry),
        WorldOptions {
            run_id: "run-1".into(),
            test_file: PathBuf::from(test_file),
            tags: vec!["@smoke".into()],
        },
    )
}

fn ok_handler(value: Value) -> StepHandler {
    Arc::new(move |_world, _ctx| Ok(value.clone()))
}

#[rstest]
fn literal_step_calls_handler_and_returns_its_result() {
    let mut registry = StepRegistry::new();
    let handler: StepHandler = Arc::new(|_world, ctx| {
        assert!(ctx.params.is_empty());
        Ok(json!("clicked"))
    });
    registry
        .register_step(StepPattern::literal("I click button"), handler, &[])
        .expect("register");

    let mut world = world_for(registry, "/gen/todo.rs");
    let result = world
        .invoke_step("I click button", None, None)
        .expect("invoke");
    assert_eq!(result, json!("clicked"));
}

#[rstest]
fn undefined_step_names_the_text_verbatim() {
    let mut world = world_for(StepRegistry::new(), "/gen/todo.rs");
    let err = world
        .invoke_step("I do not exist", None, None)
        .expect_err("unexpected success");
    assert_eq!(err.to_string(), "Undefined step: \"I do not exist\"");
}

#[rstest]
fn cucumber_expression_parameters_reach_the_handler() {
    let mut registry = StepRegistry::new();
    let handler: StepHandler = Arc::new(|_world, ctx| Ok(json!(format!("{:?}", ctx.params))));
    registry
        .register_step(
            StepPattern::cucumber("I have {int} cukes").expect("compile"),
            handler,
            &[],
        )
        .expect("register");

    let mut world = world_for(registry, "/gen/todo.rs");
    let result = world
        .invoke_step("I have 5 cukes", None, None)
        .expect("invoke");
    assert_eq!(result, json!("[Int(5)]"));
}

#[rstest]
fn doc_string_argument_is_passed_through_unchanged() {
    let mut registry = StepRegistry::new();
    let handler: StepHandler = Arc::new(|_world, ctx| {
        let argument = ctx.argument.as_ref().expect("argument");
        let content = parse_step_argument(
            argument,
            |table| format!("table with {} rows", table.rows.len()),
            |doc_string| doc_string.content.clone(),
        )?;
        Ok(json!(content))
    });
    registry
        .register_step(StepPattern::literal("a doc"), handler, &[])
        .expect("register");

    let argument = PickleStepArgument {
        data_table: None,
        doc_string: Some(PickleDocString {
            media_type: None,
            content: "hello".into(),
        }),
    };
    let mut world = world_for(registry, "/gen/todo.rs");
    let result = world
        .invoke_step("a doc", Some(argument), None)
        .expect("invoke");
    assert_eq!(result, json!("hello"));
}

#[rstest]
fn custom_fixtures_are_scoped_to_one_invocation() {
    let mut registry = StepRegistry::new();
    let reader: StepHandler = Arc::new(|world, _ctx| {
        let greeting = world.use_fixture::<String>("greeting")?;
        Ok(json!(greeting.as_str()))
    });
    let checker: StepHandler =
        Arc::new(|world, _ctx| Ok(json!(world.has_custom_fixture("greeting"))));
    registry
        .register_step(StepPattern::literal("I read the fixture"), reader, &[])
        .expect("register");
    registry
        .register_step(StepPattern::literal("I check the fixture"), checker, &[])
        .expect("register");

    let mut world = world_for(registry, "/gen/todo.rs");
    let fixtures: HashMap<String, FixtureValue> = HashMap::from([(
        "greeting".to_owned(),
        Arc::new(String::from("hi")) as FixtureValue,
    )]);
    let result = world
        .invoke_step("I read the fixture", None, Some(fixtures))
        .expect("invoke");
    assert_eq!(result, json!("hi"));

    // The fixture must not be visible in any later call on the same World.
    assert!(!world.has_custom_fixture("greeting"));
    let visible = world
        .invoke_step("I check the fixture", None, None)
        .expect("invoke");
    assert_eq!(visible, json!(false));
}

#[rstest]
fn custom_fixtures_are_cleared_even_when_the_handler_fails() {
    let mut registry = StepRegistry::new();
    let failing: StepHandler = Arc::new(|_world, _ctx| anyhow::bail!("boom"));
    registry
        .register_step(StepPattern::literal("I fail"), failing, &[])
        .expect("register");

    let mut world = world_for(registry, "/gen/todo.rs");
    let fixtures: HashMap<String, FixtureValue> =
        HashMap::from([("greeting".to_owned(), Arc::new(1_i32) as FixtureValue)]);
    let err = world
        .invoke_step("I fail", None, Some(fixtures))
        .expect_err("unexpected success");
    assert_eq!(err.to_string(), "boom");
    assert!(!world.has_custom_fixture("greeting"));
}

#[rstest]
fn custom_fixtures_are_cleared_even_when_the_handler_panics() {
    let mut registry = StepRegistry::new();
    let panicking: StepHandler = Arc::new(|_world, _ctx| panic!("handler fell over"));
    registry
        .register_step(StepPattern::literal("I fall over"), panicking, &[])
        .expect("register");

    let mut world = world_for(registry, "/gen/todo.rs");
    let fixtures: HashMap<String, FixtureValue> =
        HashMap::from([("greeting".to_owned(), Arc::new(1_i32) as FixtureValue)]);
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = world.invoke_step("I fall over", None, Some(fixtures));
    }));
    assert!(outcome.is_err());
    assert!(!world.has_custom_fixture("greeting"));
}

#[rstest]
fn missing_required_fixture_is_rejected_before_invocation() {
    let mut registry = StepRegistry::new();
    registry
        .register_step(
            StepPattern::literal("I need a page"),
            ok_handler(Value::Null),
            &["page"],
        )
        .expect("register");

    let mut world = world_for(registry, "/gen/todo.rs");
    let err = world
        .invoke_step("I need a page", None, None)
        .expect_err("unexpected success");
    assert!(err.to_string().contains("missing fixture 'page'"));
    assert!(world.test_case_run().steps.is_empty());
}

#[rstest]
fn builtin_fixtures_satisfy_required_fixtures() {
    let mut registry = StepRegistry::new();
    let factory: FixtureFactory =
        Arc::new(|| Arc::new(String::from("page-handle")) as FixtureValue);
    registry.register_fixture("page", factory);
    let handler: StepHandler = Arc::new(|world, _ctx| {
        let page = world.use_fixture::<String>("page")?;
        Ok(json!(page.as_str()))
    });
    registry
        .register_step(StepPattern::literal("I need a page"), handler, &["page"])
        .expect("register");

    let mut world = world_for(registry, "/gen/todo.rs");
    let result = world
        .invoke_step("I need a page", None, None)
        .expect("invoke");
    assert_eq!(result, json!("page-handle"));
}

#[rstest]
fn scoped_definitions_only_match_their_files() {
    let mut registry = StepRegistry::new();
    registry
        .register_scoped_step(
            StepPattern::literal("a scoped step"),
            ok_handler(json!("scoped")),
            &[],
            PathBuf::from("/gen/chromium"),
        )
        .expect("register");

    let mut matching = world_for(registry.clone(), "/gen/chromium/todo.rs");
    assert_eq!(
        matching
            .invoke_step("a scoped step", None, None)
            .expect("invoke"),
        json!("scoped"),
    );

    let mut other = world_for(registry, "/gen/firefox/todo.rs");
    let err = other
        .invoke_step("a scoped step", None, None)
        .expect_err("unexpected success");
    assert_eq!(err.to_string(), "Undefined step: \"a scoped step\"");
}

#[rstest]
fn ambiguous_match_is_refused() {
    let mut registry = StepRegistry::new();
    registry
        .register_step(
            StepPattern::regex("I have .* cukes").expect("compile"),
            ok_handler(Value::Null),
            &[],
        )
        .expect("register");
    registry
        .register_step(
            StepPattern::regex(r"I have \d+ cukes").expect("compile"),
            ok_handler(Value::Null),
            &[],
        )
        .expect("register");

    let mut world = world_for(registry, "/gen/todo.rs");
    let err = world
        .invoke_step("I have 5 cukes", None, None)
        .expect_err("unexpected success");
    assert!(err.to_string().starts_with("Ambiguous step: \"I have 5 cukes\""));
}

#[rstest]
fn duplicate_registration_is_rejected_up_front() {
    let mut registry = StepRegistry::new();
    registry
        .register_step(StepPattern::literal("twice"), ok_handler(Value::Null), &[])
        .expect("register");
    let err = registry
        .register_step(StepPattern::literal("twice"), ok_handler(Value::Null), &[])
        .expect_err("unexpected success");
    assert!(err.to_string().contains("duplicate step pattern 'twice'"));
}

#[rstest]
fn call_site_points_at_the_invoking_file() {
    let mut registry = StepRegistry::new();
    registry
        .register_step(
            StepPattern::literal("I click button"),
            ok_handler(Value::Null),
            &[],
        )
        .expect("register");

    let mut world = world_for(registry, "/gen/todo.rs");
    world
        .invoke_step("I click button", None, None)
        .expect("invoke");
    let run = world.test_case_run();
    assert_eq!(run.steps.len(), 1);
    assert!(run.steps[0].call_site.file.ends_with("invoke_step_tests.rs"));
    assert_eq!(run.steps[0].title, "I click button");
}
