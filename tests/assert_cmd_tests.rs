//! Integration tests for CLI execution using `assert_cmd`.
//!
//! These tests exercise end-to-end command handling by invoking the
//! compiled binary against temporary projects: a full generation run, the
//! no-configs contract diagnostic, and a missing configuration file.

use anyhow::{Context, Result, ensure};
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

const TODO_DOC: &str = r#"{
  "uri": "features/todo.feature",
  "feature": "Todo",
  "pickles": [
    {
      "id": "p1",
      "name": "Add item",
      "tags": ["@smoke"],
      "steps": [ { "keyword": "Given ", "text": "I open the app" } ]
    },
    {
      "id": "p2",
      "name": "Remove item",
      "tags": ["@wip"],
      "steps": [ { "keyword": "When ", "text": "I remove the item" } ]
    }
  ]
}"#;

#[test]
fn test_command_generates_files() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    fs::write(temp.path().join("todo.pickle.json"), TODO_DOC).context("write pickle doc")?;
    fs::write(
        temp.path().join("picklegen.yml"),
        concat!(
            "bdd:\n",
            "  - name: default\n",
            "    output_dir: .features-gen\n",
            "    paths: [\"*.pickle.json\"]\n",
            "    require: [\"steps/index\"]\n",
        ),
    )
    .context("write config")?;

    let mut cmd = Command::cargo_bin("picklegen").context("locate picklegen binary")?;
    cmd.current_dir(temp.path()).arg("test").assert().success();

    let generated = temp.path().join(".features-gen/features/todo.rs");
    ensure!(generated.is_file(), "generated test file should exist");
    let content = fs::read_to_string(&generated).context("read generated file")?;
    ensure!(
        content.contains("fn add_item()"),
        "generated file should contain the scenario function"
    );
    Ok(())
}

#[test]
fn tags_flag_overrides_declarative_filter() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    fs::write(temp.path().join("todo.pickle.json"), TODO_DOC).context("write pickle doc")?;
    fs::write(
        temp.path().join("picklegen.yml"),
        concat!(
            "bdd:\n",
            "  - output_dir: .features-gen\n",
            "    paths: [\"*.pickle.json\"]\n",
            "    tags: \"@wip\"\n",
        ),
    )
    .context("write config")?;

    let mut cmd = Command::cargo_bin("picklegen").context("locate picklegen binary")?;
    cmd.current_dir(temp.path())
        .args(["test", "--tags", "@smoke"])
        .assert()
        .success();

    let content = fs::read_to_string(temp.path().join(".features-gen/features/todo.rs"))
        .context("read generated file")?;
    ensure!(
        content.contains("fn add_item()") && !content.contains("fn remove_item()"),
        "CLI tag expression should win over the declarative one"
    );
    Ok(())
}

#[test]
fn no_configs_exits_with_contract_message() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    fs::write(temp.path().join("picklegen.yml"), "bdd: []\n").context("write config")?;

    let mut cmd = Command::cargo_bin("picklegen").context("locate picklegen binary")?;
    cmd.current_dir(temp.path())
        .arg("test")
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "No BDD configs found. Did you define a 'bdd' section in picklegen.yml?",
        ));
    Ok(())
}

#[test]
fn missing_config_file_fails_with_its_path() -> Result<()> {
    let temp = tempdir().context("create temp dir")?;
    let mut cmd = Command::cargo_bin("picklegen").context("locate picklegen binary")?;
    cmd.current_dir(temp.path())
        .args(["test", "--config", "absent.yml"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("absent.yml"));
    Ok(())
}
