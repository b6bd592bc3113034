//! Runs a small suite through the command-line entry point.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use pagewright::browser::{BrowserError, Locator};
use pagewright::test_support::RecordingBrowser;
use pagewright::{
    BrowserAdapter, ExecutionContext, RegistrationError, RunConfig, StepArgs, StepError,
    StepFuture, StepRegistry,
};
use pagewright_cli::{Cli, Outcome, Project, execute};
use rstest::{fixture, rstest};
use tempfile::TempDir;

const LOGIN: &str = r#"Feature: Login
  Scenario Outline: Log in
    Given the User is on the login page
    When the User logs in as "<user>"
    Then the User should see the "Products" title

    Examples:
      | user          |
      | standard_user |
      | problem_user  |
"#;

const SHOP: &str = r#"Feature: Shop
  @login:standard_user
  Scenario: Standard login
    Given the User is on the login page
    When the User logs in as "standard_user"

  @role:standard_user
  Scenario: Products
    Then the User should see the "Products" title
"#;

fn open_login(ctx: &mut ExecutionContext, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        ctx.page()?.goto("/").await?;
        Ok(())
    })
}

fn log_in(ctx: &mut ExecutionContext, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let page = ctx.page()?;
        page.fill(&Locator::test_id("username"), args.string(0)?)
            .await?;
        page.click(&Locator::test_id("login-button")).await?;
        Ok(())
    })
}

fn sees_title(ctx: &mut ExecutionContext, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let expected = args.string(0)?;
        let actual = ctx.page()?.text_content(&Locator::css(".title")).await?;
        if actual == expected {
            Ok(())
        } else {
            Err(StepError::assertion(format!("title is '{actual}'")))
        }
    })
}

struct Shop {
    browser: RecordingBrowser,
    register_twice: bool,
    overlapping: bool,
}

impl Project for Shop {
    fn register_steps(&self, registry: &mut StepRegistry) -> Result<(), RegistrationError> {
        registry.given("the User is on the login page", open_login)?;
        registry.when("the User logs in as {string}", log_in)?;
        registry.then("the User should see the {string} title", sees_title)?;
        if self.register_twice {
            registry.when("the User is on the login page", open_login)?;
        }
        if self.overlapping {
            registry.then("the cart has {int} items", sees_title)?;
            registry.then("the cart has {word} items", sees_title)?;
        }
        Ok(())
    }

    fn browser(&self, _config: &RunConfig) -> eyre::Result<Arc<dyn BrowserAdapter>> {
        Ok(Arc::new(self.browser.clone()))
    }
}

struct Workspace {
    _temp: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    fn features(&self) -> Utf8PathBuf {
        self.root.join("features")
    }

    fn state(&self) -> Utf8PathBuf {
        self.root.join("state")
    }

    fn report(&self) -> Utf8PathBuf {
        self.root.join("out/report.json")
    }

    fn write_feature(&self, name: &str, text: &str) {
        assert!(std::fs::write(self.features().join(name), text).is_ok());
    }

    fn report_json(&self) -> serde_json::Value {
        let Ok(text) = std::fs::read_to_string(self.report()) else {
            panic!("report should exist");
        };
        match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(err) => panic!("report should be JSON: {err}"),
        }
    }

    fn cli(&self, extra: &[&str]) -> Cli {
        let features = self.features();
        let state = self.state();
        let report = self.report();
        let mut argv = vec![
            "pagewright",
            "--features",
            features.as_str(),
            "--state-dir",
            state.as_str(),
            "--report",
            report.as_str(),
            "--log-level",
            "warn",
        ];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => panic!("arguments should parse: {err}"),
        }
    }
}

#[fixture]
fn workspace() -> Workspace {
    #[expect(clippy::expect_used, reason = "tests need a scratch directory")]
    let temp = tempfile::tempdir().expect("create temp dir");
    #[expect(clippy::expect_used, reason = "temp dirs have UTF-8 paths in tests")]
    let root = Utf8Path::from_path(temp.path())
        .expect("utf-8 temp path")
        .to_owned();
    let workspace = Workspace { _temp: temp, root };
    assert!(std::fs::create_dir_all(workspace.features()).is_ok());
    workspace.write_feature("login.feature", LOGIN);
    workspace.write_feature("shop.feature", SHOP);
    workspace
}

#[fixture]
fn shop() -> Shop {
    let browser = RecordingBrowser::new();
    browser.set_text(Locator::css(".title"), "Products");
    Shop {
        browser,
        register_twice: false,
        overlapping: false,
    }
}

#[rstest]
fn passing_suite_exits_cleanly(workspace: Workspace, shop: Shop) {
    let outcome = execute(&shop, &workspace.cli(&[]), RunConfig::default());

    assert_eq!(outcome, Outcome::Passed);
    assert_eq!(outcome.code(), 0);
    let report = workspace.report_json();
    #[expect(clippy::indexing_slicing, reason = "JSON assertions index for clarity")]
    let (passed, success) = (
        report["summary"]["passed"].clone(),
        report["summary"]["success"].clone(),
    );
    assert_eq!(passed, 3);
    assert_eq!(success, true);
    assert!(workspace.state().join("standard_user.json").exists());
}

#[rstest]
fn failing_step_fails_the_run(workspace: Workspace, shop: Shop) {
    shop.browser.fail_on(
        "goto /",
        BrowserError::Navigation {
            url: "/".into(),
            reason: "connection refused".into(),
        },
    );
    let outcome = execute(&shop, &workspace.cli(&[]), RunConfig::default());

    assert_eq!(outcome.code(), 1);
    let report = workspace.report_json();
    #[expect(clippy::indexing_slicing, reason = "JSON assertions index for clarity")]
    let (failed, setup_failures) = (
        report["summary"]["failed"].clone(),
        report["setup_failures"].as_array().map(Vec::len),
    );
    assert_eq!(failed, 3);
    assert_eq!(setup_failures, Some(1));
}

#[rstest]
fn role_selection_limits_the_run(workspace: Workspace, shop: Shop) {
    let cli = workspace.cli(&["--role", "standard_user"]);
    let outcome = execute(&shop, &cli, RunConfig::default());

    assert_eq!(outcome, Outcome::Passed);
    let report = workspace.report_json();
    #[expect(clippy::indexing_slicing, reason = "JSON assertions index for clarity")]
    let names: Vec<_> = report["scenarios"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|scenario| scenario["scenario"].as_str().map(str::to_owned))
        .collect();
    assert_eq!(names, ["Products"]);
}

#[rstest]
fn missing_features_directory_exits_with_two(workspace: Workspace, shop: Shop) {
    assert!(std::fs::remove_dir_all(workspace.features()).is_ok());
    let outcome = execute(&shop, &workspace.cli(&[]), RunConfig::default());
    assert_eq!(outcome, Outcome::ConfigError);
    assert_eq!(outcome.code(), 2);
    assert_eq!(shop.browser.opened_pages(), 0);
}

#[rstest]
fn zero_workers_exits_with_two(workspace: Workspace, shop: Shop) {
    let outcome = execute(&shop, &workspace.cli(&["--workers", "0"]), RunConfig::default());
    assert_eq!(outcome, Outcome::ConfigError);
    assert_eq!(shop.browser.opened_pages(), 0);
}

#[rstest]
fn duplicate_patterns_are_a_configuration_error(workspace: Workspace, mut shop: Shop) {
    shop.register_twice = true;
    let outcome = execute(&shop, &workspace.cli(&[]), RunConfig::default());
    assert_eq!(outcome, Outcome::ConfigError);
}

#[rstest]
fn check_binds_without_opening_pages(workspace: Workspace, shop: Shop) {
    assert_eq!(
        execute(&shop, &workspace.cli(&["--check"]), RunConfig::default()),
        Outcome::Passed
    );
    workspace.write_feature(
        "broken.feature",
        "Feature: Broken\n  Scenario: Waving\n    Given the User waves\n",
    );
    assert_eq!(
        execute(&shop, &workspace.cli(&["--check"]), RunConfig::default()),
        Outcome::Failed
    );
    assert_eq!(shop.browser.opened_pages(), 0);
}

#[rstest]
fn check_fails_on_overlapping_patterns(workspace: Workspace, mut shop: Shop) {
    shop.overlapping = true;
    assert_eq!(
        execute(&shop, &workspace.cli(&["--check"]), RunConfig::default()),
        Outcome::Failed
    );
    assert_eq!(shop.browser.opened_pages(), 0);
}
