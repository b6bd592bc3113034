//! What a run will execute.

use camino::Utf8Path;
use tracing::debug;

use crate::error::ParseError;
use crate::feature::{ExpandedFeature, FeatureDocument, Scenario, load_feature};
use crate::registry::{BindingDiagnostic, StepRegistry};
use crate::reporting::SetupFailure;

/// A scenario together with the feature it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedScenario {
    /// Source name of the feature.
    pub feature: String,
    /// The concrete scenario.
    pub scenario: Scenario,
}

/// Scenarios sharing one role's session state, or none for the anonymous
/// suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite<'a> {
    /// Role from `@role:<name>`.
    pub role: Option<&'a str>,
    /// Members in document order.
    pub scenarios: Vec<&'a PlannedScenario>,
}

/// Scenarios to run, in document order, with the failures met while
/// preparing them.
///
/// Scenarios tagged `@login:<role>` are held apart as login flows and are
/// not executed as tests.
#[derive(Debug, Clone, Default)]
pub struct RunPlan {
    scenarios: Vec<PlannedScenario>,
    login_scenarios: Vec<Scenario>,
    setup_failures: Vec<SetupFailure>,
}

impl RunPlan {
    /// An empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand `documents` in the order given.
    #[must_use]
    pub fn from_documents(documents: impl IntoIterator<Item = FeatureDocument>) -> Self {
        let mut plan = Self::new();
        for document in documents {
            plan.add_feature(document);
        }
        plan
    }

    /// Parse and expand every file in `paths`, in order.
    ///
    /// A file that cannot be read or parsed becomes a setup failure; the
    /// remaining files are still planned.
    #[must_use]
    pub fn load<P: AsRef<Utf8Path>>(paths: impl IntoIterator<Item = P>) -> Self {
        let mut plan = Self::new();
        for path in paths {
            match load_feature(path.as_ref()) {
                Ok(document) => plan.add_feature(document),
                Err(err) => plan.add_parse_error(&err),
            }
        }
        plan
    }

    /// Expand `document` and append its scenarios.
    pub fn add_feature(&mut self, document: FeatureDocument) {
        let ExpandedFeature {
            source,
            scenarios,
            errors,
            ..
        } = document.expand();
        self.setup_failures
            .extend(errors.iter().map(SetupFailure::from));
        for scenario in scenarios {
            if scenario.login_role().is_some() {
                self.login_scenarios.push(scenario);
            } else {
                self.scenarios.push(PlannedScenario {
                    feature: source.clone(),
                    scenario,
                });
            }
        }
        debug!(feature = %source, scenarios = self.scenarios.len(), "feature planned");
    }

    /// Record a feature that failed to parse.
    pub fn add_parse_error(&mut self, err: &ParseError) {
        self.setup_failures.push(SetupFailure::from(err));
    }

    /// Keep only the suites of `roles`.
    ///
    /// An empty `roles` keeps every suite. Otherwise the anonymous suite is
    /// kept only when `include_anonymous` is set.
    #[must_use]
    pub fn select_roles(mut self, roles: &[String], include_anonymous: bool) -> Self {
        if roles.is_empty() {
            return self;
        }
        self.scenarios.retain(|planned| match planned.scenario.role() {
            Some(role) => roles.iter().any(|wanted| wanted == role),
            None => include_anonymous,
        });
        self
    }

    /// Scenarios to run in document order.
    #[must_use]
    pub fn scenarios(&self) -> &[PlannedScenario] {
        &self.scenarios
    }

    /// Number of scenarios to run.
    #[must_use]
    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Scenarios tagged `@login:<role>`.
    #[must_use]
    pub fn login_scenarios(&self) -> &[Scenario] {
        &self.login_scenarios
    }

    /// Failures met while planning.
    #[must_use]
    pub fn setup_failures(&self) -> &[SetupFailure] {
        &self.setup_failures
    }

    /// Distinct roles needed by the plan, in order of first appearance.
    #[must_use]
    pub fn roles(&self) -> Vec<&str> {
        let mut roles: Vec<&str> = Vec::new();
        for role in self.scenarios.iter().filter_map(|p| p.scenario.role()) {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        roles
    }

    /// Bind every step of the plan, login scenarios included, without
    /// running anything.
    #[must_use]
    pub fn validate(&self, registry: &StepRegistry) -> Vec<BindingDiagnostic> {
        let scenarios = self
            .scenarios
            .iter()
            .map(|planned| &planned.scenario)
            .chain(&self.login_scenarios);
        registry.validate(scenarios)
    }

    /// Scenarios grouped by role, suites in order of first appearance.
    #[must_use]
    pub fn suites(&self) -> Vec<Suite<'_>> {
        let mut suites: Vec<Suite<'_>> = Vec::new();
        for planned in &self.scenarios {
            let role = planned.scenario.role();
            match suites.iter_mut().find(|suite| suite.role == role) {
                Some(suite) => suite.scenarios.push(planned),
                None => suites.push(Suite {
                    role,
                    scenarios: vec![planned],
                }),
            }
        }
        suites
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::feature::parse_feature;
    use crate::reporting::SetupFailureKind;

    const SHOP: &str = "\
Feature: Shop
  Scenario: Browse anonymously
    Given the User is on the login page

  @role:standard_user
  Scenario: Add to cart
    Given the User is on the products page

  @role:admin
  Scenario: Manage stock
    Given the User is on the inventory page

  @login:admin
  Scenario: Admin login
    Given the User logs in as \"admin\"

  @role:standard_user
  Scenario: Check out
    Given the User is on the cart page
";

    const BROKEN_OUTLINE: &str = "\
Feature: Broken
  Scenario Outline: Uses <missing>
    Given the User types \"<value>\"
    Examples:
      | value |
      | a     |
";

    #[fixture]
    fn plan() -> RunPlan {
        let Ok(document) = parse_feature("shop.feature", SHOP) else {
            panic!("fixture should parse");
        };
        RunPlan::from_documents([document])
    }

    fn names(plan: &RunPlan) -> Vec<&str> {
        plan.scenarios()
            .iter()
            .map(|planned| planned.scenario.name.as_str())
            .collect()
    }

    #[rstest]
    fn login_scenarios_are_held_apart(plan: RunPlan) {
        assert_eq!(plan.scenario_count(), 4);
        assert_eq!(plan.login_scenarios().len(), 1);
        assert!(!names(&plan).contains(&"Admin login"));
    }

    #[rstest]
    fn roles_follow_first_appearance(plan: RunPlan) {
        assert_eq!(plan.roles(), ["standard_user", "admin"]);
        let suites: Vec<_> = plan
            .suites()
            .iter()
            .map(|suite| (suite.role, suite.scenarios.len()))
            .collect();
        assert_eq!(
            suites,
            [(None, 1), (Some("standard_user"), 2), (Some("admin"), 1)]
        );
    }

    #[rstest]
    #[case::everything(&[], false, &["Browse anonymously", "Add to cart", "Manage stock", "Check out"])]
    #[case::one_role(&["standard_user"], false, &["Add to cart", "Check out"])]
    #[case::with_anonymous(&["admin"], true, &["Browse anonymously", "Manage stock"])]
    #[case::unknown_role(&["ghost"], false, &[])]
    fn selects_suites_by_role(
        plan: RunPlan,
        #[case] roles: &[&str],
        #[case] include_anonymous: bool,
        #[case] expected: &[&str],
    ) {
        let roles: Vec<String> = roles.iter().map(|role| (*role).to_owned()).collect();
        let plan = plan.select_roles(&roles, include_anonymous);
        assert_eq!(names(&plan), expected);
    }

    #[test]
    fn expansion_errors_become_setup_failures() {
        let Ok(document) = parse_feature("broken.feature", BROKEN_OUTLINE) else {
            panic!("outline should parse");
        };
        let plan = RunPlan::from_documents([document]);
        assert_eq!(plan.scenario_count(), 0);
        assert!(matches!(
            plan.setup_failures(),
            [SetupFailure {
                kind: SetupFailureKind::Expansion,
                ..
            }]
        ));
    }

    #[rstest]
    fn validate_covers_login_scenarios(plan: RunPlan) {
        let diagnostics = plan.validate(&StepRegistry::new());
        assert_eq!(diagnostics.len(), 5);
        assert!(
            diagnostics
                .iter()
                .any(|d| d.scenario == "Admin login" && d.line == 15)
        );
    }

    #[test]
    fn unreadable_files_become_setup_failures() {
        let plan = RunPlan::load(["does/not/exist.feature"]);
        assert!(matches!(
            plan.setup_failures(),
            [SetupFailure {
                kind: SetupFailureKind::Parse,
                ..
            }]
        ));
    }
}
