//! Feature documents: parsing, discovery and outline expansion.
//!
//! Parsing accepts the Gherkin subset the runner executes: `Feature`,
//! `Background`, `Rule`, `Scenario`, `Scenario Outline`/`Scenario Template`
//! with `Examples`, tags, data tables and doc strings. Background steps are
//! prepended to each scenario they apply to, and feature and rule tags are
//! inherited by their scenarios. Tags are stored with their leading `@`.

mod expand;
mod prescan;

use camino::{Utf8Path, Utf8PathBuf};
use gherkin::GherkinEnv;
use pagewright_patterns::StepKeyword;
use tracing::warn;
use walkdir::WalkDir;

use crate::error::{ExpansionError, ParseError, ParseErrorKind};

/// Tag prefix assigning a scenario to a role's suite.
pub const ROLE_TAG_PREFIX: &str = "@role:";
/// Tag prefix marking a scenario as the login flow for a role.
pub const LOGIN_TAG_PREFIX: &str = "@login:";
/// Tag marking a scenario that must not run.
pub const SKIP_TAG: &str = "@skip";

/// One step line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Keyword as written. Carries no behaviour.
    pub keyword: StepKeyword,
    /// Step text without the keyword, with outline values substituted.
    pub text: String,
    /// One-based line in the feature file.
    pub line: usize,
    /// Attached doc string.
    pub docstring: Option<String>,
    /// Attached data table, header row included.
    pub table: Option<Vec<Vec<String>>>,
}

/// The Examples row a scenario was expanded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleRef {
    /// Zero-based position among the outline's rows.
    pub index: usize,
    /// One-based line of the row.
    pub line: usize,
    /// Column name and value pairs in column order.
    pub values: Vec<(String, String)>,
}

/// A concrete, executable scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Own and inherited tags.
    pub tags: Vec<String>,
    /// One-based line of the scenario header.
    pub line: usize,
    /// Steps in execution order, background steps first.
    pub steps: Vec<Step>,
    /// Set when the scenario came from an outline.
    pub example: Option<ExampleRef>,
}

impl Scenario {
    /// Whether the scenario carries `tag` (written with its `@`).
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }

    fn tag_value(&self, prefix: &str) -> Option<&str> {
        self.tags
            .iter()
            .find_map(|tag| tag.strip_prefix(prefix))
            .filter(|value| !value.is_empty())
    }

    /// Role whose session state the scenario needs, from `@role:<name>`.
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.tag_value(ROLE_TAG_PREFIX)
    }

    /// Role this scenario logs in, from `@login:<name>`.
    #[must_use]
    pub fn login_role(&self) -> Option<&str> {
        self.tag_value(LOGIN_TAG_PREFIX)
    }

    /// Whether the scenario is tagged `@skip`.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.has_tag(SKIP_TAG)
    }

    /// Name with the example number appended for expanded outlines.
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.example {
            Some(example) => format!("{} (example {})", self.name, example.index + 1),
            None => self.name.clone(),
        }
    }
}

/// One row of an outline's Examples table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleRow {
    /// One-based line of the row.
    pub line: usize,
    /// Tags of the Examples block holding the row.
    pub tags: Vec<String>,
    /// Column name and value pairs in column order.
    pub values: Vec<(String, String)>,
}

impl ExampleRow {
    /// Value of the column called `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A parameterised scenario template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioOutline {
    /// Outline name, possibly containing `<placeholder>` tokens.
    pub name: String,
    /// Own and inherited tags.
    pub tags: Vec<String>,
    /// One-based line of the outline header.
    pub line: usize,
    /// Step templates, background steps first.
    pub steps: Vec<Step>,
    /// Rows of every Examples block in file order.
    pub examples: Vec<ExampleRow>,
}

/// A scenario as written in the feature file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioDefinition {
    /// A plain scenario.
    Scenario(Scenario),
    /// A scenario outline awaiting expansion.
    Outline(ScenarioOutline),
}

/// A parsed feature file. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureDocument {
    source: String,
    name: String,
    tags: Vec<String>,
    definitions: Vec<ScenarioDefinition>,
}

/// A feature whose outlines have been expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedFeature {
    /// File path or logical name of the feature.
    pub source: String,
    /// Feature name.
    pub name: String,
    /// Concrete scenarios in document order.
    pub scenarios: Vec<Scenario>,
    /// Outlines that could not be expanded.
    pub errors: Vec<ExpansionError>,
}

impl FeatureDocument {
    /// File path or logical name the document was parsed from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Feature name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Feature-level tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Scenarios and outlines in document order.
    #[must_use]
    pub fn definitions(&self) -> &[ScenarioDefinition] {
        &self.definitions
    }

    /// Expand every outline into one scenario per Examples row.
    ///
    /// Scenarios keep document order and expanded rows keep row order. An
    /// outline with an unbound `<placeholder>` contributes no scenarios and
    /// is reported in [`ExpandedFeature::errors`].
    #[must_use]
    pub fn expand(self) -> ExpandedFeature {
        let mut scenarios = Vec::new();
        let mut errors = Vec::new();
        for definition in self.definitions {
            match definition {
                ScenarioDefinition::Scenario(scenario) => scenarios.push(scenario),
                ScenarioDefinition::Outline(outline) => {
                    match expand::expand_outline(&self.source, &outline) {
                        Ok(expanded) => scenarios.extend(expanded),
                        Err(err) => errors.push(err),
                    }
                }
            }
        }
        ExpandedFeature {
            source: self.source,
            name: self.name,
            scenarios,
            errors,
        }
    }
}

fn normalise_tag(tag: &str) -> String {
    if tag.starts_with('@') {
        tag.to_owned()
    } else {
        format!("@{tag}")
    }
}

fn merge_tags(inherited: &[String], own: &[String]) -> Vec<String> {
    let mut tags = inherited.to_vec();
    for tag in own.iter().map(|tag| normalise_tag(tag)) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

impl From<&gherkin::Step> for Step {
    fn from(step: &gherkin::Step) -> Self {
        Self {
            keyword: StepKeyword::from_gherkin(&step.keyword, step.ty),
            text: step.value.clone(),
            line: step.position.line,
            docstring: step.docstring.clone(),
            table: step.table.as_ref().map(|table| table.rows.clone()),
        }
    }
}

fn is_outline(scenario: &gherkin::Scenario) -> bool {
    !scenario.examples.is_empty()
        || scenario.keyword.contains("Outline")
        || scenario.keyword.contains("Template")
}

fn example_rows(scenario: &gherkin::Scenario) -> Vec<ExampleRow> {
    let mut rows = Vec::new();
    for examples in &scenario.examples {
        let Some(table) = examples.table.as_ref() else {
            continue;
        };
        let mut table_rows = table.rows.iter();
        let Some(header) = table_rows.next() else {
            continue;
        };
        let tags = merge_tags(&[], &examples.tags);
        for (offset, row) in table_rows.enumerate() {
            rows.push(ExampleRow {
                line: table.position.line + offset + 1,
                tags: tags.clone(),
                values: header.iter().cloned().zip(row.iter().cloned()).collect(),
            });
        }
    }
    rows
}

fn convert_scenario(
    scenario: &gherkin::Scenario,
    inherited_tags: &[String],
    background: &[Step],
) -> ScenarioDefinition {
    let tags = merge_tags(inherited_tags, &scenario.tags);
    let mut steps = background.to_vec();
    steps.extend(scenario.steps.iter().map(Step::from));
    let line = scenario.position.line;
    if is_outline(scenario) {
        ScenarioDefinition::Outline(ScenarioOutline {
            name: scenario.name.clone(),
            tags,
            line,
            steps,
            examples: example_rows(scenario),
        })
    } else {
        ScenarioDefinition::Scenario(Scenario {
            name: scenario.name.clone(),
            tags,
            line,
            steps,
            example: None,
        })
    }
}

fn background_steps(background: Option<&gherkin::Background>) -> Vec<Step> {
    background
        .map(|bg| bg.steps.iter().map(Step::from).collect())
        .unwrap_or_default()
}

/// Parse feature `text`, identifying it as `source_name` in errors.
///
/// # Errors
/// Returns [`ParseError`] for malformed tables, outlines without Examples,
/// or any other Gherkin syntax error.
///
/// # Examples
/// ```
/// use pagewright::feature::parse_feature;
///
/// let doc = parse_feature(
///     "inline",
///     "Feature: Cart\n  Scenario: Empty\n    Then the cart badge is hidden\n",
/// )?;
/// assert_eq!(doc.name(), "Cart");
/// assert_eq!(doc.expand().scenarios.len(), 1);
/// # Ok::<(), pagewright::ParseError>(())
/// ```
pub fn parse_feature(source_name: &str, text: &str) -> Result<FeatureDocument, ParseError> {
    prescan::check_structure(source_name, text)?;

    let mut normalised = text.to_owned();
    if !normalised.ends_with('\n') {
        normalised.push('\n');
    }
    let feature = gherkin::Feature::parse(&normalised, GherkinEnv::default()).map_err(|err| {
        ParseError::new(
            source_name,
            None,
            ParseErrorKind::Syntax(format!("failed to parse feature: {err}")),
        )
    })?;

    let feature_tags = merge_tags(&[], &feature.tags);
    let feature_background = background_steps(feature.background.as_ref());
    let mut definitions: Vec<ScenarioDefinition> = feature
        .scenarios
        .iter()
        .map(|scenario| convert_scenario(scenario, &feature_tags, &feature_background))
        .collect();

    for rule in &feature.rules {
        let rule_tags = merge_tags(&feature_tags, &rule.tags);
        let mut rule_background = feature_background.clone();
        rule_background.extend(background_steps(rule.background.as_ref()));
        definitions.extend(
            rule.scenarios
                .iter()
                .map(|scenario| convert_scenario(scenario, &rule_tags, &rule_background)),
        );
    }

    Ok(FeatureDocument {
        source: source_name.to_owned(),
        name: feature.name.clone(),
        tags: feature_tags,
        definitions,
    })
}

/// Read and parse the feature file at `path`.
///
/// # Errors
/// Returns [`ParseError`] when the file cannot be read or parsed.
pub fn load_feature(path: &Utf8Path) -> Result<FeatureDocument, ParseError> {
    let text = std::fs::read_to_string(path).map_err(|err| {
        ParseError::new(path.as_str(), None, ParseErrorKind::Read(err.to_string()))
    })?;
    parse_feature(path.as_str(), &text)
}

/// Find every `.feature` file under `root`, in sorted path order.
///
/// Paths that are not valid UTF-8 are skipped with a warning.
///
/// # Errors
/// Returns the walk error when `root` or a directory beneath it cannot be
/// read.
pub fn discover_features(root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, walkdir::Error> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_feature = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("feature"));
        if !is_feature {
            continue;
        }
        match Utf8PathBuf::from_path_buf(entry.into_path()) {
            Ok(path) => paths.push(path),
            Err(path) => warn!(path = %path.display(), "skipping non UTF-8 feature path"),
        }
    }
    Ok(paths)
}
