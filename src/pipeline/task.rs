//! Inline task definitions.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pipeline::params::{ParamSpec, ParamType};
use crate::validation::rules::{duplicate_positions, validate_step_name, validate_unique_names};
use crate::validation::{FieldErrors, Validate, ValidationContext};

/// Details attached to malformed result names
pub const RESULT_NAME_DETAILS: &str = "Name must consist of alphanumeric characters, '-', '_' or '.', and must start and end with an alphanumeric character";

static RESULT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9]$").expect("valid result name pattern")
});

/// One container in a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Step name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Container image
    #[serde(default)]
    pub image: String,

    /// Entrypoint
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    /// Entrypoint arguments
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Inline script run instead of a command
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub script: String,

    /// Working directory
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub working_dir: String,
}

impl Step {
    /// Creates a step running `image`
    #[must_use]
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            ..Self::default()
        }
    }

    /// Sets the inline script
    #[must_use]
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    /// Sets the entrypoint
    #[must_use]
    pub fn with_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }
}

impl Validate for Step {
    fn validate(&self, _ctx: &ValidationContext) -> FieldErrors {
        let mut errs = FieldErrors::new();
        if self.image.is_empty() {
            errs = errs.also(FieldErrors::missing_field(&["image"]));
        }
        if !self.script.is_empty() && !self.command.is_empty() {
            errs = errs.also(FieldErrors::generic(
                "script cannot be used with command",
                &["script"],
            ));
        }
        if !self.name.is_empty() {
            errs = errs.also(validate_step_name(&self.name));
        }
        errs
    }
}

/// Value a task declares it produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    /// Result name
    pub name: String,

    /// Result type
    #[serde(default, rename = "type")]
    pub result_type: ParamType,

    /// Description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl TaskResult {
    /// Declares a string result
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Validate for TaskResult {
    fn validate(&self, _ctx: &ValidationContext) -> FieldErrors {
        if RESULT_NAME.is_match(&self.name) {
            return FieldErrors::new();
        }
        FieldErrors::invalid_value(&self.name, "name", Some(RESULT_NAME_DETAILS))
    }
}

/// Task definition embedded in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    /// Description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Accepted parameters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamSpec>,

    /// Steps, run in order
    #[serde(default)]
    pub steps: Vec<Step>,

    /// Produced results
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<TaskResult>,
}

impl TaskSpec {
    /// Creates a definition from its steps
    #[must_use]
    pub fn with_steps(steps: Vec<Step>) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }
}

impl Validate for TaskSpec {
    fn validate(&self, ctx: &ValidationContext) -> FieldErrors {
        let mut errs = FieldErrors::new();

        if self.steps.is_empty() {
            errs = errs.also(FieldErrors::missing_field(&["steps"]));
        }
        errs = errs.also(self.steps.validate(ctx).via_field("steps"));
        let step_names = self.steps.iter().map(|s| s.name.as_str());
        for i in duplicate_positions(step_names, false) {
            errs = errs.also(
                FieldErrors::invalid_value(&self.steps[i].name, "name", None)
                    .via_field_index("steps", i),
            );
        }

        errs = errs.also(self.params.validate(ctx).via_field("params"));
        errs = errs.also(validate_unique_names(
            "params",
            self.params.iter().map(|p| p.name.as_str()),
            true,
        ));

        errs = errs.also(self.results.validate(ctx).via_field("results"));
        errs.also(validate_unique_names(
            "results",
            self.results.iter().map(|r| r.name.as_str()),
            false,
        ))
    }
}
