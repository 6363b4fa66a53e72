//! Task runs.
//!
//! A task run binds parameters, workspaces and resources to exactly one
//! task, given either inline or by reference. [`TaskRun::validate`] is the
//! entry point of structural validation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pipeline::duration::Timeout;
use crate::pipeline::params::{Param, validate_param_names};
use crate::pipeline::resource::TaskRunResources;
use crate::pipeline::task::TaskSpec;
use crate::pipeline::task_ref::TaskRef;
use crate::pipeline::workspace::{WorkspaceBinding, validate_workspace_bindings};
use crate::validation::rules::{validate_object_name, validate_unique_names};
use crate::validation::{FieldErrors, Validate, ValidationContext};

/// The only value accepted in [`TaskRunSpec::status`]
pub const TASK_RUN_CANCELLED: &str = "TaskRunCancelled";

/// Breakpoint pausing the run after a failed step
pub const BREAKPOINT_ON_FAILURE: &str = "onFailure";

const VALID_BREAKPOINTS: [&str; 1] = [BREAKPOINT_ON_FAILURE];

/// Object identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Object name
    #[serde(default)]
    pub name: String,

    /// Namespace
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,

    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Identity with just a name
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Compute resource limits and requests, e.g. `memory: 1Gi`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    /// Upper bounds
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub limits: BTreeMap<String, String>,

    /// Guaranteed amounts
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub requests: BTreeMap<String, String>,
}

impl ResourceRequirements {
    /// Requirements with a single request
    #[must_use]
    pub fn request(resource: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            requests: BTreeMap::from([(resource.into(), quantity.into())]),
            ..Self::default()
        }
    }
}

/// Per-step resource override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskRunStepOverride {
    /// Name of the overridden step
    #[serde(default)]
    pub name: String,
    /// Replacement resources
    #[serde(default)]
    pub resources: ResourceRequirements,
}

/// Per-sidecar resource override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskRunSidecarOverride {
    /// Name of the overridden sidecar
    #[serde(default)]
    pub name: String,
    /// Replacement resources
    #[serde(default)]
    pub resources: ResourceRequirements,
}

/// Debugging directives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskRunDebug {
    /// Breakpoints to stop at
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub breakpoint: Vec<String>,
}

impl Validate for TaskRunDebug {
    fn validate(&self, _ctx: &ValidationContext) -> FieldErrors {
        self.breakpoint
            .iter()
            .filter(|b| !VALID_BREAKPOINTS.contains(&b.as_str()))
            .map(|b| {
                FieldErrors::invalid_value(
                    format!(
                        "{b} is not a valid breakpoint. Available valid breakpoints include [{}]",
                        VALID_BREAKPOINTS.join(" ")
                    ),
                    "breakpoint",
                    None,
                )
            })
            .collect()
    }
}

/// Desired state of a task run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskRunSpec {
    /// Parameter values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,

    /// Legacy resource bindings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<TaskRunResources>,

    /// Service account the run executes as
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_account_name: String,

    /// Referenced task
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_ref: Option<TaskRef>,

    /// Inline task
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_spec: Option<TaskSpec>,

    /// Requested lifecycle change
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,

    /// Maximum run time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Timeout>,

    /// Workspace bindings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub workspaces: Vec<WorkspaceBinding>,

    /// Debugging directives
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<TaskRunDebug>,

    /// Step resource overrides
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub step_overrides: Vec<TaskRunStepOverride>,

    /// Sidecar resource overrides
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sidecar_overrides: Vec<TaskRunSidecarOverride>,
}

impl TaskRunSpec {
    /// Spec running a referenced task
    #[must_use]
    pub fn from_ref(task_ref: TaskRef) -> Self {
        Self {
            task_ref: Some(task_ref),
            ..Self::default()
        }
    }

    /// Spec running an inline task
    #[must_use]
    pub fn from_spec(task_spec: TaskSpec) -> Self {
        Self {
            task_spec: Some(task_spec),
            ..Self::default()
        }
    }

    fn validate_definition_choice(&self) -> FieldErrors {
        match (&self.task_ref, &self.task_spec) {
            (None, None) => FieldErrors::missing_one_of(&["taskRef", "taskSpec"]),
            (Some(_), Some(_)) => FieldErrors::multiple_one_of(&["taskRef", "taskSpec"]),
            _ => FieldErrors::new(),
        }
    }

    fn validate_debug(&self, ctx: &ValidationContext) -> FieldErrors {
        match &self.debug {
            Some(debug) => ctx
                .require_alpha("debug")
                .also(debug.validate(ctx).via_field("debug")),
            None => FieldErrors::new(),
        }
    }

    fn validate_status(&self) -> FieldErrors {
        if self.status.is_empty() || self.status == TASK_RUN_CANCELLED {
            return FieldErrors::new();
        }
        FieldErrors::invalid_value(
            format!("{} should be {TASK_RUN_CANCELLED}", self.status),
            "status",
            None,
        )
    }

    fn validate_timeout(&self) -> FieldErrors {
        match self.timeout {
            Some(timeout) if timeout.is_negative() => {
                FieldErrors::invalid_value(format!("{timeout} should be >= 0"), "timeout", None)
            }
            _ => FieldErrors::new(),
        }
    }
}

fn validate_overrides<'a>(
    field: &str,
    names: impl Iterator<Item = &'a str> + Clone,
    ctx: &ValidationContext,
) -> FieldErrors {
    if names.clone().next().is_none() {
        return FieldErrors::new();
    }
    let missing: FieldErrors = names
        .clone()
        .enumerate()
        .filter(|(_, name)| name.is_empty())
        .map(|(i, _)| FieldErrors::missing_field(&["name"]).via_field_index(field, i))
        .collect();
    ctx.require_alpha(field)
        .also(missing)
        .also(validate_unique_names(field, names, false))
}

impl Validate for TaskRunSpec {
    fn validate(&self, ctx: &ValidationContext) -> FieldErrors {
        let mut errs = self.validate_definition_choice();
        errs = errs.also(self.task_ref.validate(ctx).via_field("taskRef"));
        errs = errs.also(self.task_spec.validate(ctx).via_field("taskSpec"));
        errs = errs.also(validate_param_names(&self.params).via_field("params"));
        errs = errs.also(validate_workspace_bindings(&self.workspaces, ctx));
        errs = errs.also(self.resources.validate(ctx).via_field("resources"));
        errs = errs.also(self.validate_debug(ctx));
        errs = errs.also(validate_overrides(
            "stepOverrides",
            self.step_overrides.iter().map(|o| o.name.as_str()),
            ctx,
        ));
        errs = errs.also(validate_overrides(
            "sidecarOverrides",
            self.sidecar_overrides.iter().map(|o| o.name.as_str()),
            ctx,
        ));
        errs.also(self.validate_status()).also(self.validate_timeout())
    }
}

/// A single execution of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskRun {
    /// Identity
    #[serde(default)]
    pub metadata: ObjectMeta,

    /// Desired state
    #[serde(default)]
    pub spec: TaskRunSpec,
}

impl TaskRun {
    /// Creates a task run
    #[must_use]
    pub fn new(name: impl Into<String>, spec: TaskRunSpec) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
            spec,
        }
    }
}

impl Validate for TaskRun {
    /// Validates identity, then the spec unless the run is being deleted
    fn validate(&self, ctx: &ValidationContext) -> FieldErrors {
        let mut errs = validate_object_name(&self.metadata.name).via_field("metadata");
        if !ctx.is_deleting() {
            errs = errs.also(self.spec.validate(ctx).via_field("spec"));
        }
        tracing::debug!(
            name = %self.metadata.name,
            deleting = ctx.is_deleting(),
            violations = errs.len(),
            "Validated task run"
        );
        errs
    }
}
