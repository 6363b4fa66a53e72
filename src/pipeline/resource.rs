//! Legacy input and output resource bindings.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validation::rules::validate_unique_names;
use crate::validation::{FieldErrors, Validate, ValidationContext};

/// Resource kinds accepted by [`KnownResourceTypes`]
pub const KNOWN_RESOURCE_TYPES: [&str; 6] = [
    "git",
    "storage",
    "image",
    "cluster",
    "pullRequest",
    "cloudEvent",
];

/// Named key/value parameter of an inline resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceParam {
    /// Parameter name
    pub name: String,
    /// Parameter value
    pub value: String,
}

/// Inline specification of an external resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResourceSpec {
    /// Resource kind
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Kind-specific parameters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ResourceParam>,
}

impl PipelineResourceSpec {
    /// Creates an inline resource of the given kind
    #[must_use]
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            params: Vec::new(),
        }
    }
}

/// Reference to a stored external resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResourceRef {
    /// Name of the stored resource
    pub name: String,
}

/// Checks an inline resource specification
///
/// Implementations must be safe to share between concurrent validations.
pub trait ResourceSpecValidator: fmt::Debug + Send + Sync {
    /// Validates `spec`, reporting paths relative to it
    fn validate(&self, spec: &PipelineResourceSpec) -> FieldErrors;
}

/// Accepts the built-in resource kinds
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownResourceTypes;

impl ResourceSpecValidator for KnownResourceTypes {
    fn validate(&self, spec: &PipelineResourceSpec) -> FieldErrors {
        if KNOWN_RESOURCE_TYPES.contains(&spec.resource_type.as_str()) {
            return FieldErrors::new();
        }
        let expected = format!("expected one of {}", KNOWN_RESOURCE_TYPES.join(", "));
        FieldErrors::invalid_value(&spec.resource_type, "type", Some(expected.as_str()))
    }
}

/// Binds a task's declared resource to a concrete one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskResourceBinding {
    /// Name of the declared resource
    pub name: String,

    /// Stored resource to bind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_ref: Option<PipelineResourceRef>,

    /// Inline resource to bind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_spec: Option<PipelineResourceSpec>,

    /// Paths the resource is mounted at
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
}

impl TaskResourceBinding {
    /// Binds `name` to a stored resource
    #[must_use]
    pub fn by_ref(name: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_ref: Some(PipelineResourceRef {
                name: resource.into(),
            }),
            ..Self::default()
        }
    }

    /// Binds `name` to an inline resource
    #[must_use]
    pub fn by_spec(name: impl Into<String>, spec: PipelineResourceSpec) -> Self {
        Self {
            name: name.into(),
            resource_spec: Some(spec),
            ..Self::default()
        }
    }
}

impl Validate for TaskResourceBinding {
    fn validate(&self, ctx: &ValidationContext) -> FieldErrors {
        let mut errs = FieldErrors::new();
        if self.name.is_empty() {
            errs = errs.also(FieldErrors::missing_field(&["name"]));
        }

        let source = match (&self.resource_ref, &self.resource_spec) {
            (Some(_), Some(_)) => FieldErrors::disallowed_fields(&["resourceRef", "resourceSpec"]),
            (None, None) => FieldErrors::missing_field(&["resourceRef", "resourceSpec"]),
            (Some(reference), None) if reference.name.is_empty() => {
                FieldErrors::missing_field(&["resourceRef.name"])
            }
            (Some(_), None) => FieldErrors::new(),
            (None, Some(spec)) => ctx
                .resource_validator()
                .validate(spec)
                .via_field("resourceSpec"),
        };
        errs.also(source)
    }
}

/// Resource bindings of a task run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskRunResources {
    /// Input bindings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<TaskResourceBinding>,

    /// Output bindings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<TaskResourceBinding>,
}

impl Validate for TaskRunResources {
    fn validate(&self, ctx: &ValidationContext) -> FieldErrors {
        [("inputs", &self.inputs), ("outputs", &self.outputs)]
            .into_iter()
            .map(|(field, bindings)| {
                let names = bindings.iter().map(|b| b.name.as_str());
                bindings
                    .validate(ctx)
                    .via_field(field)
                    .also(validate_unique_names(field, names, true))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn ctx() -> ValidationContext {
        ValidationContext::default()
    }

    #[test]
    fn test_valid_bindings() {
        let resources = TaskRunResources {
            inputs: vec![
                TaskResourceBinding::by_ref("workspace1", "testresource1"),
                TaskResourceBinding::by_spec("workspace2", PipelineResourceSpec::new("git")),
            ],
            outputs: vec![TaskResourceBinding::by_ref("workspace1", "testresource")],
        };
        assert!(resources.validate(&ctx()).is_empty());
    }

    #[test]
    fn test_duplicate_names_case_insensitive() {
        let resources = TaskRunResources {
            inputs: vec![
                TaskResourceBinding::by_ref("workspace", "testresource1"),
                TaskResourceBinding::by_ref("Workspace", "testresource2"),
            ],
            ..TaskRunResources::default()
        };
        assert_eq!(
            resources.validate(&ctx()).to_string(),
            "expected exactly one, got both: inputs[1].name"
        );
    }

    #[test]
    fn test_ref_and_spec_together() {
        let mut binding = TaskResourceBinding::by_ref("resource-dup", "testresource");
        binding.resource_spec = Some(PipelineResourceSpec::new("git"));
        let resources = TaskRunResources {
            outputs: vec![binding],
            ..TaskRunResources::default()
        };
        assert_eq!(
            resources.validate(&ctx()).to_string(),
            "must not set the field(s): outputs[0].resourceRef, outputs[0].resourceSpec"
        );
    }

    #[test]
    fn test_neither_ref_nor_spec() {
        let binding = TaskResourceBinding {
            name: "resource".to_string(),
            ..TaskResourceBinding::default()
        };
        assert_eq!(
            binding.validate(&ctx()).to_string(),
            "missing field(s): resourceRef, resourceSpec"
        );
    }

    #[test]
    fn test_unknown_resource_type() {
        let binding =
            TaskResourceBinding::by_spec("resource-inv", PipelineResourceSpec::new("non-existent"));
        assert_eq!(
            binding.validate(&ctx()).to_string(),
            "invalid value: non-existent: resourceSpec.type\n\
             expected one of git, storage, image, cluster, pullRequest, cloudEvent"
        );
    }

    #[test]
    fn test_missing_name_and_ref_name() {
        let binding = TaskResourceBinding::by_ref("", "");
        assert_eq!(
            binding.validate(&ctx()).to_string(),
            "missing field(s): name, resourceRef.name"
        );
    }

    #[derive(Debug)]
    struct RequireParams;

    impl ResourceSpecValidator for RequireParams {
        fn validate(&self, spec: &PipelineResourceSpec) -> FieldErrors {
            if spec.params.is_empty() {
                FieldErrors::missing_field(&["params"])
            } else {
                FieldErrors::new()
            }
        }
    }

    #[test]
    fn test_custom_resource_validator() {
        let ctx = ValidationContext::default().with_resource_validator(Arc::new(RequireParams));
        let binding = TaskResourceBinding::by_spec("src", PipelineResourceSpec::new("anything"));
        assert_eq!(
            binding.validate(&ctx).to_string(),
            "missing field(s): resourceSpec.params"
        );
    }
}
