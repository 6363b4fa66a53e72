//! References to externally stored task definitions.

use serde::{Deserialize, Serialize};

use crate::config::{ENABLE_OCI_BUNDLES, GateState};
use crate::pipeline::image_ref::ImageReference;
use crate::validation::{FieldErrors, Validate, ValidationContext};

/// Key/value input handed to a remote resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverParam {
    /// Parameter name
    pub name: String,
    /// Parameter value
    pub value: String,
}

impl ResolverParam {
    /// Creates a resolver parameter
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Named reference to a task definition
///
/// The definition is looked up by `name`, optionally inside an OCI
/// `bundle`, or fetched by a remote `resolver` fed with `resource`
/// parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    /// Name of the referenced task
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Kind of the referenced task
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    /// Image bundle holding the task
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bundle: String,

    /// Remote resolver fetching the task
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resolver: String,

    /// Resolver parameters; an empty list still counts as set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Vec<ResolverParam>>,
}

impl TaskRef {
    /// Refers to a task by name
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Refers to a task fetched by a resolver
    #[must_use]
    pub fn resolved_by(resolver: impl Into<String>) -> Self {
        Self {
            resolver: resolver.into(),
            ..Self::default()
        }
    }

    /// Sets the bundle
    #[must_use]
    pub fn with_bundle(mut self, bundle: impl Into<String>) -> Self {
        self.bundle = bundle.into();
        self
    }

    /// Sets the resolver parameters
    #[must_use]
    pub fn with_resource(mut self, params: Vec<ResolverParam>) -> Self {
        self.resource = Some(params);
        self
    }

    fn validate_bundle(&self, ctx: &ValidationContext) -> FieldErrors {
        if ctx.flags().gate(ENABLE_OCI_BUNDLES) != GateState::FullyEnabled {
            return FieldErrors::disallowed_fields(&["bundle"]);
        }
        match self.bundle.parse::<ImageReference>() {
            Ok(_) => FieldErrors::new(),
            Err(err) => FieldErrors::invalid_value(
                "invalid bundle reference",
                "bundle",
                Some(err.to_string().as_str()),
            ),
        }
    }
}

impl Validate for TaskRef {
    fn validate(&self, ctx: &ValidationContext) -> FieldErrors {
        let mut errs = FieldErrors::new();

        if !self.resolver.is_empty() {
            if !ctx.permits_beta() {
                return FieldErrors::disallowed_fields(&["resolver"]);
            }
            if !self.name.is_empty() {
                errs = errs.also(FieldErrors::multiple_one_of(&["name", "resolver"]));
            }
            if !self.bundle.is_empty() {
                errs = errs.also(FieldErrors::multiple_one_of(&["bundle", "resolver"]));
            }
        } else if self.resource.is_some() {
            if !ctx.permits_beta() {
                return FieldErrors::disallowed_fields(&["resource"]);
            }
            if !self.name.is_empty() {
                errs = errs.also(FieldErrors::multiple_one_of(&["name", "resource"]));
            }
            if !self.bundle.is_empty() {
                errs = errs.also(FieldErrors::multiple_one_of(&["bundle", "resource"]));
            }
            errs = errs.also(FieldErrors::missing_field(&["resolver"]));
        } else if self.name.is_empty() {
            errs = errs.also(FieldErrors::missing_field(&["name"]));
        } else if !self.bundle.is_empty() {
            errs = errs.also(self.validate_bundle(ctx));
        }

        errs
    }
}
