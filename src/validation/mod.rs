//! Specification validation framework.
//!
//! This module provides the error accumulator, the [`Validate`] trait and
//! the immutable [`ValidationContext`] threaded through every call.
//!
//! Validators never stop at the first problem: each one returns a
//! [`FieldErrors`] value and containers compose the values of their
//! children, scoping them under the child's field path.

mod field_error;
pub mod rules;

use std::sync::Arc;

pub use field_error::{
    FieldError, FieldErrors, MSG_DISALLOWED_FIELDS, MSG_MISSING_FIELD, MSG_MISSING_ONE_OF,
    MSG_MULTIPLE_ONE_OF,
};

use crate::config::{ApiFields, ENABLE_API_FIELDS, FeatureFlags, GateState};
use crate::pipeline::resource::{KnownResourceTypes, ResourceSpecValidator};

/// Trait for validatable types
pub trait Validate {
    /// Validates this instance, reporting paths relative to itself
    fn validate(&self, ctx: &ValidationContext) -> FieldErrors;
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self, ctx: &ValidationContext) -> FieldErrors {
        match self {
            Some(value) => value.validate(ctx),
            None => FieldErrors::new(),
        }
    }
}

impl<T: Validate> Validate for [T] {
    fn validate(&self, ctx: &ValidationContext) -> FieldErrors {
        self.iter()
            .enumerate()
            .map(|(i, item)| item.validate(ctx).via_index(i))
            .collect()
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self, ctx: &ValidationContext) -> FieldErrors {
        self.as_slice().validate(ctx)
    }
}

/// Ambient, read-only inputs of a validation call
#[derive(Debug, Clone)]
pub struct ValidationContext {
    flags: FeatureFlags,
    deleting: bool,
    resource_validator: Arc<dyn ResourceSpecValidator>,
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new(FeatureFlags::default())
    }
}

impl ValidationContext {
    /// Creates a context with the given feature flags
    #[must_use]
    pub fn new(flags: FeatureFlags) -> Self {
        Self {
            flags,
            deleting: false,
            resource_validator: Arc::new(KnownResourceTypes),
        }
    }

    /// Marks the context as a deletion
    #[must_use]
    pub fn within_delete(mut self) -> Self {
        self.deleting = true;
        self
    }

    /// Replaces the resource-spec sub-validator
    #[must_use]
    pub fn with_resource_validator(mut self, validator: Arc<dyn ResourceSpecValidator>) -> Self {
        self.resource_validator = validator;
        self
    }

    /// Feature flags in effect
    #[must_use]
    pub fn flags(&self) -> &FeatureFlags {
        &self.flags
    }

    /// Whether the object is being deleted
    #[must_use]
    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    /// Sub-validator for inline resource specifications
    #[must_use]
    pub fn resource_validator(&self) -> &dyn ResourceSpecValidator {
        self.resource_validator.as_ref()
    }

    /// Whether the API-fields gate is at least `permitted-with-warning`
    #[must_use]
    pub fn permits_beta(&self) -> bool {
        self.flags.gate(ENABLE_API_FIELDS) != GateState::Disabled
    }

    /// Whether the API-fields gate is fully enabled
    #[must_use]
    pub fn permits_alpha(&self) -> bool {
        self.flags.gate(ENABLE_API_FIELDS) == GateState::FullyEnabled
    }

    /// Generic violation unless the API-fields gate is fully enabled
    #[must_use]
    pub fn require_alpha(&self, feature: &str) -> FieldErrors {
        if self.permits_alpha() {
            return FieldErrors::new();
        }
        FieldErrors::generic(
            format!(
                "{feature} requires \"{ENABLE_API_FIELDS}\" feature gate to be \"{}\" but it is \"{}\"",
                ApiFields::Alpha,
                self.flags.enable_api_fields
            ),
            &[],
        )
    }
}
