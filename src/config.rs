//! Feature-flag configuration
//!
//! Capability gates decide whether optional or experimental specification
//! fields are legal. Flags are read once by the caller and handed to the
//! validator as an immutable value.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Key of the API-fields gate
pub const ENABLE_API_FIELDS: &str = "enable-api-fields";
/// Key of the OCI bundles gate
pub const ENABLE_OCI_BUNDLES: &str = "enable-tekton-oci-bundles";

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A flag carried a value outside its allowed set
    #[error("invalid value {value:?} for {key}: expected one of {expected}")]
    InvalidValue {
        /// Flag key
        key: String,
        /// Offending value
        value: String,
        /// Allowed values
        expected: String,
    },
}

/// Stability level selected by the API-fields gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiFields {
    /// Only stable fields
    #[default]
    Stable,
    /// Stable and beta fields
    Beta,
    /// Every field, including alpha
    Alpha,
}

impl fmt::Display for ApiFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stable => write!(f, "stable"),
            Self::Beta => write!(f, "beta"),
            Self::Alpha => write!(f, "alpha"),
        }
    }
}

impl FromStr for ApiFields {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stable" => Ok(Self::Stable),
            "beta" => Ok(Self::Beta),
            "alpha" => Ok(Self::Alpha),
            other => Err(ConfigError::InvalidValue {
                key: ENABLE_API_FIELDS.to_string(),
                value: other.to_string(),
                expected: "stable, beta, alpha".to_string(),
            }),
        }
    }
}

/// Answer of a capability-gate lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateState {
    /// The gated fields are rejected
    Disabled,
    /// The gated fields are accepted by permissive gates only
    PermittedWithWarning,
    /// The gated fields are accepted
    FullyEnabled,
}

impl From<ApiFields> for GateState {
    fn from(level: ApiFields) -> Self {
        match level {
            ApiFields::Stable => Self::Disabled,
            ApiFields::Beta => Self::PermittedWithWarning,
            ApiFields::Alpha => Self::FullyEnabled,
        }
    }
}

/// Feature flags consulted during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct FeatureFlags {
    /// Stability level of accepted API fields
    pub enable_api_fields: ApiFields,
    /// Whether task references may point at OCI bundles
    pub enable_tekton_oci_bundles: bool,
}

impl FeatureFlags {
    /// Creates the default (stable, no bundles) flags
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags with every alpha field enabled
    #[must_use]
    pub fn alpha() -> Self {
        Self::default().with_api_fields(ApiFields::Alpha)
    }

    /// Sets the API-fields level
    #[must_use]
    pub fn with_api_fields(mut self, level: ApiFields) -> Self {
        self.enable_api_fields = level;
        self
    }

    /// Enables or disables OCI bundles
    #[must_use]
    pub fn with_oci_bundles(mut self, enabled: bool) -> Self {
        self.enable_tekton_oci_bundles = enabled;
        self
    }

    /// Builds flags from a key/value store, ignoring unknown keys
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a known key carries a
    /// value outside its allowed set.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut flags = Self::default();
        if let Some(value) = map.get(ENABLE_API_FIELDS) {
            flags.enable_api_fields = value.trim().parse()?;
        }
        if let Some(value) = map.get(ENABLE_OCI_BUNDLES) {
            flags.enable_tekton_oci_bundles = parse_bool(ENABLE_OCI_BUNDLES, value)?;
        }
        Ok(flags)
    }

    /// Looks up a gate by name; unknown gates are disabled
    #[must_use]
    pub fn gate(&self, name: &str) -> GateState {
        match name {
            ENABLE_API_FIELDS => self.enable_api_fields.into(),
            ENABLE_OCI_BUNDLES if self.enable_tekton_oci_bundles => GateState::FullyEnabled,
            _ => GateState::Disabled,
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: other.to_string(),
            expected: "true, false".to_string(),
        }),
    }
}
