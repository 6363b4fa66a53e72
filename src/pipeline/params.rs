//! Task parameters.
//!
//! This module provides the values bound to parameters when a task is
//! run, and the declarations a task makes for the parameters it accepts.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::substitution::scanner::{scan, scan_all};
use crate::validation::{FieldErrors, Validate, ValidationContext};

/// Type of a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// Scalar string
    #[default]
    String,
    /// Ordered list of strings
    Array,
    /// String-keyed map of strings
    Object,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Array => write!(f, "array"),
            Self::Object => write!(f, "object"),
        }
    }
}

/// Value of a parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Scalar string
    String(String),
    /// Ordered list of strings
    Array(Vec<String>),
    /// Unordered map of strings
    Object(HashMap<String, String>),
}

impl ParamValue {
    /// Creates an array value
    #[must_use]
    pub fn array<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    /// Creates an object value
    #[must_use]
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns the value type
    #[must_use]
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::String(_) => ParamType::String,
            Self::Array(_) => ParamType::Array,
            Self::Object(_) => ParamType::Object,
        }
    }

    /// Embedded `$(...)` expressions, or `None` if there are none
    ///
    /// Order is preserved within a string and across array elements; the
    /// order across object entries is unspecified.
    #[must_use]
    pub fn substitution_expressions(&self) -> Option<Vec<String>> {
        let expressions: Vec<String> = match self {
            Self::String(value) => scan(value).into_iter().map(str::to_string).collect(),
            Self::Array(values) => scan_all(values),
            Self::Object(entries) => scan_all(entries.values()),
        };
        (!expressions.is_empty()).then_some(expressions)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::Array(values)
    }
}

/// A named parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Bound value
    pub value: ParamValue,
}

impl Param {
    /// Creates a parameter
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Reports repeated parameter names, compared case-insensitively
///
/// Each repeat is reported once at `[<lowercased name>].name`.
#[must_use]
pub fn validate_param_names(params: &[Param]) -> FieldErrors {
    let mut seen = HashSet::new();
    params
        .iter()
        .filter_map(|param| {
            let key = param.name.to_ascii_lowercase();
            if seen.insert(key.clone()) {
                None
            } else {
                Some(FieldErrors::multiple_one_of(&["name"]).via_key(&key))
            }
        })
        .collect()
}

/// Declaration of a parameter accepted by a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,

    /// Declared type
    #[serde(default, rename = "type")]
    pub param_type: ParamType,

    /// Description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Default value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<ParamValue>,
}

impl ParamSpec {
    /// Declares a string parameter
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the declared type
    #[must_use]
    pub fn with_type(mut self, param_type: ParamType) -> Self {
        self.param_type = param_type;
        self
    }

    /// Sets the default value
    #[must_use]
    pub fn with_default(mut self, default: impl Into<ParamValue>) -> Self {
        self.default = Some(default.into());
        self
    }
}

impl Validate for ParamSpec {
    fn validate(&self, _ctx: &ValidationContext) -> FieldErrors {
        let mut errs = FieldErrors::new();
        if self.name.is_empty() {
            errs = errs.also(FieldErrors::missing_field(&["name"]));
        }
        if let Some(default) = &self.default {
            let default_type = default.param_type();
            if default_type != self.param_type {
                errs = errs.also(FieldErrors::generic(
                    format!(
                        "\"{}\" type does not match default value's type: \"{default_type}\"",
                        self.param_type
                    ),
                    &["type", "default.type"],
                ));
            }
        }
        errs
    }
}
