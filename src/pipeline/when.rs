//! Conditional guards on pipeline tasks.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::substitution::scanner::scan;
use crate::validation::{FieldErrors, Validate, ValidationContext};

/// Comparison operator of a when expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Input is one of the values
    In,
    /// Input is none of the values
    NotIn,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::In => write!(f, "in"),
            Self::NotIn => write!(f, "notin"),
        }
    }
}

/// Guard deciding whether a task runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhenExpression {
    /// Input expression
    pub input: String,
    /// Comparison operator
    pub operator: Operator,
    /// Values compared against the input
    pub values: Vec<String>,
}

impl WhenExpression {
    /// Creates a when expression
    #[must_use]
    pub fn new<I, S>(input: impl Into<String>, operator: Operator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: input.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Embedded expressions of the input, then of each value
    #[must_use]
    pub fn substitution_expressions(&self) -> Option<Vec<String>> {
        let expressions: Vec<String> = std::iter::once(self.input.as_str())
            .chain(self.values.iter().map(String::as_str))
            .flat_map(scan)
            .map(str::to_string)
            .collect();
        (!expressions.is_empty()).then_some(expressions)
    }
}

impl Validate for WhenExpression {
    fn validate(&self, _ctx: &ValidationContext) -> FieldErrors {
        let mut errs = FieldErrors::new();
        if self.input.is_empty() {
            errs = errs.also(FieldErrors::missing_field(&["input"]));
        }
        if self.values.is_empty() {
            errs = errs.also(FieldErrors::missing_field(&["values"]));
        }
        errs
    }
}
