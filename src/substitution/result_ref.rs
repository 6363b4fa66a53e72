//! Task result references.
//!
//! A result reference is an expression of the form
//! `tasks.<task>.results.<result>` optionally followed by `[*]`, `[<n>]`
//! or `.<property>`. Anything else, including parameter expressions
//! (`params.<name>`), is not a reference.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace keyword selecting another task
pub const RESULT_TASK_PART: &str = "tasks";
/// Singular misspelling of [`RESULT_TASK_PART`] tolerated by [`looks_like_result_ref`]
pub const RESULT_TASK_PART_SINGULAR: &str = "task";
/// Namespace keyword selecting a task's results
pub const RESULT_RESULT_PART: &str = "results";
/// Namespace keyword of parameter substitutions
pub const PARAMS_PART: &str = "params";

const MIN_COMPONENTS: usize = 4;
const MAX_COMPONENTS: usize = 5;

static INDEXED_RESULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>.+)\[(?P<index>\*|[0-9]+)\]$").expect("valid indexed result pattern")
});

/// Part of a result selected by a reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Selector {
    /// Zero-based element of an array result
    Index(usize),
    /// Key of an object result
    Property(String),
}

/// Reference from one task to a result of another
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRef {
    /// Name of the producing pipeline task
    pub pipeline_task: String,
    /// Name of the result
    pub result: String,
    /// Selected element or property; `None` refers to the whole result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<Selector>,
}

impl ResultRef {
    /// Creates a reference to a whole result
    #[must_use]
    pub fn new(pipeline_task: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            pipeline_task: pipeline_task.into(),
            result: result.into(),
            selector: None,
        }
    }

    /// Selects one element of an array result
    #[must_use]
    pub fn with_index(mut self, index: usize) -> Self {
        self.selector = Some(Selector::Index(index));
        self
    }

    /// Selects one property of an object result
    #[must_use]
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.selector = Some(Selector::Property(property.into()));
        self
    }

    /// Selected array index, if any
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self.selector {
            Some(Selector::Index(index)) => Some(index),
            _ => None,
        }
    }

    /// Selected object property, if any
    #[must_use]
    pub fn property(&self) -> Option<&str> {
        match &self.selector {
            Some(Selector::Property(property)) => Some(property),
            _ => None,
        }
    }

    /// Parses the body of one `$(...)` expression
    ///
    /// Returns `None` for anything that is not a well-formed reference.
    #[must_use]
    pub fn parse(expression: &str) -> Option<Self> {
        let parts: Vec<&str> = expression.split('.').collect();
        if parts.len() > MAX_COMPONENTS || parts[0] == PARAMS_PART {
            return None;
        }
        if parts.len() < MIN_COMPONENTS
            || parts[0] != RESULT_TASK_PART
            || parts[2] != RESULT_RESULT_PART
        {
            return None;
        }

        let (result, suffix) = split_index_suffix(parts[3])?;
        let selector = match (parts.get(4), suffix) {
            (None, None | Some(IndexSuffix::Whole)) => None,
            (None, Some(IndexSuffix::Element(index))) => Some(Selector::Index(index)),
            (Some(property), None) => Some(Selector::Property((*property).to_string())),
            // An indexed result has no properties.
            (Some(_), Some(_)) => return None,
        };

        Some(Self {
            pipeline_task: parts[1].to_string(),
            result: result.to_string(),
            selector,
        })
    }
}

impl fmt::Display for ResultRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "$({RESULT_TASK_PART}.{}.{RESULT_RESULT_PART}.{}",
            self.pipeline_task, self.result
        )?;
        match &self.selector {
            Some(Selector::Index(index)) => write!(f, "[{index}])"),
            Some(Selector::Property(property)) => write!(f, ".{property})"),
            None => write!(f, ")"),
        }
    }
}

enum IndexSuffix {
    Whole,
    Element(usize),
}

fn split_index_suffix(segment: &str) -> Option<(&str, Option<IndexSuffix>)> {
    let Some(caps) = INDEXED_RESULT.captures(segment) else {
        return Some((segment, None));
    };
    let name = caps.name("name")?.as_str();
    let suffix = match caps.name("index")?.as_str() {
        "*" => IndexSuffix::Whole,
        digits => IndexSuffix::Element(digits.parse().ok()?),
    };
    Some((name, Some(suffix)))
}

/// Coarse check for expressions that were probably meant as references
///
/// Tolerates a singular or differently-cased task keyword and any third
/// component, so a typo still gets a targeted diagnostic.
#[must_use]
pub fn looks_like_result_ref(expression: &str) -> bool {
    let parts: Vec<&str> = expression.split('.').collect();
    (MIN_COMPONENTS..=MAX_COMPONENTS).contains(&parts.len())
        && (parts[0].eq_ignore_ascii_case(RESULT_TASK_PART)
            || parts[0].eq_ignore_ascii_case(RESULT_TASK_PART_SINGULAR))
}

/// Parses every expression, silently dropping those that are not references
pub fn new_result_refs<S: AsRef<str>>(expressions: &[S]) -> Vec<ResultRef> {
    expressions
        .iter()
        .filter_map(|expression| ResultRef::parse(expression.as_ref()))
        .collect()
}

/// Returns true if any expression looks like a reference
pub fn looks_like_contains_result_refs<S: AsRef<str>>(expressions: &[S]) -> bool {
    expressions
        .iter()
        .any(|expression| looks_like_result_ref(expression.as_ref()))
}
