//! Path-qualified validation errors and their accumulation.
//!
//! A [`FieldErrors`] value holds every violation found while validating a
//! specification. Values compose with [`FieldErrors::also`] and are
//! re-rooted under a parent field with the `via_*` family, so a
//! sub-object's validator can report paths relative to itself and let the
//! caller place them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Message used when none of a set of exclusive fields is populated.
pub const MSG_MISSING_ONE_OF: &str = "expected exactly one, got neither";
/// Message used when more than one of a set of exclusive fields is populated.
pub const MSG_MULTIPLE_ONE_OF: &str = "expected exactly one, got both";
/// Message used for required fields that are not populated.
pub const MSG_MISSING_FIELD: &str = "missing field(s)";
/// Message used for fields that are populated but forbidden.
pub const MSG_DISALLOWED_FIELDS: &str = "must not set the field(s)";

/// A single violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    /// Human-readable description of the violation
    pub message: String,

    /// Field paths the violation applies to
    #[serde(default)]
    pub paths: Vec<String>,

    /// Optional free-text detail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl FieldError {
    /// Creates a violation with the given message and paths
    #[must_use]
    pub fn new(message: impl Into<String>, paths: &[&str]) -> Self {
        Self {
            message: message.into(),
            paths: paths.iter().map(|p| (*p).to_string()).collect(),
            details: None,
        }
    }

    /// Attaches a detail string
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn first_path(&self) -> &str {
        self.paths.first().map_or("", String::as_str)
    }

    fn map_paths(mut self, f: impl Fn(&str) -> String) -> Self {
        self.paths = self.paths.iter().map(|p| f(p)).collect();
        self
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.paths.is_empty() {
            write!(f, "{}", self.message)?;
        } else {
            write!(f, "{}: {}", self.message, self.paths.join(", "))?;
        }
        if let Some(details) = &self.details {
            write!(f, "\n{details}")?;
        }
        Ok(())
    }
}

/// Zero or more violations found during one validation call.
///
/// The empty value is the identity of [`FieldErrors::also`]. Equality,
/// [`FieldErrors::violations`] and the `Display` rendering all work on the
/// normalized set: violations sharing a message and details are merged
/// into one with the union of their paths, paths are sorted, and
/// violations are ordered by their first path (then by message).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    /// Creates an empty outcome
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// None of the named paths is populated
    #[must_use]
    pub fn missing_one_of(paths: &[&str]) -> Self {
        FieldError::new(MSG_MISSING_ONE_OF, paths).into()
    }

    /// More than one of the named paths is populated
    #[must_use]
    pub fn multiple_one_of(paths: &[&str]) -> Self {
        FieldError::new(MSG_MULTIPLE_ONE_OF, paths).into()
    }

    /// Required paths have no value
    #[must_use]
    pub fn missing_field(paths: &[&str]) -> Self {
        FieldError::new(MSG_MISSING_FIELD, paths).into()
    }

    /// Paths are populated but forbidden in the current context
    #[must_use]
    pub fn disallowed_fields(paths: &[&str]) -> Self {
        FieldError::new(MSG_DISALLOWED_FIELDS, paths).into()
    }

    /// A value failed a domain constraint
    #[must_use]
    pub fn invalid_value(value: impl fmt::Display, path: &str, details: Option<&str>) -> Self {
        let error = FieldError::new(format!("invalid value: {value}"), &[path]);
        match details {
            Some(details) => error.with_details(details).into(),
            None => error.into(),
        }
    }

    /// A free-form violation, optionally tied to paths
    #[must_use]
    pub fn generic(message: impl Into<String>, paths: &[&str]) -> Self {
        FieldError::new(message, paths).into()
    }

    /// Returns true when no violation was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct violations after normalization
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations().len()
    }

    /// Composes two outcomes
    #[must_use]
    pub fn also(mut self, other: FieldErrors) -> Self {
        self.0.extend(other.0);
        self
    }

    /// Prepends a field name to every path
    #[must_use]
    pub fn via_field(self, prefix: &str) -> Self {
        if prefix.is_empty() {
            return self;
        }
        self.rewrite(|path| join_path(prefix, path))
    }

    /// Prepends a list index (`[i]`) to every path
    #[must_use]
    pub fn via_index(self, index: usize) -> Self {
        let segment = format!("[{index}]");
        self.rewrite(|path| join_path(&segment, path))
    }

    /// Prepends a map key (`[key]`) to every path
    #[must_use]
    pub fn via_key(self, key: &str) -> Self {
        let segment = format!("[{key}]");
        self.rewrite(|path| join_path(&segment, path))
    }

    /// Shorthand for `via_index(index).via_field(field)`
    #[must_use]
    pub fn via_field_index(self, field: &str, index: usize) -> Self {
        self.via_index(index).via_field(field)
    }

    /// Shorthand for `via_key(key).via_field(field)`
    #[must_use]
    pub fn via_field_key(self, field: &str, key: &str) -> Self {
        self.via_key(key).via_field(field)
    }

    /// Returns the normalized, ordered violation list
    #[must_use]
    pub fn violations(&self) -> Vec<FieldError> {
        let mut merged: BTreeMap<(&str, Option<&str>), FieldError> = BTreeMap::new();
        for error in &self.0 {
            let key = (error.message.as_str(), error.details.as_deref());
            merged
                .entry(key)
                .and_modify(|existing| existing.paths.extend(error.paths.iter().cloned()))
                .or_insert_with(|| error.clone());
        }

        let mut violations: Vec<FieldError> = merged
            .into_values()
            .map(|mut error| {
                error.paths.sort();
                error.paths.dedup();
                error
            })
            .collect();
        violations.sort_by(|a, b| {
            a.first_path()
                .cmp(b.first_path())
                .then_with(|| a.message.cmp(&b.message))
        });
        violations
    }

    /// Converts into a `Result`, `Ok` when empty
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one violation was recorded.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    fn rewrite(self, f: impl Fn(&str) -> String) -> Self {
        Self(self.0.into_iter().map(|e| e.map_paths(&f)).collect())
    }
}

/// Joins a prefix onto a relative path; an empty path denotes the field itself.
fn join_path(prefix: &str, path: &str) -> String {
    if path.is_empty() {
        prefix.to_string()
    } else if path.starts_with('[') {
        format!("{prefix}{path}")
    } else {
        format!("{prefix}.{path}")
    }
}

impl From<FieldError> for FieldErrors {
    fn from(error: FieldError) -> Self {
        Self(vec![error])
    }
}

impl FromIterator<FieldErrors> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = FieldErrors>>(iter: I) -> Self {
        iter.into_iter().fold(FieldErrors::new(), FieldErrors::also)
    }
}

impl PartialEq for FieldErrors {
    fn eq(&self, other: &Self) -> bool {
        self.violations() == other.violations()
    }
}

impl Eq for FieldErrors {}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.violations().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_is_identity() {
        let errs = FieldErrors::missing_field(&["name"]);
        assert_eq!(FieldErrors::new().also(errs.clone()), errs);
        assert_eq!(errs.clone().also(FieldErrors::new()), errs);
        assert!(FieldErrors::new().also(FieldErrors::new()).is_empty());
    }

    #[test]
    fn test_compose_is_order_insensitive() {
        let a = FieldErrors::missing_field(&["b"]);
        let b = FieldErrors::multiple_one_of(&["a", "c"]);
        let c = FieldErrors::invalid_value("x", "d", None);

        let left = a.clone().also(b.clone()).also(c.clone());
        let right = c.also(a.also(b));
        assert_eq!(left.to_string(), right.to_string());
        assert_eq!(left, right);
    }

    #[test]
    fn test_same_message_merges_paths() {
        let errs = FieldErrors::missing_field(&["spec.b"])
            .also(FieldErrors::missing_field(&["spec.a", "spec.b"]));
        assert_eq!(errs.len(), 1);
        assert_eq!(errs.to_string(), "missing field(s): spec.a, spec.b");
    }

    #[test]
    fn test_render_sorted_by_first_path() {
        let errs = FieldErrors::missing_one_of(&["spec.taskRef", "spec.taskSpec"]).also(
            FieldErrors::generic(
                r#"invalid resource name "": must be a valid DNS label"#,
                &["metadata.name"],
            ),
        );
        assert_eq!(
            errs.to_string(),
            "invalid resource name \"\": must be a valid DNS label: metadata.name\n\
             expected exactly one, got neither: spec.taskRef, spec.taskSpec"
        );
    }

    #[test]
    fn test_via_field_and_index() {
        let errs = FieldErrors::multiple_one_of(&["name"]).via_field_index("stepOverrides", 1);
        assert_eq!(
            errs.to_string(),
            "expected exactly one, got both: stepOverrides[1].name"
        );

        let nested = FieldErrors::missing_field(&["claimName"])
            .via_field("persistentVolumeClaim")
            .via_field_index("workspaces", 0)
            .via_field("spec");
        assert_eq!(
            nested.to_string(),
            "missing field(s): spec.workspaces[0].persistentVolumeClaim.claimName"
        );
    }

    #[test]
    fn test_via_key() {
        let errs = FieldErrors::multiple_one_of(&["name"]).via_field_key("params", "foo");
        assert_eq!(errs.to_string(), "expected exactly one, got both: params[foo].name");
    }

    #[test]
    fn test_empty_path_takes_prefix() {
        let errs = FieldErrors::invalid_value("bad", "", None).via_field_index("tasks", 2);
        assert_eq!(errs.to_string(), "invalid value: bad: tasks[2]");
    }

    #[test]
    fn test_generic_without_paths_stays_pathless() {
        let errs = FieldErrors::generic("debug is not allowed", &[]).via_field("debug");
        assert_eq!(errs.to_string(), "debug is not allowed");
    }

    #[test]
    fn test_invalid_value_with_details() {
        let errs = FieldErrors::invalid_value(
            "invalid bundle reference",
            "taskRef.bundle",
            Some("could not parse reference: invalid reference"),
        );
        assert_eq!(
            errs.to_string(),
            "invalid value: invalid bundle reference: taskRef.bundle\n\
             could not parse reference: invalid reference"
        );
    }

    #[test]
    fn test_into_result() {
        assert!(FieldErrors::new().into_result().is_ok());
        assert!(FieldErrors::missing_field(&["x"]).into_result().is_err());
    }

    #[test]
    fn test_collect() {
        let errs: FieldErrors = (0..3)
            .map(|i| FieldErrors::missing_field(&["name"]).via_index(i))
            .collect();
        assert_eq!(errs.to_string(), "missing field(s): [0].name, [1].name, [2].name");
    }
}
