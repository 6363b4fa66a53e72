//! Validation rules for common patterns

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use super::{FieldError, FieldErrors};

/// Maximum length of a DNS label
pub const DNS_LABEL_MAX_LENGTH: usize = 63;

/// Detail attached to step names that are not DNS labels
pub const STEP_NAME_DETAILS: &str = "Task step name must be a valid DNS Label, For more info refer to https://kubernetes.io/docs/concepts/overview/working-with-objects/names/#names";

static DNS_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid DNS label pattern"));

/// Returns true if `name` is a lowercase RFC 1123 label
#[must_use]
pub fn is_dns_label(name: &str) -> bool {
    name.len() <= DNS_LABEL_MAX_LENGTH && DNS_LABEL.is_match(name)
}

/// Validates an object identity, reported at `name`
#[must_use]
pub fn validate_object_name(name: &str) -> FieldErrors {
    if !DNS_LABEL.is_match(name) {
        return FieldErrors::generic(
            format!("invalid resource name {name:?}: must be a valid DNS label"),
            &["name"],
        );
    }
    if name.len() > DNS_LABEL_MAX_LENGTH {
        return FieldErrors::generic(
            format!(
                "Invalid resource name: length must be no more than {DNS_LABEL_MAX_LENGTH} characters"
            ),
            &["name"],
        );
    }
    FieldErrors::new()
}

/// Validates a step identity, reported at `name`
#[must_use]
pub fn validate_step_name(name: &str) -> FieldErrors {
    if is_dns_label(name) {
        return FieldErrors::new();
    }
    FieldError::new(format!("invalid value {name:?}"), &["name"])
        .with_details(STEP_NAME_DETAILS)
        .into()
}

/// Returns the positions of names already seen earlier in the sequence
///
/// Empty names are skipped. With `case_insensitive` the comparison is made
/// on the ASCII-lowercased name.
pub fn duplicate_positions<'a>(
    names: impl IntoIterator<Item = &'a str>,
    case_insensitive: bool,
) -> Vec<usize> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty())
        .filter_map(|(i, name)| {
            let key = if case_insensitive {
                name.to_ascii_lowercase()
            } else {
                name.to_string()
            };
            (!seen.insert(key)).then_some(i)
        })
        .collect()
}

/// Mutually-exclusive violation on `field[i].name` for every repeated name
#[must_use]
pub fn validate_unique_names<'a>(
    field: &str,
    names: impl IntoIterator<Item = &'a str>,
    case_insensitive: bool,
) -> FieldErrors {
    duplicate_positions(names, case_insensitive)
        .into_iter()
        .map(|i| FieldErrors::multiple_one_of(&["name"]).via_field_index(field, i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("taskrname", true)]
    #[case("a", true)]
    #[case("my-task-1", true)]
    #[case("", false)]
    #[case("-leading", false)]
    #[case("trailing-", false)]
    #[case("Upper", false)]
    #[case("has.dot", false)]
    #[case("invalid-name-with-$weird-char/%", false)]
    fn test_is_dns_label(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_dns_label(name), expected);
    }

    #[test]
    fn test_dns_label_length() {
        assert!(is_dns_label(&"a".repeat(63)));
        assert!(!is_dns_label(&"a".repeat(64)));
    }

    #[test]
    fn test_validate_object_name() {
        assert!(validate_object_name("tr").is_empty());
        assert_eq!(
            validate_object_name("").to_string(),
            r#"invalid resource name "": must be a valid DNS label: name"#
        );
        assert_eq!(
            validate_object_name(&"a".repeat(64)).to_string(),
            "Invalid resource name: length must be no more than 63 characters: name"
        );
    }

    #[test]
    fn test_validate_step_name() {
        assert!(validate_step_name("mystep").is_empty());
        let errs = validate_step_name("Bad_Name").violations();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].message, r#"invalid value "Bad_Name""#);
        assert_eq!(errs[0].details.as_deref(), Some(STEP_NAME_DETAILS));
    }

    #[test]
    fn test_duplicate_positions() {
        assert_eq!(duplicate_positions(["a", "b", "a", "a"], false), vec![2, 3]);
        assert_eq!(duplicate_positions(["FOO", "foo"], false), Vec::<usize>::new());
        assert_eq!(duplicate_positions(["FOO", "foo"], true), vec![1]);
        assert_eq!(duplicate_positions(["", ""], false), Vec::<usize>::new());
    }

    #[test]
    fn test_validate_unique_names() {
        let errs = validate_unique_names("workspaces", ["ws", "ws"], false);
        assert_eq!(
            errs.to_string(),
            "expected exactly one, got both: workspaces[1].name"
        );
    }
}
