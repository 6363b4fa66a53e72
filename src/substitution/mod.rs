//! Embedded-expression extraction and task result references.
//!
//! Parameters and when expressions may embed `$(...)` expressions. This
//! module finds them ([`scanner`]), classifies each one ([`result_ref`])
//! and collects, for one task, every result of another task it consumes.

pub mod result_ref;
pub mod scanner;

pub use result_ref::{
    ResultRef, Selector, looks_like_contains_result_refs, looks_like_result_ref, new_result_refs,
};
pub use scanner::{OPEN_DELIMITER, scan, scan_all};

use crate::pipeline::params::Param;
use crate::pipeline::when::WhenExpression;

/// Collects the result references of a task's params and when expressions
///
/// Params are visited in declaration order, then each when expression's
/// input followed by its values. Expressions that are not references are
/// skipped and nothing is de-duplicated.
#[must_use]
pub fn result_refs(params: &[Param], when: &[WhenExpression]) -> Vec<ResultRef> {
    let param_expressions = params
        .iter()
        .filter_map(|param| param.value.substitution_expressions());
    let when_expressions = when
        .iter()
        .filter_map(WhenExpression::substitution_expressions);

    param_expressions
        .chain(when_expressions)
        .flat_map(|expressions| {
            expressions
                .into_iter()
                .filter_map(|expression| match ResultRef::parse(&expression) {
                    Some(reference) => Some(reference),
                    None => {
                        if looks_like_result_ref(&expression) {
                            tracing::trace!(%expression, "skipping malformed result reference");
                        }
                        None
                    }
                })
        })
        .collect()
}
