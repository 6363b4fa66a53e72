//! Result reference extraction across parameters and guards.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use runspec::prelude::*;
use runspec::substitution::{
    looks_like_contains_result_refs, looks_like_result_ref, new_result_refs, result_refs, scan,
};
use std::collections::HashMap;

fn refs_of(value: ParamValue) -> Vec<ResultRef> {
    result_refs(&[Param::new("p", value)], &[])
}

#[test]
fn test_whole_result() {
    assert_eq!(
        refs_of("$(tasks.sumTask.results.sumResult)".into()),
        vec![ResultRef::new("sumTask", "sumResult")]
    );
}

#[test]
fn test_indexed_result() {
    assert_eq!(
        refs_of("$(tasks.sumTask.results.sumResult[1])".into()),
        vec![ResultRef::new("sumTask", "sumResult").with_index(1)]
    );
}

#[test]
fn test_param_expression_is_not_a_reference() {
    let expressions: Vec<&str> = scan("$(params.paramName)");
    assert!(new_result_refs(&expressions).is_empty());
    assert!(!looks_like_contains_result_refs(&expressions));
    assert!(refs_of("$(params.paramName)".into()).is_empty());
}

#[test]
fn test_object_param_is_order_independent() {
    let value = ParamValue::Object(HashMap::from([
        ("a".to_string(), "$(tasks.t1.results.r1)".to_string()),
        ("b".to_string(), "$(tasks.t2.results.r2.key)".to_string()),
        ("c".to_string(), "plain".to_string()),
    ]));
    let mut found = refs_of(value);
    found.sort();
    assert_eq!(
        found,
        vec![
            ResultRef::new("t1", "r1"),
            ResultRef::new("t2", "r2").with_property("key"),
        ]
    );
}

#[test]
fn test_pipeline_task_from_yaml() {
    let task: PipelineTask = serde_yaml::from_str(
        r"
name: report
taskRef: {name: reporter}
params:
  - name: summary
    value: 'total $(tasks.sum.results.total) of $(tasks.count.results.items[*])'
  - name: flags
    value: ['$(tasks.lint.results.flags[2])', '--verbose']
when:
  - input: $(tasks.test.results.status)
    operator: in
    values: [passed, '$(tasks.gate.results.allowed)']
",
    )
    .unwrap();

    assert_eq!(
        task.result_refs(),
        vec![
            ResultRef::new("sum", "total"),
            ResultRef::new("count", "items"),
            ResultRef::new("lint", "flags").with_index(2),
            ResultRef::new("test", "status"),
            ResultRef::new("gate", "allowed"),
        ]
    );
}

fn token() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,20}"
}

proptest! {
    #[test]
    fn prop_reference_in_text(task in token(), result in token(), prefix in "[a-z ]{0,10}") {
        let text = format!("{prefix}$(tasks.{task}.results.{result})");
        prop_assert_eq!(refs_of(text.as_str().into()), vec![ResultRef::new(&task, &result)]);
    }

    #[test]
    fn prop_suffix_forms(task in token(), result in token(), index in 0usize..1000, property in token()) {
        prop_assert_eq!(
            refs_of(format!("$(tasks.{task}.results.{result}[*])").into()),
            vec![ResultRef::new(&task, &result)]
        );
        prop_assert_eq!(
            refs_of(format!("$(tasks.{task}.results.{result}[{index}])").into()),
            vec![ResultRef::new(&task, &result).with_index(index)]
        );
        prop_assert_eq!(
            refs_of(format!("$(tasks.{task}.results.{result}.{property})").into()),
            vec![ResultRef::new(&task, &result).with_property(&property)]
        );
    }

    #[test]
    fn prop_typos_are_look_alikes(task in token(), result in token()) {
        for text in [
            format!("task.{task}.results.{result}"),
            format!("tasks.{task}.result.{result}"),
        ] {
            prop_assert!(ResultRef::parse(&text).is_none());
            prop_assert!(looks_like_result_ref(&text));
        }
    }

    #[test]
    fn prop_declaration_order(names in proptest::collection::vec(token(), 1..6)) {
        let params: Vec<Param> = names
            .iter()
            .map(|n| Param::new(n.as_str(), format!("$(tasks.{n}.results.out)")))
            .collect();
        let expected: Vec<ResultRef> = names.iter().map(|n| ResultRef::new(n, "out")).collect();
        prop_assert_eq!(result_refs(&params, &[]), expected);
    }
}
