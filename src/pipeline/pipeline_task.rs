//! Pipelines and the tasks they compose.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::pipeline::params::{Param, ParamSpec, validate_param_names};
use crate::pipeline::task::TaskSpec;
use crate::pipeline::task_ref::TaskRef;
use crate::pipeline::when::WhenExpression;
use crate::substitution::{self, ResultRef, looks_like_result_ref};
use crate::validation::rules::{is_dns_label, validate_unique_names};
use crate::validation::{FieldErrors, Validate, ValidationContext};

/// Task placed in a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTask {
    /// Name, unique within the pipeline
    pub name: String,

    /// Referenced task
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_ref: Option<TaskRef>,

    /// Inline task
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_spec: Option<TaskSpec>,

    /// Parameter values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,

    /// Guards deciding whether the task runs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub when: Vec<WhenExpression>,

    /// Tasks that must finish first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub run_after: Vec<String>,
}

impl PipelineTask {
    /// Places a referenced task in a pipeline
    #[must_use]
    pub fn new(name: impl Into<String>, task_ref: TaskRef) -> Self {
        Self {
            name: name.into(),
            task_ref: Some(task_ref),
            ..Self::default()
        }
    }

    /// Adds a parameter value
    #[must_use]
    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Adds a guard
    #[must_use]
    pub fn with_when(mut self, when: WhenExpression) -> Self {
        self.when.push(when);
        self
    }

    /// Adds an explicit ordering dependency
    #[must_use]
    pub fn with_run_after(mut self, task: impl Into<String>) -> Self {
        self.run_after.push(task.into());
        self
    }

    /// Result references of the params, then of the guards
    #[must_use]
    pub fn result_refs(&self) -> Vec<ResultRef> {
        substitution::result_refs(&self.params, &self.when)
    }

    /// Names of every task this one must wait for
    #[must_use]
    pub fn dependencies(&self) -> BTreeSet<String> {
        self.run_after
            .iter()
            .cloned()
            .chain(self.result_refs().into_iter().map(|r| r.pipeline_task))
            .collect()
    }
}

// Every look-alike in `expressions` must parse as a strict reference.
fn validate_look_alikes(expressions: Option<Vec<String>>, path: &str) -> FieldErrors {
    let Some(expressions) = expressions else {
        return FieldErrors::new();
    };
    let look_alikes: Vec<&str> = expressions
        .iter()
        .map(String::as_str)
        .filter(|e| looks_like_result_ref(e))
        .collect();
    let parsed: Vec<&str> = look_alikes
        .iter()
        .copied()
        .filter(|e| ResultRef::parse(e).is_some())
        .collect();
    if parsed.len() == look_alikes.len() {
        return FieldErrors::new();
    }
    FieldErrors::invalid_value(
        format!(
            "expected all of the expressions [{}] to be result expressions but only [{}] were",
            look_alikes.join(" "),
            parsed.join(" ")
        ),
        path,
        None,
    )
}

impl Validate for PipelineTask {
    fn validate(&self, ctx: &ValidationContext) -> FieldErrors {
        let mut errs = FieldErrors::new();
        if !is_dns_label(&self.name) {
            errs = errs.also(FieldErrors::invalid_value(
                format!("pipeline task name {:?} must be a valid DNS Label", self.name),
                "name",
                None,
            ));
        }

        errs = errs.also(match (&self.task_ref, &self.task_spec) {
            (None, None) => FieldErrors::missing_one_of(&["taskRef", "taskSpec"]),
            (Some(_), Some(_)) => FieldErrors::multiple_one_of(&["taskRef", "taskSpec"]),
            _ => FieldErrors::new(),
        });
        errs = errs.also(self.task_ref.validate(ctx).via_field("taskRef"));
        errs = errs.also(self.task_spec.validate(ctx).via_field("taskSpec"));

        errs = errs.also(validate_param_names(&self.params).via_field("params"));
        for (i, param) in self.params.iter().enumerate() {
            errs = errs.also(
                validate_look_alikes(param.value.substitution_expressions(), "value")
                    .via_field_index("params", i),
            );
        }

        errs = errs.also(self.when.validate(ctx).via_field("when"));
        for (i, guard) in self.when.iter().enumerate() {
            errs = errs.also(
                validate_look_alikes(guard.substitution_expressions(), "")
                    .via_field_index("when", i),
            );
        }
        errs
    }
}

/// Directed graph of tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSpec {
    /// Description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Accepted parameters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParamSpec>,

    /// Tasks
    #[serde(default)]
    pub tasks: Vec<PipelineTask>,
}

impl PipelineSpec {
    /// Creates a pipeline from its tasks
    #[must_use]
    pub fn with_tasks(tasks: Vec<PipelineTask>) -> Self {
        Self {
            tasks,
            ..Self::default()
        }
    }

    fn validate_references(&self) -> FieldErrors {
        let declared: HashSet<&str> = self.tasks.iter().map(|t| t.name.as_str()).collect();
        let mut errs = FieldErrors::new();
        for (i, task) in self.tasks.iter().enumerate() {
            for reference in task.result_refs() {
                let details = if reference.pipeline_task == task.name {
                    Some("a task cannot consume its own results".to_string())
                } else if !declared.contains(reference.pipeline_task.as_str()) {
                    Some(format!(
                        "task {:?} is not declared in this pipeline",
                        reference.pipeline_task
                    ))
                } else {
                    None
                };
                if let Some(details) = details {
                    errs = errs.also(
                        FieldErrors::invalid_value(&reference, "", Some(details.as_str()))
                            .via_field_index("tasks", i),
                    );
                }
            }
            for target in &task.run_after {
                if *target == task.name || !declared.contains(target.as_str()) {
                    errs = errs.also(
                        FieldErrors::invalid_value(target, "runAfter", None)
                            .via_field_index("tasks", i),
                    );
                }
            }
        }
        errs
    }
}

impl Validate for PipelineSpec {
    fn validate(&self, ctx: &ValidationContext) -> FieldErrors {
        let mut errs = FieldErrors::new();
        if self.tasks.is_empty() {
            errs = errs.also(FieldErrors::missing_field(&["tasks"]));
        }
        errs = errs.also(self.params.validate(ctx).via_field("params"));
        errs = errs.also(validate_unique_names(
            "params",
            self.params.iter().map(|p| p.name.as_str()),
            true,
        ));
        errs = errs.also(self.tasks.validate(ctx).via_field("tasks"));
        errs = errs.also(validate_unique_names(
            "tasks",
            self.tasks.iter().map(|t| t.name.as_str()),
            false,
        ));
        errs.also(self.validate_references())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::params::ParamValue;
    use crate::pipeline::when::Operator;
    use pretty_assertions::assert_eq;

    fn ctx() -> ValidationContext {
        ValidationContext::default()
    }

    fn task(name: &str) -> PipelineTask {
        PipelineTask::new(name, TaskRef::named("build"))
    }

    #[test]
    fn test_result_refs_and_dependencies() {
        let consumer = task("deploy")
            .with_param(Param::new("digest", "$(tasks.build.results.digest)"))
            .with_when(WhenExpression::new(
                "$(tasks.test.results.status)",
                Operator::In,
                ["passed"],
            ))
            .with_run_after("lint");
        assert_eq!(
            consumer.result_refs(),
            vec![
                ResultRef::new("build", "digest"),
                ResultRef::new("test", "status"),
            ]
        );
        assert_eq!(
            consumer.dependencies().into_iter().collect::<Vec<_>>(),
            vec!["build".to_string(), "lint".to_string(), "test".to_string()]
        );
    }

    #[test]
    fn test_valid_pipeline() {
        let pipeline = PipelineSpec::with_tasks(vec![
            task("build"),
            task("deploy")
                .with_param(Param::new("image", "$(tasks.build.results.image) $(params.tag)"))
                .with_param(Param::new(
                    "tags",
                    ParamValue::array(["$(tasks.build.results.tags[0])"]),
                ))
                .with_run_after("build"),
        ]);
        assert!(pipeline.validate(&ctx()).is_empty());
    }

    #[test]
    fn test_look_alike_param() {
        let pt = task("consumer").with_param(Param::new(
            "a",
            "$(tasks.sumTask1.results.sumResult) $(task.sumTask2.results.sumResult)",
        ));
        assert_eq!(
            pt.validate(&ctx()).to_string(),
            "invalid value: expected all of the expressions \
             [tasks.sumTask1.results.sumResult task.sumTask2.results.sumResult] \
             to be result expressions but only [tasks.sumTask1.results.sumResult] were: params[0].value"
        );
    }

    #[test]
    fn test_look_alike_lists_share_form() {
        let pt = task("consumer").with_param(Param::new(
            "a",
            "$(tasks.a.results.r.key) $(tasks.b.result.r) $(params.p)",
        ));
        assert_eq!(
            pt.validate(&ctx()).to_string(),
            "invalid value: expected all of the expressions \
             [tasks.a.results.r.key tasks.b.result.r] \
             to be result expressions but only [tasks.a.results.r.key] were: params[0].value"
        );
    }

    #[test]
    fn test_look_alike_when() {
        let pt = task("consumer").with_when(WhenExpression::new(
            "$(tasks.sumTask.result.sumResult)",
            Operator::NotIn,
            ["foo"],
        ));
        assert_eq!(
            pt.validate(&ctx()).to_string(),
            "invalid value: expected all of the expressions \
             [tasks.sumTask.result.sumResult] to be result expressions but only [] were: when[0]"
        );
    }

    #[test]
    fn test_task_name_and_definition() {
        let pt = PipelineTask {
            name: "Bad_Name".to_string(),
            ..PipelineTask::default()
        };
        assert_eq!(
            pt.validate(&ctx()).to_string(),
            "invalid value: pipeline task name \"Bad_Name\" must be a valid DNS Label: name\n\
             expected exactly one, got neither: taskRef, taskSpec"
        );
    }

    #[test]
    fn test_empty_pipeline() {
        assert_eq!(
            PipelineSpec::default().validate(&ctx()).to_string(),
            "missing field(s): tasks"
        );
    }

    #[test]
    fn test_duplicate_task_names() {
        let pipeline = PipelineSpec::with_tasks(vec![task("a"), task("a")]);
        assert_eq!(
            pipeline.validate(&ctx()).to_string(),
            "expected exactly one, got both: tasks[1].name"
        );
    }

    #[test]
    fn test_reference_targets() {
        let pipeline = PipelineSpec::with_tasks(vec![
            task("a").with_param(Param::new("own", "$(tasks.a.results.r)")),
            task("b")
                .with_param(Param::new("missing", "$(tasks.ghost.results.r)"))
                .with_run_after("nowhere"),
        ]);
        let violations = pipeline.validate(&ctx()).violations();
        assert_eq!(violations.len(), 3);
        assert_eq!(violations[0].message, "invalid value: $(tasks.a.results.r)");
        assert_eq!(violations[0].paths, vec!["tasks[0]".to_string()]);
        assert_eq!(
            violations[0].details.as_deref(),
            Some("a task cannot consume its own results")
        );
        assert_eq!(violations[1].message, "invalid value: $(tasks.ghost.results.r)");
        assert_eq!(violations[1].paths, vec!["tasks[1]".to_string()]);
        assert_eq!(violations[2].message, "invalid value: nowhere");
        assert_eq!(violations[2].paths, vec!["tasks[1].runAfter".to_string()]);
    }
}
