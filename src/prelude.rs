//! Prelude module for common imports

pub use crate::config::{ApiFields, FeatureFlags, GateState};
pub use crate::pipeline::{
    ImageReference, ObjectMeta, Operator, Param, ParamSpec, ParamType, ParamValue, PipelineSpec,
    PipelineTask, Step, TaskRef, TaskResourceBinding, TaskRun, TaskRunResources, TaskRunSpec,
    TaskSpec, Timeout, WhenExpression, WorkspaceBinding,
};
pub use crate::substitution::{ResultRef, Selector};
pub use crate::validation::{FieldError, FieldErrors, Validate, ValidationContext};
