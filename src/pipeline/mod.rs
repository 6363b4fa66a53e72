//! Specification domain types and their validators
//!
//! Task runs, inline and referenced task definitions, workspace and
//! resource bindings, and the pipeline tasks whose parameters and guards
//! carry result references.

pub mod duration;
pub mod image_ref;
pub mod params;
pub mod pipeline_task;
pub mod resource;
pub mod task;
pub mod task_ref;
pub mod taskrun;
pub mod when;
pub mod workspace;

// Re-export public types from submodules
pub use duration::{DurationError, Timeout, format_duration, parse_duration};
pub use image_ref::{ImageReference, ReferenceError};
pub use params::{Param, ParamSpec, ParamType, ParamValue, validate_param_names};
pub use pipeline_task::{PipelineSpec, PipelineTask};
pub use resource::{
    KnownResourceTypes, PipelineResourceRef, PipelineResourceSpec, ResourceParam,
    ResourceSpecValidator, TaskResourceBinding, TaskRunResources,
};
pub use task::{Step, TaskResult, TaskSpec};
pub use task_ref::{ResolverParam, TaskRef};
pub use taskrun::{
    ObjectMeta, ResourceRequirements, TASK_RUN_CANCELLED, TaskRun, TaskRunDebug,
    TaskRunSidecarOverride, TaskRunSpec, TaskRunStepOverride,
};
pub use when::{Operator, WhenExpression};
pub use workspace::{
    ConfigMapSource, EmptyDirSource, PersistentVolumeClaimSource, SecretSource, VolumeClaimTemplate,
    WorkspaceBinding, validate_workspace_bindings,
};
