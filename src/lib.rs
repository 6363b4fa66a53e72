//! # Runspec - Task specification validation
//!
//! Runspec proves that a task run or pipeline specification is well formed
//! before it is scheduled, and extracts the cross-task result references
//! an orchestrator needs to order and wire tasks together.
//!
//! ## Features
//!
//! - **Composable errors**: every independent violation is reported with its field path
//! - **Feature gates**: optional fields are checked against immutable [`FeatureFlags`]
//! - **Result references**: `$(tasks.<task>.results.<result>)` expressions are
//!   found in string, array and object parameters and in `when` guards
//!
//! ## Example
//!
//! ```
//! use runspec::prelude::*;
//!
//! let run = TaskRun::new("build", TaskRunSpec::from_ref(TaskRef::named("compile")));
//! assert!(run.validate(&ValidationContext::default()).is_empty());
//!
//! let broken = TaskRun::new("build", TaskRunSpec::default());
//! assert_eq!(
//!     broken.validate(&ValidationContext::default()).to_string(),
//!     "expected exactly one, got neither: spec.taskRef, spec.taskSpec"
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod logging;
pub mod pipeline;
pub mod substitution;
pub mod validation;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use config::{ApiFields, ConfigError, FeatureFlags, GateState};
pub use logging::init_logging;
pub use pipeline::{
    PipelineSpec, PipelineTask, TaskRef, TaskRun, TaskRunSpec, TaskSpec, WhenExpression,
};
pub use substitution::{ResultRef, result_refs};
pub use validation::{FieldError, FieldErrors, Validate, ValidationContext};

/// Version of the runspec crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
