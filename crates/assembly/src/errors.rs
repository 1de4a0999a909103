//! Errors raised while declaring or synthesizing the resource graph.
//!
//! All of these are configuration defects detected before anything is handed
//! to the provisioning engine. Trust-input problems are carried through
//! unchanged as [`AssemblyError::Trust`] so the operator sees the exact
//! [`trust::ValidationError`].

use thiserror::Error;

use trust::ValidationError;

/// Errors that stop synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    /// The trusted-repository list failed validation.
    #[error("invalid trust configuration: {0}")]
    Trust(#[from] ValidationError),

    /// A logical id is empty or contains characters other than ASCII
    /// letters and digits.
    #[error("invalid logical id '{logical_id}': only ASCII letters and digits are allowed")]
    InvalidLogicalId {
        /// The rejected id.
        logical_id: String,
    },

    /// A construct id is empty.
    #[error("construct id must not be empty")]
    EmptyConstructId,

    /// Two resources in one stack were registered under the same logical id.
    #[error("stack '{stack}' already has a resource '{logical_id}'")]
    DuplicateLogicalId {
        /// Stack the collision happened in.
        stack: String,
        /// The duplicated id.
        logical_id: String,
    },

    /// Two outputs in one stack share a name.
    #[error("stack '{stack}' already has an output '{output}'")]
    DuplicateOutput {
        /// Stack the collision happened in.
        stack: String,
        /// The duplicated output name.
        output: String,
    },

    /// Two stacks or stages were registered under the same construct id.
    #[error("construct '{id}' is already registered in this scope")]
    DuplicateConstruct {
        /// The duplicated construct id.
        id: String,
    },

    /// A resource or output refers to a logical id that is not in its stack.
    #[error("'{from}' in stack '{stack}' refers to unknown resource '{to}'")]
    DanglingReference {
        /// Stack containing the reference.
        stack: String,
        /// The resource or output holding the reference.
        from: String,
        /// The missing logical id.
        to: String,
    },

    /// A pipeline deploys a stage that was never added to the app.
    #[error("pipeline '{pipeline}' deploys unknown stage '{stage}'")]
    UnknownStage {
        /// Logical id of the pipeline resource.
        pipeline: String,
        /// The missing stage id.
        stage: String,
    },

    /// A shell step reads an output no stack in the deployed stage declares.
    #[error("step '{step}' reads unknown output '{stack}.{output}' in stage '{stage}'")]
    UnknownOutput {
        /// Name of the shell step.
        step: String,
        /// Stage the step runs after.
        stage: String,
        /// Stack id the output was expected in.
        stack: String,
        /// Output name.
        output: String,
    },
}
