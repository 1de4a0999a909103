//! Validation errors for trust-policy input.
//!
//! Every variant describes a static configuration defect. None of them is
//! transient, so callers must surface the error to the operator and stop
//! whatever synthesis step depends on the trust policy. There is no retry.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::RepositoryRef;

// ---------------------------------------------------------------------------
// Field kinds
// ---------------------------------------------------------------------------

/// The part of a repository declaration a [`ValidationError::MalformedField`]
/// refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// The repository owner (user or organisation).
    Owner,
    /// The repository name.
    Name,
    /// One of the declared branches.
    Branch,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FieldKind::Owner => "owner",
            FieldKind::Name => "name",
            FieldKind::Branch => "branch",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// Errors produced while validating a [`crate::TrustPolicyInput`].
///
/// Validation is atomic: when any of these is returned, no subject matchers
/// were produced for any repository in the input.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    /// The input declares zero repositories.
    #[error("at least one repository is required")]
    NoRepositories,

    /// A declared repository has zero branches.
    #[error("each repository needs at least one branch: '{repository}' has none")]
    NoBranches {
        /// The repository with no branches.
        repository: RepositoryRef,
    },

    /// A field contains a value that would corrupt the subject-matcher
    /// template (empty, whitespace, or a delimiter in the wrong place).
    #[error("malformed {field} '{value}': {reason}")]
    MalformedField {
        /// Which field was rejected.
        field: FieldKind,
        /// The rejected value, verbatim.
        value: String,
        /// Short description of the rule that was broken.
        reason: String,
    },
}
