//! Trust domain for CI role assumption.
//!
//! This crate owns the one piece of real logic in the deployment setup:
//! turning a list of trusted repositories and branches into the subject
//! matchers of an identity-federation trust policy, and rejecting input that
//! would produce a malformed or empty policy. Callers in the `assembly` crate
//! wrap the result in a policy document; this crate never sees the document.
//!
//! ## Architectural Layer
//!
//! **Business logic.** This crate has no I/O dependencies and no shared
//! state; every public operation is a pure function of its arguments.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`AccountId`, `RoleName`, `LogicalId`, etc.) |
//! | [`types`] | Trust input and output types (`RepositoryTrust`, `SubjectMatcher`) |
//! | [`builder`] | [`TrustPolicyBuilder`] |
//! | [`errors`] | [`ValidationError`] |

pub mod builder;
pub mod errors;
pub mod identifiers;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use builder::TrustPolicyBuilder;
pub use errors::{FieldKind, ValidationError};
pub use identifiers::{
    AccountId, BucketName, ConstructId, LogicalId, Region, RepositoryRef, RoleName,
};
pub use types::{RepositoryTrust, SubjectMatcher, TrustPolicyInput};
