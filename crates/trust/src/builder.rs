//! Subject-matcher construction for identity-federation trust policies.
//!
//! [`TrustPolicyBuilder::build`] turns a [`TrustPolicyInput`] into the ordered
//! list of [`SubjectMatcher`] values used as the `StringLike` condition of a
//! web-identity trust policy. The whole input is validated before any matcher
//! is rendered, so either every matcher is returned or none is.
//!
//! `*` and `?` are accepted in every field: they are `StringLike` wildcards
//! (e.g. `feature/*`) and are passed through untouched.

use tracing::{debug, warn};

use crate::{FieldKind, RepositoryTrust, SubjectMatcher, TrustPolicyInput, ValidationError};

/// Builds subject matchers from declared repositories and branches.
///
/// Stateless: every call is an independent pure function of its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustPolicyBuilder;

impl TrustPolicyBuilder {
    /// Validates `input` and renders one matcher per (repository, branch)
    /// pair, repositories in input order and branches in declared order.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::NoRepositories`] if `input` is empty.
    /// - [`ValidationError::MalformedField`] for the first owner, name, or
    ///   branch that would corrupt the matcher template.
    /// - [`ValidationError::NoBranches`] for the first repository declaring
    ///   no branches.
    pub fn build(input: &TrustPolicyInput) -> Result<Vec<SubjectMatcher>, ValidationError> {
        Self::validate(input)
            .inspect_err(|e| warn!(error = %e, "Rejected trust policy input"))?;

        let mut matchers = Vec::with_capacity(input.branch_count());
        for repo in &input.repositories {
            for branch in &repo.branches {
                let matcher = SubjectMatcher::render(&repo.owner, &repo.name, branch);
                debug!(
                    repository = %repo.repository_ref(),
                    branch = %branch,
                    subject = matcher.as_str(),
                    "Emitted subject matcher"
                );
                matchers.push(matcher);
            }
        }
        Ok(matchers)
    }

    /// Checks every precondition of [`Self::build`] without rendering output.
    pub fn validate(input: &TrustPolicyInput) -> Result<(), ValidationError> {
        if input.repositories.is_empty() {
            return Err(ValidationError::NoRepositories);
        }
        input.repositories.iter().try_for_each(validate_repository)
    }
}

fn validate_repository(repo: &RepositoryTrust) -> Result<(), ValidationError> {
    check_path_segment(FieldKind::Owner, &repo.owner)?;
    check_path_segment(FieldKind::Name, &repo.name)?;

    if repo.branches.is_empty() {
        return Err(ValidationError::NoBranches {
            repository: repo.repository_ref(),
        });
    }
    repo.branches.iter().try_for_each(|b| check_branch(b))
}

/// Owner and repository name sit between `repo:` and `:ref:`, separated by a
/// single `/`, so neither may contain `:` or `/`.
fn check_path_segment(field: FieldKind, value: &str) -> Result<(), ValidationError> {
    check_common(field, value)?;
    if value.contains('/') {
        return Err(malformed(field, value, "contains '/'"));
    }
    Ok(())
}

fn check_branch(value: &str) -> Result<(), ValidationError> {
    let field = FieldKind::Branch;
    check_common(field, value)?;
    if value.starts_with('/') || value.ends_with('/') {
        return Err(malformed(field, value, "must not start or end with '/'"));
    }
    if value.starts_with("refs/") {
        return Err(malformed(field, value, "must be a bare branch name, not a ref"));
    }
    Ok(())
}

fn check_common(field: FieldKind, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(malformed(field, value, "must not be empty"));
    }
    if value.contains(':') {
        return Err(malformed(field, value, "contains ':'"));
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(malformed(
            field,
            value,
            "contains whitespace or control characters",
        ));
    }
    Ok(())
}

fn malformed(field: FieldKind, value: &str, reason: &str) -> ValidationError {
    ValidationError::MalformedField {
        field,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
