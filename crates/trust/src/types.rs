//! Value types for trust-policy input and output.
//!
//! Input types ([`RepositoryTrust`], [`TrustPolicyInput`]) are plain data
//! deserialised from configuration and are *not* validated on construction;
//! [`crate::TrustPolicyBuilder`] validates the whole input at once. The output
//! type [`SubjectMatcher`] can only be produced by the builder, so holding one
//! means it passed validation.

use serde::{Deserialize, Serialize};

use crate::RepositoryRef;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One source-control repository allowed to assume the CI role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryTrust {
    /// Account or organisation that owns the repository.
    pub owner: String,

    /// Repository name.
    pub name: String,

    /// Branches the role may be assumed from, in declaration order.
    ///
    /// Order has no semantic meaning but is preserved so the generated
    /// policy document is reproducible.
    pub branches: Vec<String>,
}

impl RepositoryTrust {
    /// Creates a new [`RepositoryTrust`].
    pub fn new<I, S>(owner: impl Into<String>, name: impl Into<String>, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            owner: owner.into(),
            name: name.into(),
            branches: branches.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the `owner/name` reference for this repository.
    pub fn repository_ref(&self) -> RepositoryRef {
        RepositoryRef::new(&self.owner, &self.name)
    }
}

// ---------------------------------------------------------------------------

/// The full set of repositories trusted by a single role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustPolicyInput {
    /// Trusted repositories, in declaration order.
    pub repositories: Vec<RepositoryTrust>,
}

impl TrustPolicyInput {
    /// Creates a [`TrustPolicyInput`] from repositories in declaration order.
    pub fn new(repositories: Vec<RepositoryTrust>) -> Self {
        Self { repositories }
    }

    /// Total number of (repository, branch) pairs declared.
    pub fn branch_count(&self) -> usize {
        self.repositories.iter().map(|r| r.branches.len()).sum()
    }
}

impl FromIterator<RepositoryTrust> for TrustPolicyInput {
    fn from_iter<T: IntoIterator<Item = RepositoryTrust>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// A pattern matched against the federated token's subject claim.
///
/// Always of the form `repo:{owner}/{name}:ref:refs/heads/{branch}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SubjectMatcher(String);

impl SubjectMatcher {
    /// Renders the matcher for one validated (repository, branch) pair.
    pub(crate) fn render(owner: &str, name: &str, branch: &str) -> Self {
        Self(format!("repo:{owner}/{name}:ref:refs/heads/{branch}"))
    }

    /// Returns the matcher as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SubjectMatcher {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
