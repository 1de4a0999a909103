//! Newtype domain identifiers.
//!
//! Every configuration value with an identity is a distinct newtype wrapping a
//! `String`. This prevents accidentally interchanging, for example, a
//! [`RoleName`] with a [`BucketName`] even though both are plain strings when
//! they reach the provisioning engine.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or_else(|| {
                    format!("{} cannot be empty", stringify!($name))
                })
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — cloud account / environment
// ---------------------------------------------------------------------------

/// A cloud account identifier: exactly twelve ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Number of digits in a valid account id.
    pub const LEN: usize = 12;

    /// Creates an [`AccountId`], returning `None` unless `value` is exactly
    /// [`Self::LEN`] ASCII digits.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.len() == Self::LEN && v.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(v))
        } else {
            None
        }
    }

    /// Returns the account id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value.clone())
            .ok_or_else(|| format!("account id must be {} digits, got '{value}'", Self::LEN))
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> String {
        id.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

string_id! {
    /// A cloud region name (e.g. `"eu-west-1"`).
    Region
}

// ---------------------------------------------------------------------------
// Identifiers — resource naming
// ---------------------------------------------------------------------------

string_id! {
    /// Physical name given to the role assumed from CI.
    RoleName
}

string_id! {
    /// Physical name of a storage bucket.
    BucketName
}

string_id! {
    /// Identifies a construct (stack, stage, or nested construct) within its
    /// parent scope (e.g. `"pipeline"`, `"dev"`, `"my-api"`).
    ConstructId
}

string_id! {
    /// Identifies a resource within a single stack template.
    ///
    /// Logical ids are unique per stack; the registry rejects duplicates.
    LogicalId
}

// ---------------------------------------------------------------------------
// Identifiers — source control
// ---------------------------------------------------------------------------

/// Identifies a source-control repository in `"owner/name"` form.
///
/// Used in validation error payloads so an operator can find the offending
/// entry in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    /// Account or organisation that owns the repository.
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepositoryRef {
    /// Creates a new [`RepositoryRef`].
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_id_rejects_empty() {
        assert!(RoleName::new("").is_none());
        assert_eq!(
            RoleName::new("github-actions-role").map(|r| r.to_string()),
            Some("github-actions-role".to_string())
        );
    }

    #[test]
    fn test_account_id_requires_twelve_digits() {
        assert!(AccountId::new("123456789012").is_some());
        assert!(AccountId::new("12345678901").is_none());
        assert!(AccountId::new("1234567890123").is_none());
        assert!(AccountId::new("12345678901a").is_none());
    }

    #[test]
    fn test_account_id_deserialize_reports_value() {
        let err = serde_json::from_str::<AccountId>("\"42\"").unwrap_err();
        assert!(err.to_string().contains("'42'"));
    }

    #[test]
    fn test_string_id_deserialize_rejects_empty() {
        assert!(serde_json::from_str::<Region>("\"\"").is_err());
        let region: Region = serde_json::from_str("\"eu-west-1\"").unwrap();
        assert_eq!(region.as_str(), "eu-west-1");
    }

    #[test]
    fn test_repository_ref_display() {
        assert_eq!(RepositoryRef::new("A", "R1").to_string(), "A/R1");
    }
}
