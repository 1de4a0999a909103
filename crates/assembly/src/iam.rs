//! Identity documents: the web-identity trust policy and inline permission
//! statements.

use serde_json::{json, Value};
use trust::SubjectMatcher;

use crate::Expr;

/// Policy language version written into every document.
pub const POLICY_VERSION: &str = "2012-10-17";

// ---------------------------------------------------------------------------
// Federation constants
// ---------------------------------------------------------------------------

/// Fixed values of the CI identity federation.
///
/// These belong to the caller rather than to the subject-matcher builder so
/// another issuer can be configured without touching validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederationSettings {
    /// Issuer URL of the OIDC provider.
    pub issuer_url: String,
    /// Audience (client id) tokens are issued for.
    pub audience: String,
    /// Condition key carrying the token's subject claim.
    pub subject_claim: String,
    /// Action granted to federated principals.
    pub action: String,
}

impl Default for FederationSettings {
    fn default() -> Self {
        Self {
            issuer_url: "https://token.actions.githubusercontent.com".to_string(),
            audience: "sts.amazonaws.com".to_string(),
            subject_claim: "token.actions.githubusercontent.com:sub".to_string(),
            action: "sts:AssumeRoleWithWebIdentity".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Trust policy
// ---------------------------------------------------------------------------

/// The assume-role document attached to the CI role.
///
/// A single `Allow` statement for the federated provider, conditioned with
/// `StringLike` on the subject claim against every matcher in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPolicyDocument {
    provider: Expr,
    subjects: Vec<SubjectMatcher>,
    subject_claim: String,
    action: String,
}

impl TrustPolicyDocument {
    /// Creates the document for `provider` (an ARN literal or a reference to
    /// a provider resource).
    pub fn new(
        provider: Expr,
        subjects: Vec<SubjectMatcher>,
        settings: &FederationSettings,
    ) -> Self {
        Self {
            provider,
            subjects,
            subject_claim: settings.subject_claim.clone(),
            action: settings.action.clone(),
        }
    }

    /// The provider principal.
    pub fn provider(&self) -> &Expr {
        &self.provider
    }

    /// The subject matchers, in order.
    pub fn subjects(&self) -> &[SubjectMatcher] {
        &self.subjects
    }

    /// Renders the document in template form.
    pub fn to_value(&self) -> Value {
        let subjects: Vec<&str> = self.subjects.iter().map(SubjectMatcher::as_str).collect();
        json!({
            "Version": POLICY_VERSION,
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "Federated": self.provider.to_value() },
                "Action": self.action,
                "Condition": {
                    "StringLike": { self.subject_claim.clone(): subjects }
                }
            }]
        })
    }
}

// ---------------------------------------------------------------------------
// Permission statements
// ---------------------------------------------------------------------------

/// One `Allow` statement of an inline permission policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyStatement {
    /// Allowed actions.
    pub actions: Vec<String>,
    /// Resources the actions apply to.
    pub resources: Vec<Expr>,
}

impl PolicyStatement {
    /// Renders the statement in template form.
    pub fn to_value(&self) -> Value {
        let resources: Vec<Value> = self.resources.iter().map(Expr::to_value).collect();
        json!({
            "Effect": "Allow",
            "Action": self.actions,
            "Resource": resources,
        })
    }
}

const BUCKET_READ_ACTIONS: [&str; 3] = ["s3:GetObject*", "s3:GetBucket*", "s3:List*"];
const BUCKET_WRITE_ACTIONS: [&str; 3] = ["s3:DeleteObject*", "s3:PutObject*", "s3:Abort*"];

/// Read/write access to a bucket and every object in it.
///
/// `bucket_arn` is the bucket's ARN; objects are addressed as `{arn}/*`.
pub fn bucket_read_write(bucket_arn: Expr) -> PolicyStatement {
    let actions = BUCKET_READ_ACTIONS
        .iter()
        .chain(BUCKET_WRITE_ACTIONS.iter())
        .map(|a| (*a).to_string())
        .collect();
    let objects = Expr::join([bucket_arn.clone(), Expr::literal("/*")]);
    PolicyStatement {
        actions,
        resources: vec![bucket_arn, objects],
    }
}
