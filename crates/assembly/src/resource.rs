//! Resource declarations.
//!
//! Each [`Resource`] variant maps to one template resource type. Resources are
//! inert data: adding one to a [`crate::Stack`] is the only way it becomes
//! part of the graph.

use serde_json::{json, Value};
use trust::{BucketName, RoleName};

use crate::iam::{PolicyStatement, TrustPolicyDocument};
use crate::pipeline::DeploymentPipeline;
use crate::Expr;

/// A storage bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// Physical name; generated by the engine when `None`.
    pub bucket_name: Option<BucketName>,
    /// Keep every version of every object.
    pub versioned: bool,
    /// Publish object events to the default event bus.
    pub event_bridge_enabled: bool,
}

/// An OIDC identity provider trusted by the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcProvider {
    /// Issuer URL.
    pub url: String,
    /// Accepted audiences.
    pub client_ids: Vec<String>,
}

/// A role with an assume-role (trust) document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    /// Physical name; generated by the engine when `None`.
    pub role_name: Option<RoleName>,
    /// Who may assume the role.
    pub assume_role_policy: TrustPolicyDocument,
}

/// An inline permission policy attached to roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Policy name, unique per role.
    pub policy_name: String,
    /// Roles the policy is attached to.
    pub roles: Vec<Expr>,
    /// Permission statements.
    pub statements: Vec<PolicyStatement>,
}

/// An event rule forwarding matching events to targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRule {
    /// Event pattern. May contain references in `bucket_names`.
    pub source: Vec<String>,
    /// Detail types to match.
    pub detail_type: Vec<String>,
    /// Buckets whose object events match.
    pub bucket_names: Vec<Expr>,
    /// Object keys that match.
    pub object_keys: Vec<String>,
    /// ARNs of the targets to start.
    pub targets: Vec<Expr>,
}

/// A serverless function with inline source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    /// `file.export` entry point.
    pub handler: String,
    /// Runtime identifier.
    pub runtime: String,
    /// Inline source code.
    pub code: String,
}

/// A REST API proxying every request to one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaRestApi {
    /// API name.
    pub name: String,
    /// Function invoked for every route.
    pub handler: Expr,
}

/// Every resource kind the registry can hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Bucket(Bucket),
    OidcProvider(OidcProvider),
    Role(Role),
    Policy(Policy),
    EventRule(EventRule),
    Pipeline(DeploymentPipeline),
    Function(Function),
    RestApi(LambdaRestApi),
}

impl Resource {
    /// Template type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Resource::Bucket(_) => "AWS::S3::Bucket",
            Resource::OidcProvider(_) => "AWS::IAM::OIDCProvider",
            Resource::Role(_) => "AWS::IAM::Role",
            Resource::Policy(_) => "AWS::IAM::Policy",
            Resource::EventRule(_) => "AWS::Events::Rule",
            Resource::Pipeline(_) => "AWS::CodePipeline::Pipeline",
            Resource::Function(_) => "AWS::Lambda::Function",
            Resource::RestApi(_) => "AWS::ApiGateway::RestApi",
        }
    }

    /// Every value in this resource that may refer to another resource.
    pub fn references(&self) -> Vec<&Expr> {
        match self {
            Resource::Bucket(_) | Resource::OidcProvider(_) | Resource::Function(_) => Vec::new(),
            Resource::Role(r) => vec![r.assume_role_policy.provider()],
            Resource::Policy(p) => p
                .roles
                .iter()
                .chain(p.statements.iter().flat_map(|s| s.resources.iter()))
                .collect(),
            Resource::EventRule(r) => r.bucket_names.iter().chain(r.targets.iter()).collect(),
            Resource::Pipeline(p) => p.references(),
            Resource::RestApi(a) => vec![&a.handler],
        }
    }

    /// Renders `{"Type": .., "Properties": ..}`.
    pub fn to_value(&self) -> Value {
        json!({ "Type": self.type_name(), "Properties": self.properties() })
    }

    fn properties(&self) -> Value {
        match self {
            Resource::Bucket(b) => {
                let mut props = json!({
                    "VersioningConfiguration": {
                        "Status": if b.versioned { "Enabled" } else { "Suspended" }
                    },
                    "NotificationConfiguration": {
                        "EventBridgeConfiguration": { "EventBridgeEnabled": b.event_bridge_enabled }
                    },
                });
                if let Some(name) = &b.bucket_name {
                    props["BucketName"] = json!(name.as_str());
                }
                props
            }
            Resource::OidcProvider(p) => json!({
                "Url": p.url,
                "ClientIdList": p.client_ids,
            }),
            Resource::Role(r) => {
                let mut props = json!({
                    "AssumeRolePolicyDocument": r.assume_role_policy.to_value(),
                });
                if let Some(name) = &r.role_name {
                    props["RoleName"] = json!(name.as_str());
                }
                props
            }
            Resource::Policy(p) => {
                let roles: Vec<Value> = p.roles.iter().map(Expr::to_value).collect();
                let statements: Vec<Value> =
                    p.statements.iter().map(PolicyStatement::to_value).collect();
                json!({
                    "PolicyName": p.policy_name,
                    "Roles": roles,
                    "PolicyDocument": {
                        "Version": crate::iam::POLICY_VERSION,
                        "Statement": statements,
                    },
                })
            }
            Resource::EventRule(r) => {
                let names: Vec<Value> = r.bucket_names.iter().map(Expr::to_value).collect();
                let targets: Vec<Value> = r
                    .targets
                    .iter()
                    .enumerate()
                    .map(|(i, t)| json!({ "Id": format!("Target{i}"), "Arn": t.to_value() }))
                    .collect();
                json!({
                    "State": "ENABLED",
                    "EventPattern": {
                        "source": r.source,
                        "detail-type": r.detail_type,
                        "detail": {
                            "bucket": { "name": names },
                            "object": { "key": r.object_keys },
                        },
                    },
                    "Targets": targets,
                })
            }
            Resource::Pipeline(p) => p.properties(),
            Resource::Function(f) => json!({
                "Handler": f.handler,
                "Runtime": f.runtime,
                "Code": { "ZipFile": f.code },
            }),
            Resource::RestApi(a) => json!({
                "Name": a.name,
                "Proxy": true,
                "Handler": a.handler.to_value(),
            }),
        }
    }
}
