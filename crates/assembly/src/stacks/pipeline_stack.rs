//! The pipeline stack: artifact bucket, CI role, deployment pipeline, and the
//! event rule that starts the pipeline when CI uploads a new cloud assembly.
//!
//! CI synthesizes the app, zips the cloud assembly, and uploads it to the
//! artifact bucket using the CI role. The upload event starts the pipeline,
//! which deploys each stage and runs a smoke test against its API.

use std::collections::BTreeMap;

use tracing::info_span;
use trust::{BucketName, ConstructId, RoleName, TrustPolicyInput};

use crate::iam::{bucket_read_write, FederationSettings};
use crate::pipeline::{
    BucketSource, BuildEnvironment, DeploymentPipeline, OutputRef, PipelineType, ShellStep,
    SourceTrigger, StageDeployment,
};
use crate::registry::construct_id;
use crate::resource::{Bucket, EventRule, Policy};
use crate::stacks::api_stage::{declare_api_stage, API_STACK_ID, API_URL_OUTPUT};
use crate::stacks::github_actions_role::{GithubActionsRole, GithubActionsRoleProps};
use crate::{App, AssemblyError, Environment, Expr, Resource, Stack};

/// Object key CI uploads the zipped cloud assembly to.
pub const CLOUD_ASSEMBLY_KEY: &str = "cloud-assembly.zip";

/// One environment the pipeline deploys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTarget {
    /// Stage id (e.g. `"dev"`).
    pub id: ConstructId,
    /// Where the stage's stacks deploy.
    pub env: Environment,
}

/// Inputs for [`declare_pipeline_stack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStackProps {
    /// Where the pipeline stack itself deploys.
    pub env: Environment,
    /// Physical name of the artifact bucket.
    pub artifact_bucket_name: BucketName,
    /// Physical name of the CI role.
    pub github_actions_role_name: RoleName,
    /// Repositories and branches allowed to assume the CI role.
    pub trusted_repositories: TrustPolicyInput,
    /// Existing OIDC provider to trust instead of declaring one.
    pub oidc_provider_arn: Option<String>,
    /// Federation constants.
    pub federation: FederationSettings,
    /// Stages in deployment order.
    pub stages: Vec<StageTarget>,
}

/// Declares the pipeline stack `id` and every stage it deploys into `app`.
///
/// # Errors
///
/// [`AssemblyError::Trust`] if the trusted repositories are invalid, or any
/// registry error. `app` is only modified once every declaration succeeded.
pub fn declare_pipeline_stack(
    app: &mut App,
    id: &str,
    props: &PipelineStackProps,
) -> Result<(), AssemblyError> {
    let _span = info_span!("pipeline_stack", stack = id).entered();
    let mut stack = Stack::new(construct_id(id)?, props.env.clone());

    let bucket = stack.add(
        "ArtifactBucket",
        Resource::Bucket(Bucket {
            bucket_name: Some(props.artifact_bucket_name.clone()),
            versioned: true,
            event_bridge_enabled: true,
        }),
    )?;

    let ci_role = GithubActionsRole::declare(
        &mut stack,
        "GithubActionsRole",
        &GithubActionsRoleProps {
            role_name: Some(props.github_actions_role_name.clone()),
            oidc_provider_arn: props.oidc_provider_arn.clone(),
            repositories: props.trusted_repositories.clone(),
            federation: props.federation.clone(),
        },
    )?;
    stack.add(
        "GithubActionsRoleDefaultPolicy",
        Resource::Policy(Policy {
            policy_name: "GithubActionsRoleDefaultPolicy".to_string(),
            roles: vec![ci_role.role],
            statements: vec![bucket_read_write(bucket.attr("Arn"))],
        }),
    )?;

    let stages = props
        .stages
        .iter()
        .map(|t| declare_api_stage(t.id.clone(), &t.env))
        .collect::<Result<Vec<_>, _>>()?;

    let deployments = stages
        .iter()
        .map(|stage| {
            Ok(StageDeployment {
                stage: stage.id().clone(),
                post: vec![smoke_test()?],
            })
        })
        .collect::<Result<Vec<_>, AssemblyError>>()?;

    let pipeline = stack.add(
        "CodePipeline",
        Resource::Pipeline(DeploymentPipeline {
            pipeline_type: PipelineType::V2,
            cross_account_keys: false,
            restart_execution_on_update: true,
            use_change_sets: false,
            build_environment: BuildEnvironment::lambda_node20(),
            source: BucketSource {
                bucket: bucket.to_expr(),
                object_key: CLOUD_ASSEMBLY_KEY.to_string(),
                trigger: SourceTrigger::None,
            },
            stages: deployments,
        }),
    )?;

    let pipeline_arn = Expr::join([
        Expr::literal("arn:aws:codepipeline:"),
        Expr::literal(props.env.region.as_str()),
        Expr::literal(":"),
        Expr::literal(props.env.account.as_str()),
        Expr::literal(":"),
        pipeline.to_expr(),
    ]);
    stack.add(
        "PipelineTrigger",
        Resource::EventRule(EventRule {
            source: vec!["aws.s3".to_string()],
            detail_type: vec!["Object Created".to_string()],
            bucket_names: vec![bucket.to_expr()],
            object_keys: vec![CLOUD_ASSEMBLY_KEY.to_string()],
            targets: vec![pipeline_arn],
        }),
    )?;

    let mut staged = App::clone(app);
    staged.add_stack(stack)?;
    for stage in stages {
        staged.add_stage(stage)?;
    }
    *app = staged;
    Ok(())
}

/// Fetches the stage's API and checks the greeting is served.
fn smoke_test() -> Result<ShellStep, AssemblyError> {
    let mut env_from_outputs = BTreeMap::new();
    env_from_outputs.insert(
        "API_URL".to_string(),
        OutputRef {
            stack: construct_id(API_STACK_ID)?,
            output: API_URL_OUTPUT.to_string(),
        },
    );
    Ok(ShellStep {
        name: "SmokeTest".to_string(),
        env_from_outputs,
        commands: vec![
            "set -eu".to_string(),
            r#"result="$(curl --silent --fail "$API_URL")""#.to_string(),
            r#"echo "$result" | grep "World""#.to_string(),
        ],
    })
}
