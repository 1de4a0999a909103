//! Synthesized output handed to the provisioning engine.
//!
//! A [`Manifest`] lists one artifact per stack (top-level stacks first, then
//! stage stacks as `stage/stack`), each with its environment and template.
//! Optional [`SynthMetadata`] identifies the synthesis run; it never leaks into
//! templates, so template bytes only change when declarations do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::{App, AssemblyError, Stack};

/// Manifest schema version.
pub const MANIFEST_VERSION: &str = "1";

// ---------------------------------------------------------------------------
// Run metadata
// ---------------------------------------------------------------------------

/// Identifies a single synthesis run.
///
/// Generated fresh for every invocation; recorded in the manifest and in log
/// spans so a manifest can be matched to the run that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SynthRunId(Uuid);

impl SynthRunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a [`SynthRunId`] from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for SynthRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A UTC wall-clock timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Who/when of a synthesis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthMetadata {
    /// Run identifier.
    pub run_id: SynthRunId,
    /// When synthesis started.
    pub synthesized_at: Timestamp,
}

impl SynthMetadata {
    /// Metadata for a run starting now.
    pub fn now() -> Self {
        Self {
            run_id: SynthRunId::new_random(),
            synthesized_at: Timestamp::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// One deployable stack template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    /// `stack` for top-level stacks, `stage/stack` for stage stacks.
    pub id: String,
    /// `aws://account/region`.
    pub environment: String,
    /// Rendered template.
    pub template: Value,
}

impl Artifact {
    fn from_stack(prefix: Option<&str>, stack: &Stack) -> Self {
        let id = match prefix {
            Some(p) => format!("{p}/{}", stack.id()),
            None => stack.id().to_string(),
        };
        Self {
            id,
            environment: stack.env().to_string(),
            template: stack.to_template(),
        }
    }
}

/// The full synthesis result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    /// Schema version, [`MANIFEST_VERSION`].
    pub version: String,
    /// Run metadata; omitted for reproducible output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SynthMetadata>,
    /// Artifacts in registration order.
    pub artifacts: Vec<Artifact>,
}

impl Manifest {
    /// Looks up an artifact by id.
    pub fn artifact(&self, id: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.id == id)
    }
}

/// Validates `app` and renders every stack.
///
/// # Errors
///
/// Any [`AssemblyError`] from [`App::validate`]; nothing is rendered then.
pub fn synth(app: &App, metadata: Option<SynthMetadata>) -> Result<Manifest, AssemblyError> {
    app.validate()?;

    let top_level = app.stacks().iter().map(|s| Artifact::from_stack(None, s));
    let staged = app.stages().iter().flat_map(|stage| {
        stage
            .stacks()
            .iter()
            .map(move |s| Artifact::from_stack(Some(stage.id().as_str()), s))
    });
    let artifacts: Vec<Artifact> = top_level.chain(staged).collect();

    info!(artifacts = artifacts.len(), "Synthesized manifest");
    Ok(Manifest {
        version: MANIFEST_VERSION.to_string(),
        metadata,
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iam::FederationSettings;
    use crate::pipeline::{
        BucketSource, BuildEnvironment, DeploymentPipeline, PipelineType, SourceTrigger,
        StageDeployment,
    };
    use crate::stacks::{declare_pipeline_stack, PipelineStackProps, StageTarget};
    use crate::{Environment, Expr, Resource};
    use trust::{
        AccountId, BucketName, ConstructId, Region, RepositoryTrust, RoleName, TrustPolicyInput,
    };

    fn env() -> Environment {
        Environment::new(
            AccountId::new("123456789012").unwrap(),
            Region::new("eu-west-1").unwrap(),
        )
    }

    fn app() -> App {
        let mut app = App::new();
        let props = PipelineStackProps {
            env: env(),
            artifact_bucket_name: BucketName::new("123456789012-artifact-bucket").unwrap(),
            github_actions_role_name: RoleName::new("github-actions-role").unwrap(),
            trusted_repositories: TrustPolicyInput::new(vec![RepositoryTrust::new(
                "octo",
                "infra",
                ["main"],
            )]),
            oidc_provider_arn: None,
            federation: FederationSettings::default(),
            stages: vec![StageTarget {
                id: ConstructId::new("dev").unwrap(),
                env: env(),
            }],
        };
        declare_pipeline_stack(&mut app, "pipeline", &props).unwrap();
        app
    }

    #[test]
    fn test_synth_lists_top_level_then_stage_stacks() {
        let manifest = synth(&app(), None).unwrap();

        let ids: Vec<&str> = manifest.artifacts.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["pipeline", "dev/my-api"]);
        assert_eq!(
            manifest.artifact("dev/my-api").unwrap().environment,
            "aws://123456789012/eu-west-1"
        );
    }

    #[test]
    fn test_synth_without_metadata_is_reproducible() {
        let first = serde_json::to_string(&synth(&app(), None).unwrap()).unwrap();
        let second = serde_json::to_string(&synth(&app(), None).unwrap()).unwrap();

        assert_eq!(first, second);
        assert!(!first.contains("metadata"));
    }

    #[test]
    fn test_metadata_does_not_touch_templates() {
        let plain = synth(&app(), None).unwrap();
        let tagged = synth(&app(), Some(SynthMetadata::now())).unwrap();

        assert!(tagged.metadata.is_some());
        assert_eq!(plain.artifacts, tagged.artifacts);
    }

    #[test]
    fn test_pipeline_deploying_unknown_stage_is_rejected() {
        let mut stack = Stack::new(ConstructId::new("pipeline").unwrap(), env());
        stack
            .add(
                "CodePipeline",
                Resource::Pipeline(DeploymentPipeline {
                    pipeline_type: PipelineType::V2,
                    cross_account_keys: false,
                    restart_execution_on_update: true,
                    use_change_sets: false,
                    build_environment: BuildEnvironment::lambda_node20(),
                    source: BucketSource {
                        bucket: Expr::literal("bucket"),
                        object_key: "cloud-assembly.zip".into(),
                        trigger: SourceTrigger::None,
                    },
                    stages: vec![StageDeployment {
                        stage: ConstructId::new("prod").unwrap(),
                        post: Vec::new(),
                    }],
                }),
            )
            .unwrap();
        let mut app = App::new();
        app.add_stack(stack).unwrap();

        assert_eq!(
            synth(&app, None),
            Err(AssemblyError::UnknownStage {
                pipeline: "CodePipeline".into(),
                stage: "prod".into(),
            })
        );
    }
}
