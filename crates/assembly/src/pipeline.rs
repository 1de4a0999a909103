//! Deployment pipeline declaration.
//!
//! Describes a self-mutating pipeline that picks a pre-built cloud assembly
//! out of a bucket and deploys stages in order, optionally running shell steps
//! after each stage. Only the declaration lives here; building and executing
//! the pipeline is the provisioning engine's job.

use std::collections::BTreeMap;

use serde_json::{json, Value};
use trust::ConstructId;

use crate::Expr;

/// Execution model of the pipeline service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineType {
    /// First-generation pipelines.
    V1,
    /// Second-generation pipelines (triggers, variables, per-execution billing).
    V2,
}

impl PipelineType {
    fn as_str(self) -> &'static str {
        match self {
            PipelineType::V1 => "V1",
            PipelineType::V2 => "V2",
        }
    }
}

/// How a source action notices new input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceTrigger {
    /// The pipeline is started by something else (e.g. an event rule).
    None,
    /// The pipeline polls the bucket.
    Poll,
    /// The pipeline subscribes to bucket events itself.
    Events,
}

impl SourceTrigger {
    fn as_str(self) -> &'static str {
        match self {
            SourceTrigger::None => "NONE",
            SourceTrigger::Poll => "POLL",
            SourceTrigger::Events => "EVENTS",
        }
    }
}

/// Image and size used for every build job in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnvironment {
    /// Build image identifier.
    pub image: String,
    /// Compute size identifier.
    pub compute_type: String,
}

impl BuildEnvironment {
    /// Lambda-backed Node 20 image with 4 GB; starts faster than a container.
    pub fn lambda_node20() -> Self {
        Self {
            image: "aws/codebuild/amazonlinux-x86_64-lambda-standard:nodejs20".to_string(),
            compute_type: "BUILD_LAMBDA_4GB".to_string(),
        }
    }
}

/// The object the synth step reads its cloud assembly from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSource {
    /// The bucket (usually a reference to it).
    pub bucket: Expr,
    /// Object key of the zipped cloud assembly.
    pub object_key: String,
    /// How new uploads start the pipeline.
    pub trigger: SourceTrigger,
}

/// Names one output of one stack inside a stage.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct OutputRef {
    /// Stack id within the stage.
    pub stack: ConstructId,
    /// Output name within the stack.
    pub output: String,
}

/// A shell command step, with environment variables filled from stack outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellStep {
    /// Step name, unique within its stage.
    pub name: String,
    /// Environment variable name → stack output.
    pub env_from_outputs: BTreeMap<String, OutputRef>,
    /// Commands run in order; the step fails on the first failing command.
    pub commands: Vec<String>,
}

impl ShellStep {
    fn to_value(&self) -> Value {
        let env: serde_json::Map<String, Value> = self
            .env_from_outputs
            .iter()
            .map(|(var, out)| {
                (
                    var.clone(),
                    json!({ "Stack": out.stack.as_str(), "Output": out.output }),
                )
            })
            .collect();
        json!({
            "Name": self.name,
            "EnvFromOutputs": env,
            "Commands": self.commands,
        })
    }
}

/// One stage deployed by the pipeline, with steps run after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageDeployment {
    /// Id of a stage registered in the same app.
    pub stage: ConstructId,
    /// Steps run once every stack of the stage is deployed.
    pub post: Vec<ShellStep>,
}

/// Declaration of the deployment pipeline resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPipeline {
    /// Execution model.
    pub pipeline_type: PipelineType,
    /// Encrypt artifacts with customer keys usable from other accounts.
    pub cross_account_keys: bool,
    /// Restart the running execution when the pipeline updates itself.
    pub restart_execution_on_update: bool,
    /// Deploy through change sets instead of direct updates.
    pub use_change_sets: bool,
    /// Environment used for every build job.
    pub build_environment: BuildEnvironment,
    /// Where the synthesized cloud assembly comes from.
    pub source: BucketSource,
    /// Stages in deployment order.
    pub stages: Vec<StageDeployment>,
}

impl DeploymentPipeline {
    /// Every resource reference held by the pipeline.
    pub(crate) fn references(&self) -> Vec<&Expr> {
        vec![&self.source.bucket]
    }

    pub(crate) fn properties(&self) -> Value {
        let stages: Vec<Value> = self
            .stages
            .iter()
            .map(|s| {
                let post: Vec<Value> = s.post.iter().map(ShellStep::to_value).collect();
                json!({ "Stage": s.stage.as_str(), "Post": post })
            })
            .collect();
        json!({
            "PipelineType": self.pipeline_type.as_str(),
            "CrossAccountKeys": self.cross_account_keys,
            "RestartExecutionOnUpdate": self.restart_execution_on_update,
            "UseChangeSets": self.use_change_sets,
            "BuildEnvironment": {
                "Image": self.build_environment.image,
                "ComputeType": self.build_environment.compute_type,
            },
            "Source": {
                "Bucket": self.source.bucket.to_value(),
                "ObjectKey": self.source.object_key,
                "Trigger": self.source.trigger.as_str(),
            },
            "Stages": stages,
        })
    }
}
