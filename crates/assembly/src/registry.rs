//! Explicit construct registry.
//!
//! Resources are added to a [`Stack`] with [`Stack::add`], stacks to a
//! [`Stage`] or [`App`] with `add_stack`, and stages to the [`App`] with
//! [`App::add_stage`]. Nothing registers itself as a side effect of being
//! constructed, so the whole graph can be inspected and tested as data.

use serde_json::{json, Map, Value};
use tracing::debug;
use trust::{AccountId, ConstructId, LogicalId, Region};

use crate::{AssemblyError, Expr, Resource, ResourceRef};

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// The account and region a stack deploys into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Target account.
    pub account: AccountId,
    /// Target region.
    pub region: Region,
}

impl Environment {
    /// Creates a new [`Environment`].
    pub fn new(account: AccountId, region: Region) -> Self {
        Self { account, region }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "aws://{}/{}", self.account, self.region)
    }
}

// ---------------------------------------------------------------------------
// Stack
// ---------------------------------------------------------------------------

/// A unit of deployment: resources and outputs keyed by logical id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    id: ConstructId,
    env: Environment,
    resources: Vec<(LogicalId, Resource)>,
    outputs: Vec<(String, Expr)>,
}

impl Stack {
    /// Creates an empty stack.
    pub fn new(id: ConstructId, env: Environment) -> Self {
        Self {
            id,
            env,
            resources: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Stack id.
    pub fn id(&self) -> &ConstructId {
        &self.id
    }

    /// Deployment environment.
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Registers `resource` under `logical_id` and returns a reference to it.
    ///
    /// # Errors
    ///
    /// - [`AssemblyError::InvalidLogicalId`] unless the id is non-empty ASCII
    ///   alphanumeric.
    /// - [`AssemblyError::DuplicateLogicalId`] if the id is already taken.
    pub fn add(&mut self, logical_id: &str, resource: Resource) -> Result<ResourceRef, AssemblyError> {
        let id = parse_logical_id(logical_id)?;
        if self.resource(&id).is_some() {
            return Err(AssemblyError::DuplicateLogicalId {
                stack: self.id.to_string(),
                logical_id: id.to_string(),
            });
        }
        debug!(stack = %self.id, logical_id = %id, kind = resource.type_name(), "Registered resource");
        self.resources.push((id.clone(), resource));
        Ok(ResourceRef::new(id))
    }

    /// Registers a named output.
    pub fn add_output(&mut self, name: &str, value: Expr) -> Result<(), AssemblyError> {
        let name = parse_logical_id(name)?;
        if self.output(name.as_str()).is_some() {
            return Err(AssemblyError::DuplicateOutput {
                stack: self.id.to_string(),
                output: name.to_string(),
            });
        }
        self.outputs.push((name.into(), value));
        Ok(())
    }

    /// Looks up a resource by logical id.
    pub fn resource(&self, id: &LogicalId) -> Option<&Resource> {
        self.resources.iter().find(|(k, _)| k == id).map(|(_, r)| r)
    }

    /// Looks up an output by name.
    pub fn output(&self, name: &str) -> Option<&Expr> {
        self.outputs.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Resources in registration order.
    pub fn resources(&self) -> impl Iterator<Item = (&LogicalId, &Resource)> {
        self.resources.iter().map(|(k, r)| (k, r))
    }

    /// Checks that every reference held by a resource or output points at a
    /// resource in this stack.
    pub fn validate(&self) -> Result<(), AssemblyError> {
        let resource_refs = self
            .resources
            .iter()
            .flat_map(|(from, r)| r.references().into_iter().map(move |e| (from.as_str(), e)));
        let output_refs = self.outputs.iter().map(|(from, e)| (from.as_str(), e));

        for (from, expr) in resource_refs.chain(output_refs) {
            if let Some(missing) = expr.references().into_iter().find(|id| self.resource(id).is_none()) {
                return Err(AssemblyError::DanglingReference {
                    stack: self.id.to_string(),
                    from: from.to_string(),
                    to: missing.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Renders the stack template. Keys are sorted, so identical stacks
    /// render identically.
    pub fn to_template(&self) -> Value {
        let resources: Map<String, Value> = self
            .resources
            .iter()
            .map(|(id, r)| (id.to_string(), r.to_value()))
            .collect();
        let outputs: Map<String, Value> = self
            .outputs
            .iter()
            .map(|(name, v)| (name.clone(), json!({ "Value": v.to_value() })))
            .collect();
        json!({ "Resources": resources, "Outputs": outputs })
    }
}

fn parse_logical_id(raw: &str) -> Result<LogicalId, AssemblyError> {
    if !raw.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(AssemblyError::InvalidLogicalId {
            logical_id: raw.to_string(),
        });
    }
    LogicalId::new(raw).ok_or_else(|| AssemblyError::InvalidLogicalId {
        logical_id: raw.to_string(),
    })
}

/// Parses a construct id, rejecting empty values.
pub fn construct_id(raw: &str) -> Result<ConstructId, AssemblyError> {
    ConstructId::new(raw).ok_or(AssemblyError::EmptyConstructId)
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// A group of stacks that together form one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    id: ConstructId,
    stacks: Vec<Stack>,
}

impl Stage {
    /// Creates an empty stage.
    pub fn new(id: ConstructId) -> Self {
        Self {
            id,
            stacks: Vec::new(),
        }
    }

    /// Stage id.
    pub fn id(&self) -> &ConstructId {
        &self.id
    }

    /// Adds a stack, rejecting duplicate ids.
    pub fn add_stack(&mut self, stack: Stack) -> Result<(), AssemblyError> {
        insert_unique(&mut self.stacks, stack, Stack::id)
    }

    /// Looks up a stack by id.
    pub fn stack(&self, id: &ConstructId) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.id() == id)
    }

    /// Stacks in registration order.
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// The root scope: top-level stacks plus the stages pipelines deploy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct App {
    stacks: Vec<Stack>,
    stages: Vec<Stage>,
}

impl App {
    /// Creates an empty app.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a top-level stack, rejecting duplicate ids.
    pub fn add_stack(&mut self, stack: Stack) -> Result<(), AssemblyError> {
        insert_unique(&mut self.stacks, stack, Stack::id)
    }

    /// Adds a stage, rejecting duplicate ids.
    pub fn add_stage(&mut self, stage: Stage) -> Result<(), AssemblyError> {
        insert_unique(&mut self.stages, stage, Stage::id)
    }

    /// Top-level stacks in registration order.
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    /// Stages in registration order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Looks up a top-level stack by id.
    pub fn stack(&self, id: &ConstructId) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.id() == id)
    }

    /// Looks up a stage by id.
    pub fn stage(&self, id: &ConstructId) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id() == id)
    }

    /// Validates every stack and every pipeline's stage wiring.
    pub fn validate(&self) -> Result<(), AssemblyError> {
        let all_stacks = self
            .stacks
            .iter()
            .chain(self.stages.iter().flat_map(|s| s.stacks.iter()));
        for stack in all_stacks {
            stack.validate()?;
        }

        for stack in &self.stacks {
            for (id, resource) in stack.resources() {
                if let Resource::Pipeline(p) = resource {
                    self.validate_pipeline_stages(id, p)?;
                }
            }
        }
        Ok(())
    }

    fn validate_pipeline_stages(
        &self,
        pipeline: &LogicalId,
        p: &crate::pipeline::DeploymentPipeline,
    ) -> Result<(), AssemblyError> {
        for deployment in &p.stages {
            let stage = self
                .stage(&deployment.stage)
                .ok_or_else(|| AssemblyError::UnknownStage {
                    pipeline: pipeline.to_string(),
                    stage: deployment.stage.to_string(),
                })?;
            for step in &deployment.post {
                for out in step.env_from_outputs.values() {
                    let found = stage
                        .stack(&out.stack)
                        .and_then(|s| s.output(&out.output))
                        .is_some();
                    if !found {
                        return Err(AssemblyError::UnknownOutput {
                            step: step.name.clone(),
                            stage: stage.id().to_string(),
                            stack: out.stack.to_string(),
                            output: out.output.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

fn insert_unique<T>(
    items: &mut Vec<T>,
    item: T,
    id: impl Fn(&T) -> &ConstructId,
) -> Result<(), AssemblyError> {
    if items.iter().any(|existing| id(existing) == id(&item)) {
        return Err(AssemblyError::DuplicateConstruct {
            id: id(&item).to_string(),
        });
    }
    items.push(item);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{
        BucketSource, BuildEnvironment, DeploymentPipeline, OutputRef, PipelineType, ShellStep,
        SourceTrigger, StageDeployment,
    };
    use crate::resource::{Bucket, LambdaRestApi};
    use crate::stacks::api_stage::{declare_api_stage, API_STACK_ID};
    use std::collections::BTreeMap;

    fn env() -> Environment {
        Environment::new(
            AccountId::new("123456789012").unwrap(),
            Region::new("eu-west-1").unwrap(),
        )
    }

    fn stack(id: &str) -> Stack {
        Stack::new(ConstructId::new(id).unwrap(), env())
    }

    fn bucket() -> Resource {
        Resource::Bucket(Bucket {
            bucket_name: None,
            versioned: false,
            event_bridge_enabled: false,
        })
    }

    #[test]
    fn test_add_returns_reference() {
        let mut s = stack("s");

        let r = s.add("Bucket", bucket()).unwrap();

        assert_eq!(r.to_expr().to_value(), json!({ "Ref": "Bucket" }));
    }

    #[test]
    fn test_duplicate_logical_id_is_rejected() {
        let mut s = stack("s");
        s.add("Bucket", bucket()).unwrap();

        let err = s.add("Bucket", bucket()).unwrap_err();

        assert!(matches!(err, AssemblyError::DuplicateLogicalId { .. }));
    }

    #[test]
    fn test_non_alphanumeric_logical_id_is_rejected() {
        let mut s = stack("s");

        assert!(matches!(
            s.add("my-bucket", bucket()),
            Err(AssemblyError::InvalidLogicalId { .. })
        ));
        assert!(matches!(
            s.add("", bucket()),
            Err(AssemblyError::InvalidLogicalId { .. })
        ));
    }

    #[test]
    fn test_dangling_reference_is_reported() {
        let mut s = stack("s");
        s.add(
            "Api",
            Resource::RestApi(LambdaRestApi {
                name: "api".into(),
                handler: Expr::Ref(LogicalId::new("Missing").unwrap()),
            }),
        )
        .unwrap();

        assert_eq!(
            s.validate(),
            Err(AssemblyError::DanglingReference {
                stack: "s".into(),
                from: "Api".into(),
                to: "Missing".into(),
            })
        );
    }

    #[test]
    fn test_output_reference_is_validated() {
        let mut s = stack("s");
        s.add_output("Url", Expr::Ref(LogicalId::new("Nope").unwrap()))
            .unwrap();

        assert!(matches!(
            s.validate(),
            Err(AssemblyError::DanglingReference { .. })
        ));
    }

    #[test]
    fn test_duplicate_output_is_rejected() {
        let mut s = stack("s");
        s.add_output("Url", Expr::literal("a")).unwrap();

        assert!(matches!(
            s.add_output("Url", Expr::literal("b")),
            Err(AssemblyError::DuplicateOutput { .. })
        ));
    }

    #[test]
    fn test_duplicate_stack_in_app_is_rejected() {
        let mut app = App::new();
        app.add_stack(stack("pipeline")).unwrap();

        assert_eq!(
            app.add_stack(stack("pipeline")),
            Err(AssemblyError::DuplicateConstruct {
                id: "pipeline".into()
            })
        );
    }

    #[test]
    fn test_template_lists_resources_and_outputs() {
        let mut s = stack("s");
        let b = s.add("Bucket", bucket()).unwrap();
        s.add_output("BucketName", b.to_expr()).unwrap();

        let t = s.to_template();

        assert_eq!(t["Resources"]["Bucket"]["Type"], "AWS::S3::Bucket");
        assert_eq!(t["Outputs"]["BucketName"]["Value"], json!({ "Ref": "Bucket" }));
    }

    #[test]
    fn test_smoke_step_reading_undeclared_output_is_rejected() {
        let mut env_from_outputs = BTreeMap::new();
        env_from_outputs.insert(
            "API_URL".to_string(),
            OutputRef {
                stack: ConstructId::new(API_STACK_ID).unwrap(),
                output: "Missing".to_string(),
            },
        );
        let mut pipeline = stack("pipeline");
        pipeline
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
                        stage: ConstructId::new("dev").unwrap(),
                        post: vec![ShellStep {
                            name: "SmokeTest".into(),
                            env_from_outputs,
                            commands: vec!["true".into()],
                        }],
                    }],
                }),
            )
            .unwrap();
        let mut app = App::new();
        app.add_stack(pipeline).unwrap();
        app.add_stage(declare_api_stage(ConstructId::new("dev").unwrap(), &env()).unwrap())
            .unwrap();

        assert_eq!(
            app.validate(),
            Err(AssemblyError::UnknownOutput {
                step: "SmokeTest".into(),
                stage: "dev".into(),
                stack: "my-api".into(),
                output: "Missing".into(),
            })
        );
    }

    #[test]
    fn test_environment_display() {
        assert_eq!(env().to_string(), "aws://123456789012/eu-west-1");
    }
}
