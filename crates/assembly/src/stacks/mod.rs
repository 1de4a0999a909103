//! Stack and construct declarations for the deployment setup.

pub mod api_stage;
pub mod github_actions_role;
pub mod pipeline_stack;

pub use api_stage::{declare_api_stage, API_STACK_ID, API_URL_OUTPUT};
pub use github_actions_role::{GithubActionsRole, GithubActionsRoleProps};
pub use pipeline_stack::{declare_pipeline_stack, PipelineStackProps, StageTarget, CLOUD_ASSEMBLY_KEY};
