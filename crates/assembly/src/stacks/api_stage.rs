//! The application environment: a stage holding the API stack.
//!
//! Further stacks for the same environment (networking, data, ...) are added
//! to the stage next to the API stack.

use trust::ConstructId;

use crate::registry::construct_id;
use crate::resource::{Function, LambdaRestApi};
use crate::{AssemblyError, Environment, Expr, Resource, Stack, Stage};

/// Id of the API stack inside each stage.
pub const API_STACK_ID: &str = "my-api";

/// Output carrying the API's invoke URL.
pub const API_URL_OUTPUT: &str = "ApiUrl";

const HANDLER_SOURCE: &str = r#"
exports.handler = async () => {
  return {
    statusCode: 200,
    headers: {
      "Content-Type": "text/html; charset=utf-8"
    },
    body: "<h1>Hello World</h1>"
  }
}
"#;

/// Declares a stage named `id` deploying the API stack into `env`.
pub fn declare_api_stage(id: ConstructId, env: &Environment) -> Result<Stage, AssemblyError> {
    let mut stage = Stage::new(id);
    stage.add_stack(declare_api_stack(env)?)?;
    Ok(stage)
}

fn declare_api_stack(env: &Environment) -> Result<Stack, AssemblyError> {
    let mut stack = Stack::new(construct_id(API_STACK_ID)?, env.clone());

    let function = stack.add(
        "LambdaFunction",
        Resource::Function(Function {
            handler: "index.handler".to_string(),
            runtime: "nodejs22.x".to_string(),
            code: HANDLER_SOURCE.to_string(),
        }),
    )?
    .to_expr();
    let api = stack.add(
        "Api",
        Resource::RestApi(LambdaRestApi {
            name: "Api".to_string(),
            handler: function,
        }),
    )?
    .to_expr();

    let url = Expr::join([
        Expr::literal("https://"),
        api,
        Expr::literal(".execute-api."),
        Expr::literal(env.region.as_str()),
        Expr::literal(".amazonaws.com/prod/"),
    ]);
    stack.add_output(API_URL_OUTPUT, url)?;

    Ok(stack)
}
