use anyhow::Result;
use lambda_runtime::{service_fn, Context, LambdaEvent};
use probe_core::{assemble, snapshot_process_env, InvocationContext, ProbeInput, Settings};
use probe_protocol::ProbeResponse;
use serde_json::Value;

/// Variable the function host sets for its runtime API endpoint.
pub(crate) const RUNTIME_API_VAR: &str = "AWS_LAMBDA_RUNTIME_API";

pub(crate) fn runtime_api_available() -> bool {
    std::env::var_os(RUNTIME_API_VAR).is_some_and(|value| !value.is_empty())
}

/// Serve invocations until the host shuts the runtime down.
pub(crate) async fn run(search_path_override: Option<String>) -> Result<()> {
    log::info!("Starting probe on the Lambda runtime API");
    lambda_runtime::run(service_fn(move |event| {
        handle(event, search_path_override.clone())
    }))
    .await
    .map_err(|err| anyhow::anyhow!("Lambda runtime failed: {err}"))
}

async fn handle(
    event: LambdaEvent<Value>,
    search_path_override: Option<String>,
) -> Result<ProbeResponse, lambda_runtime::Error> {
    let (payload, context) = event.into_parts();
    log::debug!("Invocation {}", context.request_id);

    let env = snapshot_process_env();
    let input = ProbeInput {
        settings: Settings::from_env(&env),
        env,
        event: payload,
        context: invocation_context(&context),
        search_path: search_path_override,
    };
    Ok(assemble(input).await)
}

pub(crate) fn invocation_context(context: &Context) -> InvocationContext {
    InvocationContext {
        function_name: context.env_config.function_name.clone(),
        function_version: context.env_config.version.clone(),
        invoked_function_arn: context.invoked_function_arn.clone(),
        memory_limit_in_mb: context.env_config.memory,
        aws_request_id: context.request_id.clone(),
        log_group_name: context.env_config.log_group.clone(),
        log_stream_name: context.env_config.log_stream.clone(),
        deadline_ms: context.deadline,
    }
}
