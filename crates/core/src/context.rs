use serde::{Deserialize, Serialize};

/// Invocation metadata supplied by the function host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationContext {
    pub function_name: String,
    pub function_version: String,
    /// `arn:<partition>:lambda:<region>:<account>:function:<name>[:<qualifier>]`
    pub invoked_function_arn: String,
    #[serde(rename = "memoryLimitInMB")]
    pub memory_limit_in_mb: i32,
    pub aws_request_id: String,
    pub log_group_name: String,
    pub log_stream_name: String,
    pub deadline_ms: u64,
}

/// Account identifier embedded in a function ARN (its fifth `:`-separated
/// field), or `""` when the ARN is too short.
pub fn extract_account_id_from_function_arn(arn: &str) -> &str {
    arn.split(':').nth(4).unwrap_or_default()
}
