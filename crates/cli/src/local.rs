//! Synthetic invocations for running the probe outside a function host.

use axum::http::HeaderMap;
use probe_core::{InvocationContext, Settings};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub(crate) const LOCAL_ACCOUNT_ID: &str = "000000000000";
pub(crate) const LOCAL_API_ID: &str = "private";
pub(crate) const LOCAL_STAGE: &str = "local";
pub(crate) const LOCAL_FUNCTION_NAME: &str = "lambda-probe-local";
const DEFAULT_REGION: &str = "us-east-1";
const LOCAL_MEMORY_MB: i32 = 128;
const LOCAL_TIMEOUT: Duration = Duration::from_secs(30);

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(0);

/// One HTTP request as seen by the local server.
#[derive(Debug, Clone)]
pub(crate) struct LocalRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub query: &'a str,
    pub headers: &'a HeaderMap,
}

pub(crate) fn region(settings: &Settings) -> &str {
    settings.aws_region.as_deref().unwrap_or(DEFAULT_REGION)
}

/// Gateway-shaped (payload v2) event for a local request.
pub(crate) fn local_event(request: &LocalRequest<'_>, region: &str, request_id: &str) -> Value {
    let mut headers = Map::new();
    for (name, value) in request.headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        match headers.get_mut(name.as_str()) {
            Some(Value::String(joined)) => {
                joined.push(',');
                joined.push_str(value);
            }
            _ => {
                headers.insert(name.as_str().to_string(), Value::String(value.to_string()));
            }
        }
    }

    let domain_name = format!("{LOCAL_API_ID}.execute-api.{region}.localhost");
    let route_key = if request.path == "/" {
        "ANY /"
    } else {
        "ANY /{pathname+}"
    };

    json!({
        "version": "2.0",
        "routeKey": route_key,
        "rawPath": request.path,
        "rawQueryString": request.query,
        "headers": headers,
        "requestContext": {
            "accountId": LOCAL_ACCOUNT_ID,
            "apiId": LOCAL_API_ID,
            "domainName": domain_name,
            "domainPrefix": LOCAL_API_ID,
            "requestId": request_id,
            "stage": LOCAL_STAGE,
            "timeEpoch": epoch_millis(),
            "http": {
                "method": request.method,
                "path": request.path,
                "protocol": "HTTP/1.1",
                "sourceIp": "127.0.0.1",
            },
        },
        "isBase64Encoded": false,
    })
}

pub(crate) fn local_context(region: &str, request_id: &str) -> InvocationContext {
    InvocationContext {
        function_name: LOCAL_FUNCTION_NAME.to_string(),
        function_version: "$LATEST".to_string(),
        invoked_function_arn: format!(
            "arn:aws:lambda:{region}:{LOCAL_ACCOUNT_ID}:function:{LOCAL_FUNCTION_NAME}"
        ),
        memory_limit_in_mb: LOCAL_MEMORY_MB,
        aws_request_id: request_id.to_string(),
        log_group_name: format!("/aws/lambda/{LOCAL_FUNCTION_NAME}"),
        log_stream_name: format!("local/[$LATEST]{LOCAL_STAGE}"),
        deadline_ms: epoch_millis() + LOCAL_TIMEOUT.as_millis() as u64,
    }
}

/// Unique within the process: start time plus a sequence number.
pub(crate) fn next_request_id() -> String {
    let seq = REQUEST_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("local-{:x}-{seq:04}", epoch_millis())
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
