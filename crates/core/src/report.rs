use crate::context::InvocationContext;
use crate::environment::{search_path, EnvironmentMap, Settings};
use crate::sanitize::{
    sanitize_context, sanitize_env, sanitize_event, sanitize_settings, SettingsView,
};
use crate::scanner::{scan_search_path, DependencyReport};
use crate::{ProbeError, Result};
use probe_protocol::{ErrorBody, ErrorEnvelope, ProbeResponse};
use serde::Serialize;
use serde_json::Value;
use std::error::Error as StdError;
use std::future::Future;
use std::time::Instant;

/// Everything one invocation hands to the assembler.
#[derive(Debug, Clone)]
pub struct ProbeInput {
    pub env: EnvironmentMap,
    pub event: Value,
    pub context: InvocationContext,
    pub settings: Settings,
    /// Module search path scanned instead of the snapshot's `NODE_PATH`.
    pub search_path: Option<String>,
}

/// Sanitized view of the execution environment.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub event: Value,
    pub context: InvocationContext,
    pub env: EnvironmentMap,
    pub settings: SettingsView,
    pub nodepath_sdk: DependencyReport,
}

/// Build the report; the first unrecovered failure is returned as is.
pub async fn build_report(input: &ProbeInput) -> Result<DiagnosticReport> {
    let env = sanitize_env(&input.env);
    let settings = sanitize_settings(&input.settings);
    let event = sanitize_event(&input.event)?;
    let context = sanitize_context(&input.context);
    let modules_path = input
        .search_path
        .as_deref()
        .unwrap_or_else(|| search_path(&input.env));
    let nodepath_sdk = scan_search_path(modules_path).await;

    Ok(DiagnosticReport {
        event,
        context,
        env,
        settings,
        nodepath_sdk,
    })
}

/// Produce the gateway response for one invocation.
///
/// This is the only place failures become visible: structured errors turn
/// into `{name, message, stack}`, panics into their raw message, both with
/// status 500.
pub async fn assemble(input: ProbeInput) -> ProbeResponse {
    respond(async move { build_report(&input).await }).await
}

/// Run `work` on its own task and map its outcome onto a response.
async fn respond<F>(work: F) -> ProbeResponse
where
    F: Future<Output = Result<DiagnosticReport>> + Send + 'static,
{
    let start = Instant::now();
    let task = tokio::spawn(work);

    let failure = match task.await {
        Ok(Ok(report)) => match ProbeResponse::ok(&report) {
            Ok(response) => {
                log::info!(
                    "Probe report assembled in {}ms ({} env vars, {} module dirs)",
                    start.elapsed().as_millis(),
                    report.env.len(),
                    report.nodepath_sdk.len()
                );
                return response;
            }
            Err(err) => ErrorBody::Structured(ErrorEnvelope {
                name: "SerializationError".to_string(),
                message: err.to_string(),
                stack: Some(format!("{err:?}")),
            }),
        },
        Ok(Err(err)) => error_body(&err),
        Err(join_err) if join_err.is_panic() => {
            ErrorBody::Raw(Value::String(panic_message(join_err.into_panic())))
        }
        Err(join_err) => error_body(&ProbeError::TaskError(join_err)),
    };

    log::warn!("Probe failed: {}", failure.message().unwrap_or("<raw value>"));
    ProbeResponse::failure(&failure)
}

/// Envelope for a structured error; `stack` lists the source chain.
pub fn error_body(err: &ProbeError) -> ErrorBody {
    let name = err.kind_name();
    let message = err.to_string();

    let mut stack = format!("{name}: {message}");
    let mut source = err.source();
    while let Some(cause) = source {
        stack.push_str(&format!("\n    caused by: {cause}"));
        source = cause.source();
    }

    ErrorBody::Structured(ErrorEnvelope {
        name: name.to_string(),
        message,
        stack: Some(stack),
    })
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        return (*text).to_string();
    }
    if let Some(text) = payload.downcast_ref::<String>() {
        return text.clone();
    }
    "panic with non-string payload".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn stack_lists_source_chain() {
        let err = ProbeError::ScanError {
            path: "/var/runtime/node_modules/@aws-sdk".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let ErrorBody::Structured(envelope) = error_body(&err) else {
            panic!("expected structured body");
        };
        assert_eq!(envelope.name, "ScanError");
        assert_eq!(
            envelope.message,
            "Failed to list /var/runtime/node_modules/@aws-sdk: gone"
        );
        assert_eq!(
            envelope.stack.as_deref(),
            Some("ScanError: Failed to list /var/runtime/node_modules/@aws-sdk: gone\n    caused by: gone")
        );
    }

    async fn explode() -> Result<DiagnosticReport> {
        panic!("scanner exploded")
    }

    #[tokio::test]
    async fn panic_becomes_raw_failure_body() {
        let response = respond(explode()).await;
        assert_eq!(response.status_code, 500);
        assert_eq!(response.body, r#""scanner exploded""#);
    }

    #[tokio::test]
    async fn structured_error_becomes_envelope() {
        let missing = ProbeError::MissingField("requestContext".to_string());
        let response = respond(async { Err::<DiagnosticReport, _>(missing) }).await;
        assert_eq!(response.status_code, 500);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["name"], "MissingField");
    }

    #[test]
    fn panic_payloads_become_text() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new("owned".to_string())), "owned");
        assert_eq!(panic_message(Box::new(7_u8)), "panic with non-string payload");
    }
}
