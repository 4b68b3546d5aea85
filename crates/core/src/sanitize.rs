//! Redaction and placeholder substitution applied before anything is echoed.
//!
//! Sanitization is cosmetic: it keeps screenshots and bug reports free of
//! credentials and account identifiers, nothing more.

use crate::context::{extract_account_id_from_function_arn, InvocationContext};
use crate::environment::{EnvironmentMap, Settings};
use crate::{ProbeError, Result};
use serde::Serialize;
use serde_json::{Map, Value};

/// Replacement value for secret environment entries.
pub const MASK: &str = "********";
pub const PLACEHOLDER_ACCOUNT_ID: &str = "123456789012";
pub const PLACEHOLDER_API_ID: &str = "abcdefghij";

const ALLOWED_PREFIXES: &[&str] = &["AWS_", "LAMBDA_"];

/// Reserved runtime variables without an `AWS_`/`LAMBDA_` prefix.
const RESERVED_KEYS: &[&str] = &["_HANDLER", "_X_AMZN_TRACE_ID"];

/// Unreserved runtime variables without an `AWS_`/`LAMBDA_` prefix.
const UNRESERVED_KEYS: &[&str] = &[
    "LANG",
    "PATH",
    "LD_LIBRARY_PATH",
    "NODE_PATH",
    "PYTHONPATH",
    "GEM_PATH",
    "TZ",
];

const SECRET_KEYS: &[&str] = &[
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
];

const REQUEST_CONTEXT_FIELD: &str = "requestContext";
const SANITIZED_REQUEST_FIELDS: &[&str] = &["accountId", "apiId", "domainName", "domainPrefix"];

pub fn is_secret_key(key: &str) -> bool {
    SECRET_KEYS.contains(&key)
}

pub fn is_allowed_key(key: &str) -> bool {
    ALLOWED_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
        || RESERVED_KEYS.contains(&key)
        || UNRESERVED_KEYS.contains(&key)
}

/// Mask secrets, then keep only documented runtime variables.
///
/// Masked secrets are `AWS_`-prefixed, so they stay in the output with
/// [`MASK`] as their value.
pub fn sanitize_env(env: &EnvironmentMap) -> EnvironmentMap {
    env.iter()
        .map(|(key, value)| {
            let value: &str = if is_secret_key(key) { MASK } else { value };
            (key, value)
        })
        .filter(|(key, _)| is_allowed_key(key))
        .map(|(key, value)| (key.clone(), value.to_string()))
        .collect()
}

/// Replace the first occurrence of `needle`; an empty needle leaves `text` alone.
fn replace_first(text: &str, needle: &str, replacement: &str) -> String {
    if needle.is_empty() {
        return text.to_string();
    }
    text.replacen(needle, replacement, 1)
}

fn string_field<'a>(object: &'a Map<String, Value>, field: &str) -> Result<&'a str> {
    match object.get(field) {
        Some(Value::String(text)) => Ok(text),
        Some(_) => Err(ProbeError::InvalidField(format!(
            "{REQUEST_CONTEXT_FIELD}.{field}"
        ))),
        None => Err(ProbeError::MissingField(format!(
            "{REQUEST_CONTEXT_FIELD}.{field}"
        ))),
    }
}

/// Copy of `event` with the account and API identifiers in
/// `requestContext.{accountId, apiId, domainName, domainPrefix}` replaced by
/// placeholders. Only the first occurrence in each field is replaced.
pub fn sanitize_event(event: &Value) -> Result<Value> {
    let request_context = event
        .get(REQUEST_CONTEXT_FIELD)
        .and_then(Value::as_object)
        .ok_or_else(|| ProbeError::MissingField(REQUEST_CONTEXT_FIELD.to_string()))?;

    let account_id = string_field(request_context, "accountId")?;
    let api_id = string_field(request_context, "apiId")?;
    let sanitize_text = |text: &str| {
        let text = replace_first(text, api_id, PLACEHOLDER_API_ID);
        replace_first(&text, account_id, PLACEHOLDER_ACCOUNT_ID)
    };

    let mut next_context = request_context.clone();
    for field in SANITIZED_REQUEST_FIELDS {
        let sanitized = sanitize_text(string_field(request_context, field)?);
        next_context.insert((*field).to_string(), Value::String(sanitized));
    }

    let mut next = event.clone();
    if let Some(object) = next.as_object_mut() {
        object.insert(REQUEST_CONTEXT_FIELD.to_string(), Value::Object(next_context));
    }
    Ok(next)
}

/// Copy of `context` whose ARN carries the placeholder account identifier.
///
/// Only the first occurrence of the account id is replaced, even when it also
/// matches text in an earlier ARN field.
pub fn sanitize_context(context: &InvocationContext) -> InvocationContext {
    let arn = &context.invoked_function_arn;
    let account_id = extract_account_id_from_function_arn(arn);
    InvocationContext {
        invoked_function_arn: replace_first(arn, account_id, PLACEHOLDER_ACCOUNT_ID),
        ..context.clone()
    }
}

/// The only settings ever echoed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SettingsView {
    #[serde(rename = "NODE_ENV", skip_serializing_if = "Option::is_none")]
    pub node_env: Option<String>,
    #[serde(rename = "STAGE", skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

pub fn sanitize_settings(settings: &Settings) -> SettingsView {
    SettingsView {
        node_env: settings.node_env.clone(),
        stage: settings.stage.clone(),
    }
}
