use axum::{
    body::Body,
    http::{Response as HttpResponse, StatusCode},
    response::Response,
};
use probe_protocol::{serialize_json, ErrorBody, ErrorEnvelope, ProbeResponse};

const UNAUTHORIZED_HINT: &str =
    "Include Authorization: Bearer <token>, or unset PROBE_AUTH_TOKEN and restart the server.";

/// Map a probe response onto an HTTP response with the same status and body.
pub(crate) fn build_response(response: ProbeResponse) -> Result<Response, StatusCode> {
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_response(status, response.body)
}

pub(crate) fn unauthorized_response() -> Result<Response, StatusCode> {
    let body = ErrorBody::Structured(ErrorEnvelope {
        name: "Unauthorized".to_string(),
        message: UNAUTHORIZED_HINT.to_string(),
        stack: None,
    });
    let body = serialize_json(&body).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    json_response(StatusCode::UNAUTHORIZED, body)
}

fn json_response(status: StatusCode, body: String) -> Result<Response, StatusCode> {
    let mut builder = HttpResponse::builder()
        .status(status)
        .header("content-type", "application/json");

    if status == StatusCode::UNAUTHORIZED {
        builder = builder.header("www-authenticate", "Bearer");
    }

    builder
        .body(Body::from(body))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
