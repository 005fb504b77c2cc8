//! The single outbound call and its response handling.

use crate::request::HttpRequest;
use crate::transport::HttpTransport;
use crate::{EngineError, Result};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

/// Message returned by tools that have no backing API.
pub const NO_CALL_MESSAGE: &str = "All prerequisites are met. No API call was required.";

/// Success payload for tools without API details.
pub fn no_call_result() -> Value {
    json!({ "message": NO_CALL_MESSAGE })
}

/// Send `request` and return the response body.
///
/// Non-2xx responses become [`EngineError::UpstreamApi`] carrying the status
/// and body. When `response_pointer` is set and resolves, only that part of
/// the body is returned.
pub async fn execute_request<T: HttpTransport>(
    transport: &T,
    request: &HttpRequest,
    timeout: Duration,
    response_pointer: Option<&str>,
) -> Result<Value> {
    debug!(method = %request.method, url = %request.url, "sending request");
    let response = transport.send(request, timeout).await?;
    debug!(status = response.status, "received response");

    if !response.is_success() {
        return Err(EngineError::UpstreamApi {
            status: response.status,
            body: response.body,
        });
    }

    Ok(select(response.body, response_pointer))
}

fn select(body: Value, pointer: Option<&str>) -> Value {
    let Some(pointer) = pointer else {
        return body;
    };
    match body.pointer(pointer) {
        Some(selected) => selected.clone(),
        None => {
            debug!(pointer, "response pointer did not resolve, returning full body");
            body
        }
    }
}
