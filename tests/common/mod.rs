//! Shared fixtures for the integration suites.

use serde::{Deserialize, Serialize};
use service_host::dispatch::DispatchOutcome;
use service_host::{BufferedResponse, Dispatcher, TransportRequest};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Echo {
    pub text: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoResponse {
    pub text: String,
}

pub async fn send(dispatcher: &Dispatcher, request: TransportRequest) -> DispatchOutcome {
    dispatcher
        .dispatch(request, Box::new(BufferedResponse::new()))
        .await
}

pub fn body_str(outcome: &DispatchOutcome) -> &str {
    std::str::from_utf8(outcome.response.body()).unwrap_or("")
}

pub fn content_type(outcome: &DispatchOutcome) -> &str {
    outcome
        .response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}
