//! Request runner for the text-extraction endpoint.

use serde::Serialize;

use crate::transport::{Client, HttpResponse, HttpResult, HttpTransport};

/// Default target of a smoke run, the locally served extract endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/gemini/extract";

/// Text sent when none is given on the command line. Mixed ASCII/CJK on
/// purpose: the payload must reach the server byte-for-byte as UTF-8.
pub const SAMPLE_TEXT: &str = "Paracetamol 500mg 每日三次 飯後服用";

/// Request body for the extract endpoint, a single `text` field.
#[derive(Clone, Debug, Serialize)]
pub struct ExtractPayload {
    pub text: String,
}

/// One-shot client for the extract endpoint. Builds the payload, sends one
/// POST, and hands back whatever the server replied.
#[derive(Clone)]
pub struct ExtractClient {
    client: Client,
    endpoint: String,
}

impl ExtractClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn with_transport<T>(transport: T, endpoint: impl Into<String>) -> Self
    where
        T: HttpTransport + 'static,
    {
        Self {
            client: Client::with_transport(transport),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST `{"text": <text>}` to the endpoint. Transport failures bubble up
    /// unchanged; nothing here retries or recovers.
    pub async fn extract(&self, text: &str) -> HttpResult<HttpResponse> {
        let payload = ExtractPayload {
            text: text.to_owned(),
        };
        self.client.post_json(&self.endpoint, &payload).await
    }
}
