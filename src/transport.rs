use std::{
    borrow::Cow,
    future::Future,
    pin::Pin,
    sync::Arc,
    time::{Duration, Instant},
};

use bytes::Bytes;
use reqwest::header::HeaderValue;
use reqwest::{Client as ReqwestClient, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub type BodyBytes = Bytes;
pub type HttpFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
pub type HttpResult<T> = Result<T, HttpError>;

/// Transport lifecycle as the mock observes it (callers of the real
/// transport never see these).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Busy,
    Error,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpErrorKind {
    Connect,
    Send,
    Receive,
    Timeout,
    Parse,
    Internal,
}

#[derive(Clone, Debug, Error)]
#[error("http error {kind:?} status={status:?} {message}")]
pub struct HttpError {
    pub kind: HttpErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl HttpError {
    pub fn new(kind: HttpErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> HttpErrorKind {
        self.kind
    }

    /// Timeouts and refused connections carry their own kind regardless of
    /// which phase of the exchange surfaced them.
    fn from_reqwest(fallback: HttpErrorKind, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            HttpErrorKind::Timeout
        } else if err.is_connect() {
            HttpErrorKind::Connect
        } else {
            fallback
        };
        Self {
            kind,
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }

    pub fn from_sonic(err: sonic_rs::Error) -> Self {
        Self {
            kind: HttpErrorKind::Parse,
            status: None,
            message: err.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, BodyBytes)>,
    pub body: Option<BodyBytes>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<BodyBytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<BodyBytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Optional per-request deadline. Without one the call blocks until the
    /// server answers or the connection fails.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Read-only snapshot of one HTTP reply. Status, raw text, and parsed JSON
/// are all views over the same stored bytes.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, BodyBytes)>,
    pub body: BodyBytes,
    pub elapsed: Duration,
}

impl HttpResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The raw body as text, replacement characters for invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> HttpResult<T> {
        sonic_rs::from_slice(&self.body).map_err(HttpError::from_sonic)
    }
}

pub trait HttpTransport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> HttpFuture<HttpResult<HttpResponse>>;
}

pub type SharedHttpTransport = dyn HttpTransport + Send + Sync;

#[derive(Clone)]
pub struct Client {
    transport: Arc<SharedHttpTransport>,
}

impl Client {
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }

    pub fn with_transport<T>(transport: T) -> Self
    where
        T: HttpTransport + 'static,
    {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub async fn execute(&self, request: HttpRequest) -> HttpResult<HttpResponse> {
        self.transport.execute(request).await
    }

    pub async fn execute_json<T>(&self, request: HttpRequest) -> HttpResult<T>
    where
        T: DeserializeOwned,
    {
        self.execute(request).await?.json::<T>()
    }

    /// Serialize `payload` and POST it as a JSON body.
    pub async fn post_json<T: Serialize>(
        &self,
        url: impl Into<String>,
        payload: &T,
    ) -> HttpResult<HttpResponse> {
        let body = sonic_rs::to_vec(payload).map_err(HttpError::from_sonic)?;
        self.execute(
            HttpRequest::post(url)
                .with_header("content-type", "application/json")
                .with_body(body),
        )
        .await
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: ReqwestClient::new(),
        }
    }

    pub fn with_client(client: ReqwestClient) -> Self {
        Self { client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, request: HttpRequest) -> HttpFuture<HttpResult<HttpResponse>> {
        let client = self.client.clone();
        Box::pin(async move {
            let start = Instant::now();
            let mut req = client.request(request.method.clone(), &request.url);

            for (key, value) in request.headers {
                let value = HeaderValue::from_bytes(value.as_ref())
                    .map_err(|err| HttpError::new(HttpErrorKind::Internal, None, err.to_string()))?;
                req = req.header(key, value);
            }

            if let Some(body) = request.body {
                req = req.body(body);
            }

            if let Some(timeout) = request.timeout {
                req = req.timeout(timeout);
            }

            let resp = req
                .send()
                .await
                .map_err(|err| HttpError::from_reqwest(HttpErrorKind::Send, err))?;

            let status = resp.status().as_u16();
            let headers = resp
                .headers()
                .iter()
                .map(|(name, value)| (name.to_string(), Bytes::copy_from_slice(value.as_ref())))
                .collect();
            let body = resp
                .bytes()
                .await
                .map_err(|err| HttpError::from_reqwest(HttpErrorKind::Receive, err))?;
            let elapsed = start.elapsed();

            Ok(HttpResponse {
                status,
                headers,
                body,
                elapsed,
            })
        })
    }
}
