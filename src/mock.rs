//! In-memory transport double. Responses are queued per route (or globally),
//! failures are scripted as a per-request behavior plan, and every outbound
//! request is logged so tests can assert the exact bytes sent.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use bytes::Bytes;
use reqwest::Method;
use serde::Serialize;
use sonic_rs::to_vec;

use super::transport::{
    BodyBytes, HttpError, HttpErrorKind, HttpFuture, HttpRequest, HttpResponse, HttpResult,
    HttpTransport, TransportState,
};

/// What the mock does with the next request. The plan is consumed front to
/// back; an exhausted plan behaves as `Pass`.
#[derive(Clone, Debug, Default)]
pub enum MockBehavior {
    #[default]
    Pass,
    Delay(Duration),
    ConnectError(String),
    SendError(String),
    ReceiveError(String),
    TimeoutError(String),
}

impl MockBehavior {
    pub fn delay(ms: u64) -> Self {
        Self::Delay(Duration::from_millis(ms))
    }

    pub fn connect_error(message: impl Into<String>) -> Self {
        Self::ConnectError(message.into())
    }

    pub fn send_error(message: impl Into<String>) -> Self {
        Self::SendError(message.into())
    }

    pub fn receive_error(message: impl Into<String>) -> Self {
        Self::ReceiveError(message.into())
    }

    pub fn timeout_error(message: impl Into<String>) -> Self {
        Self::TimeoutError(message.into())
    }
}

#[derive(Clone, Debug, Default)]
pub struct MockBehaviorPlan {
    queue: VecDeque<MockBehavior>,
}

impl MockBehaviorPlan {
    pub fn push(&mut self, behavior: MockBehavior) -> &mut Self {
        self.queue.push_back(behavior);
        self
    }

    fn pop(&mut self) -> MockBehavior {
        self.queue.pop_front().unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub headers: Vec<(String, BodyBytes)>,
    pub body: BodyBytes,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<BodyBytes>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body.into())
    }

    pub fn json<T: Serialize>(status: u16, payload: &T) -> HttpResult<Self> {
        let body = to_vec(payload).map_err(HttpError::from_sonic)?;
        Ok(Self::new(status, body))
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<BodyBytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }
}

/// Point-in-time view of the mock for post-hoc assertions.
#[derive(Clone, Debug)]
pub struct MockStateSnapshot {
    pub state: TransportState,
    pub request_count: usize,
    pub last_url: Option<String>,
    pub last_status: Option<u16>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
struct MockTransportState {
    state: TransportState,
    request_count: usize,
    last_url: Option<String>,
    last_status: Option<u16>,
    last_error: Option<String>,
    behavior_plan: MockBehaviorPlan,
    default_response_queue: VecDeque<MockResponse>,
    route_response_queues: HashMap<(Method, String), VecDeque<MockResponse>>,
    outbound_log: Vec<HttpRequest>,
}

impl Default for MockTransportState {
    fn default() -> Self {
        Self {
            state: TransportState::Idle,
            request_count: 0,
            last_url: None,
            last_status: None,
            last_error: None,
            behavior_plan: MockBehaviorPlan::default(),
            default_response_queue: VecDeque::new(),
            route_response_queues: HashMap::new(),
            outbound_log: Vec::new(),
        }
    }
}

impl MockTransportState {
    fn snapshot(&self) -> MockStateSnapshot {
        MockStateSnapshot {
            state: self.state,
            request_count: self.request_count,
            last_url: self.last_url.clone(),
            last_status: self.last_status,
            last_error: self.last_error.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MockTransport {
    state: Arc<Mutex<MockTransportState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockTransportState::default())),
        }
    }

    pub fn with_behavior_plan(behavior_plan: MockBehaviorPlan) -> Self {
        let transport = Self::new();
        transport
            .state
            .lock()
            .expect("mock transport mutex poisoned while installing behavior plan")
            .behavior_plan = behavior_plan;
        transport
    }

    pub fn snapshot(&self) -> MockStateSnapshot {
        self.state
            .lock()
            .expect("mock transport mutex poisoned while taking snapshot")
            .snapshot()
    }

    /// Responses served when no route-specific queue matches.
    pub fn queue_response(&self, response: MockResponse) {
        self.state
            .lock()
            .expect("mock transport mutex poisoned while queueing response")
            .default_response_queue
            .push_back(response);
    }

    pub fn queue_response_for(&self, method: Method, url: impl Into<String>, response: MockResponse) {
        let key = (method, url.into());
        self.state
            .lock()
            .expect("mock transport mutex poisoned while queueing response by route")
            .route_response_queues
            .entry(key)
            .or_default()
            .push_back(response);
    }

    pub fn queue_post_response(&self, url: impl Into<String>, response: MockResponse) {
        self.queue_response_for(Method::POST, url, response);
    }

    /// Every request the mock has executed, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state
            .lock()
            .expect("mock transport mutex poisoned while reading outbound log")
            .outbound_log
            .clone()
    }

    fn next_response(&self, request: &HttpRequest) -> Option<MockResponse> {
        let mut state = self
            .state
            .lock()
            .expect("mock transport mutex poisoned while selecting response");
        let route_key = (request.method.clone(), request.url.clone());
        if let Some(queue) = state.route_response_queues.get_mut(&route_key) {
            if let Some(response) = queue.pop_front() {
                return Some(response);
            }
        }
        state.default_response_queue.pop_front()
    }

    fn fail(&self, kind: HttpErrorKind, message: String) -> HttpError {
        let mut state = self
            .state
            .lock()
            .expect("mock transport mutex poisoned while recording error");
        state.state = TransportState::Error;
        state.last_error = Some(message.clone());
        HttpError::new(kind, None, message)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for MockTransport {
    fn execute(&self, request: HttpRequest) -> HttpFuture<HttpResult<HttpResponse>> {
        let transport = self.clone();
        Box::pin(async move {
            let behavior = {
                let mut state = transport
                    .state
                    .lock()
                    .expect("mock transport mutex poisoned while reading behavior plan");
                state.behavior_plan.pop()
            };

            if let MockBehavior::Delay(duration) = &behavior {
                std::thread::sleep(*duration);
            }

            let start = Instant::now();
            {
                let mut state = transport
                    .state
                    .lock()
                    .expect("mock transport mutex poisoned while recording request");
                state.request_count += 1;
                state.last_url = Some(request.url.clone());
                state.state = TransportState::Busy;
                state.last_error = None;
                state.outbound_log.push(request.clone());
            }

            match behavior {
                MockBehavior::ConnectError(message) => {
                    return Err(transport.fail(HttpErrorKind::Connect, message));
                }
                MockBehavior::SendError(message) => {
                    return Err(transport.fail(HttpErrorKind::Send, message));
                }
                MockBehavior::ReceiveError(message) => {
                    return Err(transport.fail(HttpErrorKind::Receive, message));
                }
                MockBehavior::TimeoutError(message) => {
                    return Err(transport.fail(HttpErrorKind::Timeout, message));
                }
                MockBehavior::Pass | MockBehavior::Delay(_) => {}
            }

            // Exhausted queues answer with an empty 200.
            let response = transport.next_response(&request).unwrap_or(MockResponse {
                status: 200,
                headers: Vec::new(),
                body: Bytes::new(),
            });

            let response = HttpResponse {
                status: response.status,
                headers: response.headers,
                body: response.body,
                elapsed: start.elapsed(),
            };

            {
                let mut state = transport
                    .state
                    .lock()
                    .expect("mock transport mutex poisoned while recording response");
                state.last_status = Some(response.status);
                state.state = TransportState::Idle;
            }

            Ok(response)
        })
    }
}
