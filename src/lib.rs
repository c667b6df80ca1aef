//! Smoke-test client for a locally running text-extraction service.
//!
//! Sends one `{"text": ...}` POST to the extract endpoint and reports the
//! outcome on the console: status code, raw body, and the body parsed as
//! JSON (or a decode-failure notice). Ships a reqwest transport for real
//! runs and an in-memory mock transport for fully deterministic tests.

pub mod extract;
pub mod mock;
pub mod report;
pub mod transport;

pub use reqwest::Method;

pub use extract::{DEFAULT_ENDPOINT, ExtractClient, ExtractPayload, SAMPLE_TEXT};
pub use mock::{MockBehavior, MockBehaviorPlan, MockResponse, MockStateSnapshot, MockTransport};
pub use report::{print_report, write_report};
pub use transport::{
    BodyBytes, Client, HttpError, HttpErrorKind, HttpFuture, HttpRequest, HttpResponse,
    HttpResult, HttpTransport, ReqwestTransport, TransportState,
};
