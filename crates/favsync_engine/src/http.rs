//! HTTP transport implementation.
//!
//! This module provides an HTTP-based [`RemoteSyncClient`]. The actual HTTP
//! client is abstracted via a trait so that different libraries (reqwest,
//! ureq, a platform networking stack) or an in-process loopback can be used.
//!
//! Endpoints, relative to the base URL:
//!
//! - `POST /favorites/sync/push` with a JSON [`PushRequest`]
//! - `GET /favorites/sync/pull?userId=..&since=..` returning a JSON
//!   [`PullResponse`]; `since` is empty when the client never synced

use crate::error::{SyncError, SyncOutcome};
use crate::transport::RemoteSyncClient;
use favsync_model::{ModelError, PullResponse, PushRequest};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Path of the push endpoint.
pub const PUSH_PATH: &str = "/favorites/sync/push";
/// Path of the pull endpoint.
pub const PULL_PATH: &str = "/favorites/sync/pull";

/// Longest slice of an error body kept in a [`SyncError::Server`] message.
const MAX_ERROR_BODY: usize = 200;

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// An exchange that produced no HTTP response at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpFailure {
    /// DNS, connect or TLS failure.
    Connect(String),
    /// The request timed out.
    Timeout(String),
}

impl From<HttpFailure> for SyncError {
    fn from(failure: HttpFailure) -> Self {
        match failure {
            HttpFailure::Connect(message) => SyncError::connection(message),
            HttpFailure::Timeout(message) => SyncError::timeout(message),
        }
    }
}

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport. Calls are
/// blocking; the client owns its timeout.
pub trait HttpClient: Send + Sync {
    /// Sends a GET request with the given query parameters.
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, HttpFailure>;

    /// Sends a POST request with a JSON body.
    fn post(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse, HttpFailure>;
}

/// HTTP-based remote sync client.
///
/// Uses JSON encoding for request and response bodies.
pub struct HttpRemote<C: HttpClient> {
    /// Base URL of the backend (e.g., "https://api.example.com").
    base_url: String,
    /// HTTP client implementation.
    client: C,
    /// Last error message.
    last_error: RwLock<Option<String>>,
}

impl<C: HttpClient> HttpRemote<C> {
    /// Creates a new HTTP remote. A trailing slash on `base_url` is ignored.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client,
            last_error: RwLock::new(None),
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the HTTP client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    fn record<T>(&self, outcome: SyncOutcome<T>) -> SyncOutcome<T> {
        *self.last_error.write() = outcome.as_ref().err().map(ToString::to_string);
        outcome
    }

    fn push_once(&self, request: &PushRequest) -> SyncOutcome<()> {
        let body = request
            .encode()
            .map_err(|e| SyncError::Protocol(format!("failed to encode push request: {e}")))?;
        let url = format!("{}{}", self.base_url, PUSH_PATH);
        debug!(%url, records = request.favorites.len(), "pushing favorites");

        // Any 2xx is success; the body is not inspected.
        Self::check_status(self.client.post(&url, body)?)?;
        Ok(())
    }

    fn pull_once(&self, user_id: &str, since: Option<&str>) -> SyncOutcome<PullResponse> {
        let url = format!("{}{}", self.base_url, PULL_PATH);
        let query = [("userId", user_id), ("since", since.unwrap_or(""))];
        debug!(%url, since = since.unwrap_or(""), "pulling favorites");

        let response = Self::check_status(self.client.get(&url, &query)?)?;
        PullResponse::decode(&response.body).map_err(|e| match e {
            ModelError::EmptyBody | ModelError::Json(_) => SyncError::EmptyResponse,
            other => SyncError::Protocol(other.to_string()),
        })
    }

    fn check_status(response: HttpResponse) -> SyncOutcome<HttpResponse> {
        if response.is_success() {
            return Ok(response);
        }
        let end = response.body.len().min(MAX_ERROR_BODY);
        let message = String::from_utf8_lossy(&response.body[..end]).trim().to_string();
        Err(SyncError::server(response.status, message))
    }
}

impl<C: HttpClient> RemoteSyncClient for HttpRemote<C> {
    fn push(&self, request: &PushRequest) -> SyncOutcome<()> {
        let outcome = self.push_once(request);
        self.record(outcome)
    }

    fn pull(&self, user_id: &str, since: Option<&str>) -> SyncOutcome<PullResponse> {
        let outcome = self.pull_once(user_id, since);
        self.record(outcome)
    }
}

/// HTTP methods understood by the loopback transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET.
    Get,
    /// POST.
    Post,
}

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer {
    /// Handles a request and returns the response.
    fn handle(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: &[u8],
    ) -> HttpResponse;
}

impl<T: LoopbackServer + ?Sized> LoopbackServer for std::sync::Arc<T> {
    fn handle(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: &[u8],
    ) -> HttpResponse {
        (**self).handle(method, path, query, body)
    }
}

/// A loopback HTTP client that routes requests directly to a server object.
///
/// Useful for testing without actual network overhead. Taking it offline
/// makes every request fail with a connect error.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
    online: AtomicBool,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self {
            server,
            online: AtomicBool::new(true),
        }
    }

    /// Simulates losing or regaining connectivity.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Returns the wrapped server.
    pub fn server(&self) -> &S {
        &self.server
    }

    fn route(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: &[u8],
    ) -> Result<HttpResponse, HttpFailure> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(HttpFailure::Connect(format!("{url}: network unreachable")));
        }
        // Extract path from URL
        let path = url.find("/favorites/").map(|i| &url[i..]).unwrap_or(url);
        Ok(self.server.handle(method, path, query, body))
    }
}

impl<S: LoopbackServer + Send + Sync> HttpClient for LoopbackClient<S> {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, HttpFailure> {
        let query: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.route(Method::Get, url, &query, &[])
    }

    fn post(&self, url: &str, body: Vec<u8>) -> Result<HttpResponse, HttpFailure> {
        self.route(Method::Post, url, &[], &body)
    }
}
