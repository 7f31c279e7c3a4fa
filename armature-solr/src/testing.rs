//! Scripted transport for tests.

use crate::error::{Result, SolrError};
use crate::transport::{HttpRequest, HttpResponse, Transport};
use async_trait::async_trait;
use http::StatusCode;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

enum Scripted {
    Reply(HttpResponse),
    Fail(String),
}

/// Transport that replays queued replies and records every request.
///
/// Clones share the same queue and call log, so a test can keep one handle
/// while the client owns another.
#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw response.
    pub fn with_response(self, response: HttpResponse) -> Self {
        self.replies.lock().push_back(Scripted::Reply(response));
        self
    }

    /// Queue a `200 OK` reply with the given body.
    pub fn with_json(self, body: impl Into<String>) -> Self {
        self.with_status(StatusCode::OK, body)
    }

    /// Queue a reply with the given status and body.
    pub fn with_status(self, status: StatusCode, body: impl Into<String>) -> Self {
        self.with_response(HttpResponse::new(status, body.into()))
    }

    /// Queue a transport failure.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.replies.lock().push_back(Scripted::Fail(message.into()));
        self
    }

    /// Number of requests sent so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// All requests sent so far.
    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().clone()
    }

    /// The most recent request.
    pub fn last_call(&self) -> Option<HttpRequest> {
        self.calls.lock().last().cloned()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        self.calls.lock().push(request);

        match self.replies.lock().pop_front() {
            Some(Scripted::Reply(response)) => Ok(response.with_url(url)),
            Some(Scripted::Fail(message)) => Err(SolrError::Transport(message)),
            None => Err(SolrError::Transport(format!(
                "no scripted reply left for {}",
                url
            ))),
        }
    }
}
