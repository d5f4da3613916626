//! Scripted in-memory transport for tests

use crate::domain::ports::{ApplianceRequest, ApplianceResponse, Transport, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

type Reply = Result<ApplianceResponse, TransportError>;

/// Replays queued replies in order and records every request it sees.
/// Once the queue is empty every request gets `200 OK` with an empty body.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ApplianceRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_ok(&self, body: &str) {
        self.replies.lock().push_back(Ok(ApplianceResponse::ok(body)));
    }

    pub fn push_response(&self, response: ApplianceResponse) {
        self.replies.lock().push_back(Ok(response));
    }

    pub fn push_failure(&self, error: TransportError) {
        self.replies.lock().push_back(Err(error));
    }

    /// Queue an HTTP 500
    pub fn push_server_error(&self) {
        self.push_response(ApplianceResponse {
            status: 500,
            reason: Some("Internal Server Error".into()),
            body: String::new(),
        });
    }

    pub fn requests(&self) -> Vec<ApplianceRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<ApplianceRequest> {
        self.requests.lock().last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApplianceRequest) -> Reply {
        self.requests.lock().push(request);
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(ApplianceResponse::ok("")))
    }
}
