// Test doubles for the transport seam, plus an event factory.
//
// - RecordingTransport: captures every request, answers with scripted statuses
// - FailingTransport: every send is a network error
// - test_event(): a track event shaped like the upstream test fixture

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::TransportError;
use crate::event::Event;
use crate::transport::{OutboundRequest, Response, Transport};

/// Records requests in order. Answers with queued responses first, then 200.
pub struct RecordingTransport {
    requests: Mutex<Vec<OutboundRequest>>,
    scripted: Mutex<VecDeque<Response>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            scripted: Mutex::new(VecDeque::new()),
        }
    }

    pub fn respond_with(self, status: u16, body: &str) -> Self {
        self.scripted.lock().unwrap().push_back(Response {
            status,
            body: body.to_string(),
        });
        self
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// JSON bodies of every recorded request.
    pub fn bodies(&self) -> Vec<Value> {
        self.requests()
            .into_iter()
            .map(|r| r.body.unwrap_or(Value::Null))
            .collect()
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: OutboundRequest) -> Result<Response, TransportError> {
        self.requests.lock().unwrap().push(request);
        let next = self.scripted.lock().unwrap().pop_front();
        Ok(next.unwrap_or(Response {
            status: 200,
            body: String::new(),
        }))
    }
}

pub struct FailingTransport;

#[async_trait]
impl Transport for FailingTransport {
    async fn send(&self, request: OutboundRequest) -> Result<Response, TransportError> {
        Err(TransportError::Network(format!(
            "FailingTransport: connection refused for {}",
            request.url
        )))
    }
}

/// Builder over a default track event. `groupId` is absent by default.
pub struct TestEvent(Value);

impl TestEvent {
    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0[key] = value.into();
        self
    }

    pub fn remove(mut self, key: &str) -> Self {
        if let Value::Object(map) = &mut self.0 {
            map.remove(key);
        }
        self
    }

    pub fn build(self) -> Event {
        Event::new(self.0)
    }
}

pub fn test_event() -> TestEvent {
    let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    TestEvent(json!({
        "anonymousId": Uuid::new_v4().to_string(),
        "context": {
            "ip": "8.8.8.8",
            "library": { "name": "analytics.js", "version": "2.11.1" },
            "locale": "en-US",
            "page": { "path": "/academy/", "title": "Analytics Academy" },
            "userAgent": "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_2)"
        },
        "event": "Test Event",
        "messageId": Uuid::new_v4().to_string(),
        "properties": {},
        "receivedAt": now,
        "sentAt": now,
        "timestamp": now,
        "type": "track",
        "userId": "user1234"
    }))
}
