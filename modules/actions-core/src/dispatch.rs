use serde::Serialize;
use tracing::debug;

use crate::error::TransportError;
use crate::payload::Payload;
use crate::transport::{Method, OutboundRequest, Response, Transport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub method: Method,
    pub url: String,
}

impl Endpoint {
    pub fn get(url: &str) -> Self {
        Self {
            method: Method::Get,
            url: url.to_string(),
        }
    }

    pub fn post(url: &str) -> Self {
        Self {
            method: Method::Post,
            url: url.to_string(),
        }
    }
}

/// Posts payloads to a fixed endpoint as a JSON array. Knows nothing about
/// which adapter it serves; authentication comes from the transport.
pub struct Dispatcher<'a, T: ?Sized> {
    endpoint: &'a Endpoint,
    transport: &'a T,
}

impl<'a, T: Transport + ?Sized> Dispatcher<'a, T> {
    pub fn new(endpoint: &'a Endpoint, transport: &'a T) -> Self {
        Self {
            endpoint,
            transport,
        }
    }

    /// One event, still sent as a one-element array.
    pub async fn send_one(&self, payload: Payload) -> Result<Response, TransportError> {
        self.send_batch(vec![payload]).await
    }

    /// The whole sequence in one request, array order = input order. No size
    /// limit is applied here.
    pub async fn send_batch(&self, payloads: Vec<Payload>) -> Result<Response, TransportError> {
        let count = payloads.len();
        let body = serde_json::to_value(payloads)?;
        debug!(url = %self.endpoint.url, count, "Dispatching payloads");

        let request = OutboundRequest::new(self.endpoint.method, &self.endpoint.url)
            .with_header("Content-Type", "application/json")
            .json(body);
        self.transport.send(request).await
    }
}
