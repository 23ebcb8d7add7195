use tracing::debug;

use crate::definition::ActionDefinition;
use crate::dispatch::Dispatcher;
use crate::error::{ActionError, Result, SchemaError};
use crate::event::Event;
use crate::normalize::normalize;
use crate::payload::{self, Payload};
use crate::schema::Mapping;
use crate::transport::{Response, Transport};

/// An event excluded from a batch, by its position in the input.
#[derive(Debug)]
pub struct RejectedEvent {
    pub index: usize,
    pub error: ActionError,
}

/// A response and the input positions of the events its request carried.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub indices: Vec<usize>,
    pub response: Response,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// One entry for a batched request, one per delivered event otherwise.
    pub responses: Vec<Delivery>,
    pub rejected: Vec<RejectedEvent>,
}

/// Runs one action: resolve fields, validate, normalize, dispatch.
///
/// Holds no mutable state, so a single runner can serve concurrent calls.
pub struct ActionRunner<T> {
    action: ActionDefinition,
    mapping: Mapping,
    use_default_mappings: bool,
    transport: T,
}

impl<T: Transport> ActionRunner<T> {
    pub fn new(action: ActionDefinition, transport: T) -> Self {
        Self {
            action,
            mapping: Mapping::new(),
            use_default_mappings: true,
            transport,
        }
    }

    pub fn with_mapping(mut self, mapping: Mapping) -> std::result::Result<Self, SchemaError> {
        mapping.validate(&self.action.fields)?;
        self.mapping = mapping;
        Ok(self)
    }

    pub fn use_default_mappings(mut self, enabled: bool) -> Self {
        self.use_default_mappings = enabled;
        self
    }

    pub fn action(&self) -> &ActionDefinition {
        &self.action
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Everything short of sending: the payload this event would produce.
    pub fn prepare(&self, event: &Event) -> Result<Payload> {
        let fields = &self.action.fields;
        let payload = payload::resolve(fields, &self.mapping, self.use_default_mappings, event);
        payload::validate(fields, &payload)?;
        Ok(normalize(fields, payload)?)
    }

    pub async fn execute(&self, event: &Event) -> Result<Response> {
        if !self.action.dispatch.single {
            return Err(self.unsupported("single"));
        }
        let payload = self.prepare(event)?;
        Ok(self.dispatcher().send_one(payload).await?)
    }

    /// Deliver `events` in order. Batch-capable actions get one request for
    /// all accepted events; single-only actions get one request per event.
    pub async fn execute_batch(&self, events: &[Event]) -> Result<BatchOutcome> {
        let capabilities = self.action.dispatch;
        if capabilities.batch {
            self.send_batched(events).await
        } else if capabilities.single {
            Ok(self.send_each(events).await)
        } else {
            Err(self.unsupported("batch"))
        }
    }

    async fn send_batched(&self, events: &[Event]) -> Result<BatchOutcome> {
        let mut outcome = BatchOutcome::default();
        let mut payloads = Vec::with_capacity(events.len());
        let mut indices = Vec::with_capacity(events.len());

        for (index, event) in events.iter().enumerate() {
            match self.prepare(event) {
                Ok(payload) => {
                    payloads.push(payload);
                    indices.push(index);
                }
                Err(error) => outcome.rejected.push(RejectedEvent { index, error }),
            }
        }

        debug!(
            action = %self.action.key,
            accepted = payloads.len(),
            rejected = outcome.rejected.len(),
            "Prepared batch"
        );

        if !payloads.is_empty() {
            let response = self.dispatcher().send_batch(payloads).await?;
            outcome.responses.push(Delivery { indices, response });
        }
        Ok(outcome)
    }

    async fn send_each(&self, events: &[Event]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for (index, event) in events.iter().enumerate() {
            match self.execute(event).await {
                Ok(response) => outcome.responses.push(Delivery {
                    indices: vec![index],
                    response,
                }),
                Err(error) => outcome.rejected.push(RejectedEvent { index, error }),
            }
        }
        outcome
    }

    fn dispatcher(&self) -> Dispatcher<'_, T> {
        Dispatcher::new(&self.action.endpoint, &self.transport)
    }

    fn unsupported(&self, mode: &'static str) -> ActionError {
        ActionError::UnsupportedDispatch {
            action: self.action.key.clone(),
            mode,
        }
    }
}
