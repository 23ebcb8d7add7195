pub mod definition;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod expression;
pub mod normalize;
pub mod path;
pub mod payload;
pub mod runner;
pub mod schema;
pub mod transport;

#[cfg(feature = "test-utils")]
pub mod testing;

pub use definition::{
    settings_schema, ActionDefinition, Authentication, Destination, DestinationDefinition,
    DispatchCapabilities, Mode,
};
pub use dispatch::{Dispatcher, Endpoint};
pub use error::{ActionError, MalformedTimestamp, Result, SchemaError, TransportError};
pub use event::Event;
pub use expression::Expression;
pub use normalize::{format_instant, normalize, parse_timestamp};
pub use path::Path;
pub use payload::Payload;
pub use runner::{ActionRunner, BatchOutcome, Delivery, RejectedEvent};
pub use schema::{FieldDefinition, FieldSchema, FieldType, Mapping};
pub use transport::{
    ExtendedTransport, HttpTransport, Method, OutboundRequest, RequestExtension, Response,
    Transport, DEFAULT_USER_AGENT,
};
