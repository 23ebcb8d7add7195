use actions_core::{
    ActionDefinition, DispatchCapabilities, Endpoint, Expression, FieldDefinition, FieldSchema,
    FieldType, SchemaError,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const KEY: &str = "sendEvent";

pub const INGEST_URL: &str = "https://api.getmetronome.com/v1/ingest";

/// One element of the ingest request body, as Metronome receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestEvent {
    pub transaction_id: String,
    pub customer_id: String,
    pub timestamp: String,
    pub event_type: String,
    pub properties: Map<String, Value>,
}

/// `sendEvent`: both entry points are enabled, so batches go out as a single
/// ingest request.
pub fn definition() -> Result<ActionDefinition, SchemaError> {
    let fields = FieldSchema::new(vec![
        FieldDefinition::new("transaction_id", FieldType::String)
            .description(
                "The Metronome transaction ID uniquely identifies an event to ensure Metronome only processes each event once.",
            )
            .required()
            .default_directive(json!({ "@path": "$.messageId" }))?,
        FieldDefinition::new("customer_id", FieldType::String)
            .description("The Metronome customer ID or ingest alias this event should be associated with.")
            .required()
            // Group, then user, then anonymous id.
            .default(Expression::first_present(&[
                "$.groupId",
                "$.userId",
                "$.anonymousId",
            ])?),
        FieldDefinition::new("timestamp", FieldType::Datetime)
            .description("The timestamp at which this event occurred.")
            .required()
            .default_directive(json!({ "@path": "$.timestamp" }))?,
        FieldDefinition::new("event_type", FieldType::String)
            .description("The Metronome event_type.")
            .required(),
        FieldDefinition::new("properties", FieldType::Object)
            .description("The Metronome properties object.")
            .required(),
    ])?;

    Ok(ActionDefinition {
        key: KEY.to_string(),
        title: "Send Event".to_string(),
        description: "Send an event to Metronome".to_string(),
        fields,
        endpoint: Endpoint::post(INGEST_URL),
        dispatch: DispatchCapabilities::ALL,
    })
}
