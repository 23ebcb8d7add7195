use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{json_kind, ActionError, Result};
use crate::event::Event;
use crate::schema::{FieldSchema, Mapping};

/// Resolved field values for one event. Absent fields are simply not present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: &str, value: Value) {
        self.0.insert(field.to_string(), value);
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Evaluate each schema field against `event`. A mapping entry wins over the
/// field's default; defaults only apply when `use_defaults` is set.
pub fn resolve(schema: &FieldSchema, mapping: &Mapping, use_defaults: bool, event: &Event) -> Payload {
    let mut payload = Payload::default();
    for field in schema.fields() {
        let expression = mapping
            .get(&field.name)
            .or_else(|| field.default.as_ref().filter(|_| use_defaults));

        if let Some(value) = expression.and_then(|e| e.resolve(event)) {
            payload.insert(&field.name, value);
        }
    }
    payload
}

/// Check required presence and JSON shape. Runs before normalization so a
/// payload that fails here is never dispatched.
pub fn validate(schema: &FieldSchema, payload: &Payload) -> Result<()> {
    for field in schema.fields() {
        match payload.get(&field.name) {
            None if field.required => {
                return Err(ActionError::MissingRequiredField(field.name.clone()));
            }
            None => {}
            Some(value) if !field.field_type.accepts(value) => {
                return Err(ActionError::FieldTypeMismatch {
                    field: field.name.clone(),
                    expected: field.field_type.as_str(),
                    actual: json_kind(value),
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}
