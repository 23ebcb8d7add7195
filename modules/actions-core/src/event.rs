use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::Path;

/// One occurrence reported by the upstream pipeline. Opaque beyond being a
/// JSON document; fields like `messageId` or `groupId` are only ever reached
/// through path lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Value);

impl Event {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Value at `path`, or `None` when any segment is missing or the value is null.
    pub fn lookup(&self, path: &Path) -> Option<&Value> {
        path.lookup(&self.0)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Event {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
