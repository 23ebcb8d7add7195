use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;
use crate::expression::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Datetime,
    Object,
    Number,
    Integer,
    Boolean,
}

impl FieldType {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Datetime => "datetime",
            FieldType::Object => "object",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
        }
    }

    /// Whether a resolved value has an acceptable JSON shape for this type.
    /// Datetimes accept strings and epoch numbers; parsing happens later.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Datetime => value.is_string() || value.is_number(),
            FieldType::Object => value.is_object(),
            FieldType::Number => value.is_number(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Boolean => value.is_boolean(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(FieldType::String),
            "datetime" => Ok(FieldType::Datetime),
            "object" => Ok(FieldType::Object),
            "number" => Ok(FieldType::Number),
            "integer" => Ok(FieldType::Integer),
            "boolean" => Ok(FieldType::Boolean),
            other => Err(SchemaError::UnknownFieldType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    pub description: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Expression>,
}

impl FieldDefinition {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            description: String::new(),
            field_type,
            required: false,
            default: None,
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, expression: Expression) -> Self {
        self.default = Some(expression);
        self
    }

    /// Set the default from its declarative JSON form.
    pub fn default_directive(self, directive: Value) -> Result<Self, SchemaError> {
        Ok(self.default(Expression::from_directive(&directive)?))
    }
}

/// The ordered set of fields an action accepts. Checked once on construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldSchema {
    fields: Vec<FieldDefinition>,
}

impl FieldSchema {
    pub fn new(fields: Vec<FieldDefinition>) -> Result<Self, SchemaError> {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn datetime_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields
            .iter()
            .filter(|f| f.field_type == FieldType::Datetime)
    }
}

/// Per-call field expressions supplied by whoever configures the action.
/// They take precedence over schema defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mapping(BTreeMap<String, Expression>);

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: &Value) -> Result<Self, SchemaError> {
        let Value::Object(map) = value else {
            return Err(SchemaError::InvalidDirective(
                "mapping must be a JSON object".to_string(),
            ));
        };
        map.iter()
            .map(|(field, directive)| Ok((field.clone(), Expression::from_directive(directive)?)))
            .collect::<Result<BTreeMap<_, _>, SchemaError>>()
            .map(Self)
    }

    pub fn with(mut self, field: &str, expression: Expression) -> Self {
        self.0.insert(field.to_string(), expression);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Expression> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reject mappings that name fields the schema does not declare.
    pub fn validate(&self, schema: &FieldSchema) -> Result<(), SchemaError> {
        match self.0.keys().find(|field| schema.get(field).is_none()) {
            Some(unknown) => Err(SchemaError::UnknownField(unknown.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn duplicate_field_names_are_rejected() {
        let result = FieldSchema::new(vec![
            FieldDefinition::new("timestamp", FieldType::Datetime),
            FieldDefinition::new("timestamp", FieldType::String),
        ]);
        assert_eq!(result, Err(SchemaError::DuplicateField("timestamp".into())));
    }

    #[test]
    fn field_types_accept_their_json_shapes() {
        assert!(FieldType::Datetime.accepts(&json!("2021-01-01")));
        assert!(FieldType::Datetime.accepts(&json!(1609459200000_i64)));
        assert!(!FieldType::Datetime.accepts(&json!(true)));
        assert!(FieldType::Integer.accepts(&json!(3)));
        assert!(!FieldType::Integer.accepts(&json!(3.5)));
        assert!(!FieldType::String.accepts(&json!({})));
        assert!(FieldType::Object.accepts(&json!({ "k": [1, 2] })));
    }

    #[test]
    fn field_type_parses_from_its_name() {
        assert_eq!("datetime".parse::<FieldType>(), Ok(FieldType::Datetime));
        assert!("date".parse::<FieldType>().is_err());
    }

    #[test]
    fn mapping_with_unknown_field_fails_validation() {
        let schema = FieldSchema::new(vec![FieldDefinition::new("event_type", FieldType::String)]).unwrap();
        let mapping = Mapping::from_json(&json!({
            "event_type": { "@path": "$.event" },
            "nope": { "@path": "$.x" }
        }))
        .unwrap();
        assert_eq!(mapping.validate(&schema), Err(SchemaError::UnknownField("nope".into())));
    }

    #[test]
    fn mapping_must_be_an_object() {
        assert!(Mapping::from_json(&json!(["event_type"])).is_err());
    }

    #[test]
    fn schema_describes_defaults_in_directive_form() {
        let schema = FieldSchema::new(vec![FieldDefinition::new("transaction_id", FieldType::String)
            .required()
            .default_directive(json!({ "@path": "$.messageId" }))
            .unwrap()])
        .unwrap();

        let described = serde_json::to_value(&schema).unwrap();
        assert_eq!(described[0]["type"], json!("string"));
        assert_eq!(described[0]["required"], json!(true));
        assert_eq!(described[0]["default"], json!({ "@path": "$.messageId" }));
    }
}
