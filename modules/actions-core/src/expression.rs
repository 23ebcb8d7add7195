//! Default-value expressions and their evaluator.
//!
//! Expressions are written in the same declarative JSON form adapters have
//! always used (`{"@path": "$.userId"}`, `{"@if": {...}}`) and parsed into
//! [`Expression`] once, when the adapter or mapping is built.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::SchemaError;
use crate::event::Event;
use crate::path::Path;

const PATH_DIRECTIVE: &str = "@path";
const IF_DIRECTIVE: &str = "@if";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Expression {
    Literal(Value),
    PathLookup(Path),
    Conditional {
        exists: Path,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
}

impl Expression {
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn path(raw: &str) -> Result<Self, SchemaError> {
        Ok(Expression::PathLookup(Path::parse(raw)?))
    }

    pub fn conditional(exists: &str, then: Expression, otherwise: Expression) -> Result<Self, SchemaError> {
        Ok(Expression::Conditional {
            exists: Path::parse(exists)?,
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    /// Try each path in order and take the first that exists. The last path is
    /// a bare lookup, so if none exist the result is absent.
    pub fn first_present(paths: &[&str]) -> Result<Self, SchemaError> {
        let (last, rest) = paths
            .split_last()
            .ok_or_else(|| SchemaError::InvalidDirective("empty fallback chain".into()))?;

        rest.iter().rev().try_fold(Expression::path(last)?, |otherwise, path| {
            Expression::conditional(path, Expression::path(path)?, otherwise)
        })
    }

    /// Evaluate against `event`. `None` means absent.
    pub fn resolve(&self, event: &Event) -> Option<Value> {
        match self {
            Expression::Literal(Value::Null) => None,
            Expression::Literal(value) => Some(value.clone()),
            Expression::PathLookup(path) => event.lookup(path).cloned(),
            Expression::Conditional {
                exists,
                then,
                otherwise,
            } => {
                if event.lookup(exists).is_some() {
                    then.resolve(event)
                } else {
                    otherwise.resolve(event)
                }
            }
        }
    }

    /// Parse the declarative form. Non-directive values are literals.
    pub fn from_directive(value: &Value) -> Result<Self, SchemaError> {
        let Value::Object(map) = value else {
            return Ok(Expression::Literal(value.clone()));
        };

        if let Some(path) = map.get(PATH_DIRECTIVE) {
            expect_sole_key(map, PATH_DIRECTIVE)?;
            let raw = path.as_str().ok_or_else(|| {
                SchemaError::InvalidDirective(format!("{PATH_DIRECTIVE} expects a string, got {path}"))
            })?;
            return Expression::path(raw);
        }

        if let Some(body) = map.get(IF_DIRECTIVE) {
            expect_sole_key(map, IF_DIRECTIVE)?;
            return parse_conditional(body);
        }

        if let Some(key) = map.keys().find(|k| k.starts_with('@')) {
            return Err(SchemaError::InvalidDirective(format!("unknown directive {key}")));
        }

        Ok(Expression::Literal(value.clone()))
    }

    pub fn to_directive(&self) -> Value {
        match self {
            Expression::Literal(value) => value.clone(),
            Expression::PathLookup(path) => json!({ PATH_DIRECTIVE: path.as_str() }),
            Expression::Conditional {
                exists,
                then,
                otherwise,
            } => json!({
                IF_DIRECTIVE: {
                    "exists": { PATH_DIRECTIVE: exists.as_str() },
                    "then": then.to_directive(),
                    "else": otherwise.to_directive(),
                }
            }),
        }
    }
}

fn expect_sole_key(map: &Map<String, Value>, directive: &str) -> Result<(), SchemaError> {
    if map.len() == 1 {
        Ok(())
    } else {
        Err(SchemaError::InvalidDirective(format!(
            "{directive} cannot be combined with other keys"
        )))
    }
}

fn parse_conditional(body: &Value) -> Result<Expression, SchemaError> {
    let missing = |part: &str| SchemaError::InvalidDirective(format!("{IF_DIRECTIVE} is missing {part:?}"));

    let exists = body.get("exists").ok_or_else(|| missing("exists"))?;
    let then = body.get("then").ok_or_else(|| missing("then"))?;
    let otherwise = body.get("else").ok_or_else(|| missing("else"))?;

    let exists = match Expression::from_directive(exists)? {
        Expression::PathLookup(path) => path,
        _ => {
            return Err(SchemaError::InvalidDirective(format!(
                "{IF_DIRECTIVE}.exists must be a {PATH_DIRECTIVE} directive"
            )))
        }
    };

    Ok(Expression::Conditional {
        exists,
        then: Box::new(Expression::from_directive(then)?),
        otherwise: Box::new(Expression::from_directive(otherwise)?),
    })
}

impl TryFrom<Value> for Expression {
    type Error = SchemaError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Expression::from_directive(&value)
    }
}

impl From<Expression> for Value {
    fn from(expression: Expression) -> Self {
        expression.to_directive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer_id() -> Expression {
        Expression::from_directive(&json!({
            "@if": {
                "exists": { "@path": "$.groupId" },
                "then": { "@path": "$.groupId" },
                "else": {
                    "@if": {
                        "exists": { "@path": "$.userId" },
                        "then": { "@path": "$.userId" },
                        "else": { "@path": "$.anonymousId" }
                    }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn customer_id_fallback_covers_every_presence_combination() {
        for mask in 0..8u8 {
            let mut event = Map::new();
            if mask & 1 != 0 {
                event.insert("groupId".into(), json!("g"));
            }
            if mask & 2 != 0 {
                event.insert("userId".into(), json!("u"));
            }
            if mask & 4 != 0 {
                event.insert("anonymousId".into(), json!("a"));
            }

            let expected = if mask & 1 != 0 {
                Some(json!("g"))
            } else if mask & 2 != 0 {
                Some(json!("u"))
            } else if mask & 4 != 0 {
                Some(json!("a"))
            } else {
                None
            };

            let event = Event::new(Value::Object(event));
            assert_eq!(customer_id().resolve(&event), expected, "mask {mask:03b}");
        }
    }

    #[test]
    fn first_present_builds_the_same_chain() {
        let chain = Expression::first_present(&["$.groupId", "$.userId", "$.anonymousId"]).unwrap();
        assert_eq!(chain, customer_id());
    }

    #[test]
    fn literal_resolves_to_itself_and_null_literal_is_absent() {
        let event = Event::new(json!({}));
        assert_eq!(Expression::literal("x").resolve(&event), Some(json!("x")));
        assert_eq!(Expression::Literal(Value::Null).resolve(&event), None);
    }

    #[test]
    fn plain_objects_are_literals() {
        let expr = Expression::from_directive(&json!({ "plan": "pro" })).unwrap();
        assert_eq!(expr, Expression::literal(json!({ "plan": "pro" })));
    }

    #[test]
    fn directive_form_survives_serde() {
        let original = customer_id();
        let encoded = serde_json::to_value(&original).unwrap();
        let decoded: Expression = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn malformed_directives_are_rejected() {
        let cases = [
            json!({ "@path": 5 }),
            json!({ "@path": "$.a", "extra": 1 }),
            json!({ "@template": "{{a}}" }),
            json!({ "@if": { "exists": { "@path": "$.a" }, "then": 1 } }),
            json!({ "@if": { "exists": "a", "then": 1, "else": 2 } }),
        ];
        for case in cases {
            assert!(
                matches!(Expression::from_directive(&case), Err(SchemaError::InvalidDirective(_))),
                "{case} should be rejected"
            );
        }
    }
}
