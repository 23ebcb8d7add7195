use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::MalformedTimestamp;
use crate::payload::Payload;
use crate::schema::FieldSchema;

/// Offset-less datetime layouts, read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Years that fit the four-digit canonical form and so parse back unchanged.
const SUPPORTED_YEARS: RangeInclusive<i32> = 0..=9999;

/// Rewrite every datetime field as a canonical UTC instant string. All other
/// fields, including free-form objects, pass through untouched.
pub fn normalize(schema: &FieldSchema, mut payload: Payload) -> Result<Payload, MalformedTimestamp> {
    for field in schema.datetime_fields() {
        let Some(raw) = payload.get(&field.name) else {
            continue;
        };
        let instant = parse_timestamp(raw).ok_or_else(|| MalformedTimestamp {
            field: field.name.clone(),
            value: raw.clone(),
        })?;
        payload.insert(&field.name, Value::String(format_instant(&instant)));
    }
    Ok(payload)
}

/// Millisecond precision with a `Z` designator, e.g. `2021-01-01T00:00:00.000Z`.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Read a timestamp from a string or an epoch-milliseconds number. Instants
/// outside years 0000-9999 are rejected.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let instant = match value {
        Value::String(s) => parse_timestamp_str(s),
        Value::Number(n) => {
            let millis = match n.as_i64() {
                Some(ms) => ms,
                None => n.as_f64().filter(|f| f.is_finite())?.trunc() as i64,
            };
            DateTime::from_timestamp_millis(millis)
        }
        _ => None,
    };
    instant.filter(|dt| SUPPORTED_YEARS.contains(&dt.year()))
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Offsets written without a colon, e.g. +0000.
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDefinition, FieldType};
    use serde_json::json;

    fn canonical(value: Value) -> Option<String> {
        parse_timestamp(&value).map(|dt| format_instant(&dt))
    }

    #[test]
    fn accepted_representations_become_utc_instants() {
        let cases = [
            (json!("2021-01-01"), "2021-01-01T00:00:00.000Z"),
            (json!("2021-1-5"), "2021-01-05T00:00:00.000Z"),
            (json!("2021-03-04T05:06:07Z"), "2021-03-04T05:06:07.000Z"),
            (json!("2021-03-04T05:06:07.123456Z"), "2021-03-04T05:06:07.123Z"),
            (json!("2021-03-04T07:06:07+02:00"), "2021-03-04T05:06:07.000Z"),
            (json!("2021-03-04T07:06:07+0200"), "2021-03-04T05:06:07.000Z"),
            (json!("2021-03-04T05:06:07"), "2021-03-04T05:06:07.000Z"),
            (json!("2021-03-04 05:06"), "2021-03-04T05:06:00.000Z"),
            (json!("Thu, 04 Mar 2021 05:06:07 GMT"), "2021-03-04T05:06:07.000Z"),
            (json!(1609459200000_i64), "2021-01-01T00:00:00.000Z"),
            (json!(1609459200123.9), "2021-01-01T00:00:00.123Z"),
        ];
        for (input, expected) in cases {
            assert_eq!(canonical(input.clone()).as_deref(), Some(expected), "input {input}");
        }
    }

    #[test]
    fn canonical_output_is_a_fixed_point() {
        let once = canonical(json!("2021-03-04T07:06:07.5+02:00")).unwrap();
        let twice = canonical(json!(once.clone())).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn instants_beyond_four_digit_years_are_rejected() {
        // First millisecond of year 10000, and 0001-01-01 BCE.
        for input in [json!(253402300800000_i64), json!(-62198755200000_i64)] {
            assert_eq!(canonical(input.clone()), None, "input {input}");
        }

        let last = canonical(json!(253402300799999_i64)).unwrap();
        assert_eq!(last, "9999-12-31T23:59:59.999Z");
        assert_eq!(canonical(json!(last.clone())).as_deref(), Some(last.as_str()));

        let first = canonical(json!(-62167219200000_i64)).unwrap();
        assert_eq!(first, "0000-01-01T00:00:00.000Z");
        assert_eq!(canonical(json!(first.clone())).as_deref(), Some(first.as_str()));
    }

    #[test]
    fn out_of_range_epoch_is_a_malformed_timestamp() {
        let schema = FieldSchema::new(vec![FieldDefinition::new("timestamp", FieldType::Datetime)]).unwrap();
        let mut payload = Payload::default();
        payload.insert("timestamp", json!(253402300800000_i64));

        let err = normalize(&schema, payload).unwrap_err();
        assert_eq!(err.field, "timestamp");
        assert_eq!(err.value, json!(253402300800000_i64));
    }

    #[test]
    fn unparseable_values_are_rejected() {
        for input in [json!("yesterday"), json!(""), json!("2021-13-01"), json!(true), json!({})] {
            assert_eq!(canonical(input.clone()), None, "input {input}");
        }
    }

    #[test]
    fn normalize_touches_only_datetime_fields() {
        let schema = FieldSchema::new(vec![
            FieldDefinition::new("timestamp", FieldType::Datetime),
            FieldDefinition::new("label", FieldType::String),
            FieldDefinition::new("properties", FieldType::Object),
        ])
        .unwrap();
        let mut payload = Payload::default();
        payload.insert("timestamp", json!("2021-01-01"));
        payload.insert("label", json!("2021-01-01"));
        payload.insert("properties", json!({ "nested": { "at": "2021-01-01" } }));

        let normalized = normalize(&schema, payload).unwrap();
        assert_eq!(normalized.get("timestamp"), Some(&json!("2021-01-01T00:00:00.000Z")));
        assert_eq!(normalized.get("label"), Some(&json!("2021-01-01")));
        assert_eq!(
            normalized.get("properties"),
            Some(&json!({ "nested": { "at": "2021-01-01" } }))
        );
    }

    #[test]
    fn malformed_timestamp_names_the_field() {
        let schema = FieldSchema::new(vec![FieldDefinition::new("timestamp", FieldType::Datetime)]).unwrap();
        let mut payload = Payload::default();
        payload.insert("timestamp", json!("not a date"));

        let err = normalize(&schema, payload).unwrap_err();
        assert_eq!(err.field, "timestamp");
        assert_eq!(err.value, json!("not a date"));
    }
}
