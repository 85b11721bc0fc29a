//! Typed view of the metadata the server attaches to every element.
//!
//! Five well-known keys get converted (see
//! <http://wiki.openstreetmap.org/wiki/Elements#Common_attributes>), everything else
//! is kept the way the server sent it.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::errors::{Error, Result};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub type Attributes = HashMap<String, AttributeValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Timestamp(NaiveDateTime),
    Bool(bool),
    /// Non-string JSON value of an attribute without a conversion rule.
    Json(Value),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(text) => Some(text),
            AttributeValue::Json(Value::String(text)) => Some(text),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&NaiveDateTime> {
        match self {
            AttributeValue::Timestamp(value) => Some(value),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => AttributeValue::Text(text),
            other => AttributeValue::Json(other),
        }
    }
}

type Conversion = fn(&str, AttributeValue) -> Result<AttributeValue>;

/// Conversion rules, applied once per element when it is decoded.
const RULES: [(&str, Conversion); 5] = [
    ("changeset", to_integer),
    ("timestamp", to_timestamp),
    ("uid", to_integer),
    ("version", to_integer),
    ("visible", to_bool),
];

/// Apply the conversion rules to a raw attribute map.
///
/// Missing well-known keys are fine. A well-known key whose value does not have the
/// expected format is a [`Error::Format`].
pub fn normalize(mut attributes: Attributes) -> Result<Attributes> {
    for (key, convert) in RULES {
        if let Some(value) = attributes.remove(key) {
            attributes.insert(key.to_string(), convert(key, value)?);
        }
    }
    Ok(attributes)
}

fn to_integer(key: &str, value: AttributeValue) -> Result<AttributeValue> {
    let parsed = match &value {
        AttributeValue::Integer(value) => Some(*value),
        AttributeValue::Text(text) => text.trim().parse().ok(),
        AttributeValue::Json(value) => value.as_i64(),
        _ => None,
    };
    parsed
        .map(AttributeValue::Integer)
        .ok_or_else(|| Error::format(format!("invalid integer {value:?} for attribute '{key}'")))
}

fn to_timestamp(key: &str, value: AttributeValue) -> Result<AttributeValue> {
    match value {
        AttributeValue::Timestamp(_) => Ok(value),
        AttributeValue::Text(text) => NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT)
            .map(AttributeValue::Timestamp)
            .map_err(|err| {
                Error::format(format!("invalid timestamp '{text}' for attribute '{key}': {err}"))
            }),
        other => Err(Error::format(format!(
            "invalid timestamp {other:?} for attribute '{key}'"
        ))),
    }
}

fn to_bool(key: &str, value: AttributeValue) -> Result<AttributeValue> {
    match value {
        AttributeValue::Bool(_) => Ok(value),
        AttributeValue::Text(text) => Ok(AttributeValue::Bool(text.eq_ignore_ascii_case("true"))),
        AttributeValue::Json(Value::Bool(flag)) => Ok(AttributeValue::Bool(flag)),
        other => Err(Error::format(format!(
            "invalid boolean {other:?} for attribute '{key}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), AttributeValue::from(*value)))
            .collect()
    }

    #[test]
    fn converts_well_known_keys() {
        let attributes = normalize(raw(&[
            ("uid", "345678"),
            ("timestamp", "2014-12-14T07:27:19Z"),
            ("visible", "true"),
        ]))
        .unwrap();

        let expected_ts = NaiveDate::from_ymd_opt(2014, 12, 14)
            .unwrap()
            .and_hms_opt(7, 27, 19)
            .unwrap();
        assert_eq!(attributes["uid"], AttributeValue::Integer(345678));
        assert_eq!(attributes["timestamp"], AttributeValue::Timestamp(expected_ts));
        assert_eq!(attributes["visible"], AttributeValue::Bool(true));
    }

    #[test]
    fn keeps_other_keys_raw() {
        let attributes = normalize(raw(&[("user", "Kesä"), ("changeset", "27178440")])).unwrap();
        assert_eq!(attributes["user"].as_str(), Some("Kesä"));
        assert_eq!(attributes["changeset"].as_i64(), Some(27178440));
        assert_eq!(attributes.len(), 2);
    }

    #[test]
    fn visible_is_case_insensitive() {
        let attributes = normalize(raw(&[("visible", "TRUE")])).unwrap();
        assert_eq!(attributes["visible"].as_bool(), Some(true));
        let attributes = normalize(raw(&[("visible", "no")])).unwrap();
        assert_eq!(attributes["visible"].as_bool(), Some(false));
    }

    #[test]
    fn accepts_json_natives() {
        let mut attributes = Attributes::new();
        attributes.insert("version".into(), json!(3).into());
        attributes.insert("visible".into(), json!(false).into());
        attributes.insert("tainted".into(), json!(1.5).into());
        let attributes = normalize(attributes).unwrap();
        assert_eq!(attributes["version"].as_i64(), Some(3));
        assert_eq!(attributes["visible"].as_bool(), Some(false));
        assert_eq!(attributes["tainted"], AttributeValue::Json(json!(1.5)));
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(matches!(
            normalize(raw(&[("uid", "abc")])),
            Err(Error::Format(_))
        ));
        assert!(matches!(
            normalize(raw(&[("timestamp", "2014-12-14 07:27:19")])),
            Err(Error::Format(_))
        ));
    }
}
