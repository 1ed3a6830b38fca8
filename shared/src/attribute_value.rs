//! Decoding of DynamoDB-style tagged attribute values (`{"S": "..."}`, `{"N": "..."}`, ...)
//! into plain JSON values.

use serde_json::{Map, Number, Value};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("expected a tagged attribute value, found `{0}`")]
    NotATaggedValue(String),
    #[error("expected a map of tagged attribute values, found `{0}`")]
    NotATaggedMap(String),
    #[error("attribute value carries no type tag")]
    MissingTag,
    #[error("attribute value carries more than one type tag: {0:?}")]
    MultipleTags(Vec<String>),
    #[error("unknown attribute type tag `{0}`")]
    UnknownTag(String),
    #[error("`{tag}` payload must be {expected}")]
    InvalidPayload { tag: String, expected: &'static str },
    #[error("`{0}` is not a valid number literal")]
    InvalidNumber(String),
    #[error("field `{field}`: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<DecodeError>,
    },
}

/// Decodes a single tagged value.
pub fn decode(value: &Value) -> Result<Value, DecodeError> {
    let attribute = value
        .as_object()
        .ok_or_else(|| DecodeError::NotATaggedValue(value.to_string()))?;

    let mut entries = attribute.iter();
    let (tag, payload) = match (entries.next(), entries.next()) {
        (None, _) => return Err(DecodeError::MissingTag),
        (Some(entry), None) => entry,
        (Some(_), Some(_)) => {
            return Err(DecodeError::MultipleTags(attribute.keys().cloned().collect()))
        }
    };

    match tag.as_str() {
        "S" | "B" => string_payload(tag, payload).map(|s| Value::String(s.to_string())),
        "N" => string_payload(tag, payload).and_then(parse_number),
        "BOOL" => payload
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| invalid_payload(tag, "a boolean")),
        "NULL" => Ok(Value::Null),
        "L" => array_payload(tag, payload)?
            .iter()
            .map(decode)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        "M" => {
            let fields = payload
                .as_object()
                .ok_or_else(|| invalid_payload(tag, "an object"))?;
            decode_fields(fields).map(Value::Object)
        }
        "SS" | "BS" => array_payload(tag, payload)?
            .iter()
            .map(|item| string_payload(tag, item).map(|s| Value::String(s.to_string())))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        "NS" => array_payload(tag, payload)?
            .iter()
            .map(|item| string_payload(tag, item).and_then(parse_number))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Err(DecodeError::UnknownTag(other.to_string())),
    }
}

/// Decodes every value of a tagged map.
///
/// Returns `Ok(None)` when the map is absent, null or empty: a change record may legitimately
/// carry no `NewImage` or `OldImage`.
pub fn decode_map(map: Option<&Value>) -> Result<Option<Map<String, Value>>, DecodeError> {
    match map {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(fields)) if fields.is_empty() => Ok(None),
        Some(Value::Object(fields)) => decode_fields(fields).map(Some),
        Some(other) => Err(DecodeError::NotATaggedMap(other.to_string())),
    }
}

fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, DecodeError> {
    fields
        .iter()
        .map(|(field, value)| {
            decode(value)
                .map(|decoded| (field.clone(), decoded))
                .map_err(|e| DecodeError::Field {
                    field: field.clone(),
                    source: Box::new(e),
                })
        })
        .collect()
}

/// Integers that fit in i64 or u64 stay exact. Anything else becomes the nearest f64, so
/// literals with more than ~17 significant digits lose precision.
fn parse_number(literal: &str) -> Result<Value, DecodeError> {
    if let Ok(n) = literal.parse::<i64>() {
        return Ok(Value::Number(n.into()));
    }
    if let Ok(n) = literal.parse::<u64>() {
        return Ok(Value::Number(n.into()));
    }
    literal
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| DecodeError::InvalidNumber(literal.to_string()))
}

fn string_payload<'a>(tag: &str, payload: &'a Value) -> Result<&'a str, DecodeError> {
    payload
        .as_str()
        .ok_or_else(|| invalid_payload(tag, "a string"))
}

fn array_payload<'a>(tag: &str, payload: &'a Value) -> Result<&'a Vec<Value>, DecodeError> {
    payload
        .as_array()
        .ok_or_else(|| invalid_payload(tag, "an array"))
}

fn invalid_payload(tag: &str, expected: &'static str) -> DecodeError {
    DecodeError::InvalidPayload {
        tag: tag.to_string(),
        expected,
    }
}
