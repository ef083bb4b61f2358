//! Record values
//!
//! A [`Record`] is a populated instance of a resource schema: field name to
//! value, in declaration order. A field that is not set has no entry at all.
//! Decoding goes through the compiled [`RecordShape`], so the same rules apply
//! whether the input is caller configuration or a live object:
//!
//! - `null` and missing keys are unset
//! - empty lists, empty maps and objects with nothing set are pruned
//! - keys the shape does not declare (`status`, `managedFields`, ...) are dropped
//! - list elements keep their position, including empty objects

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::compiler::{RecordShape, ShapeKind};
use crate::error::{CoreError, Result};
use crate::field::Primitive;

/// One set value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    /// Kept as parsed, so `5` stays `5`
    Number(serde_json::Number),
    Bool(bool),
    Json(JsonValue),
    List(Vec<FieldValue>),
    /// Keys serialize in lexicographic order
    Map(BTreeMap<String, String>),
    Object(Record),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Object(r) => Some(r),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Number(n) => n.serialize(serializer),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Json(v) => v.serialize(serializer),
            Self::List(items) => items.serialize(serializer),
            Self::Map(map) => map.serialize(serializer),
            Self::Object(record) => record.serialize(serializer),
        }
    }
}

/// Ordered set fields of an object
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, FieldValue>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a JSON object through an object shape
    ///
    /// Fails with [`CoreError::ShapeMismatch`] when a value does not have the
    /// declared type; configuration is validated before decoding, so for
    /// caller input this indicates a defect rather than a user error.
    pub fn decode(shape: &RecordShape, value: &JsonValue) -> Result<Self> {
        match &shape.kind {
            ShapeKind::Object(children) => {
                decode_object(children, value, &shape.name).map(Option::unwrap_or_default)
            }
            _ => Err(mismatch(&shape.name, "root shape is not an object")),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.0.insert(name.into(), value)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    /// Value at a dotted path of object fields
    pub fn get_path(&self, path: &str) -> Option<&FieldValue> {
        let mut parts = path.split('.');
        let mut current = self.get(parts.next()?)?;
        for part in parts {
            current = current.as_record()?.get(part)?;
        }
        Some(current)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn mismatch(path: &str, message: impl Into<String>) -> CoreError {
    CoreError::ShapeMismatch {
        path: if path.is_empty() {
            "(root)".to_string()
        } else {
            path.to_string()
        },
        message: message.into(),
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

/// Decode an object field; `None` when nothing inside it is set
fn decode_object(
    children: &[RecordShape],
    value: &JsonValue,
    path: &str,
) -> Result<Option<Record>> {
    let obj = match value {
        JsonValue::Null => return Ok(None),
        JsonValue::Object(obj) => obj,
        other => return Err(mismatch(path, format!("expected object, got {}", type_of(other)))),
    };

    let mut record = Record::new();
    for child in children {
        let Some(raw) = obj.get(&child.name) else {
            continue;
        };
        if let Some(decoded) = decode_field(child, raw, &child_path(path, &child.name))? {
            record.insert(child.name.clone(), decoded);
        }
    }

    Ok((!record.is_empty()).then_some(record))
}

/// Decode a field that may be unset
fn decode_field(shape: &RecordShape, value: &JsonValue, path: &str) -> Result<Option<FieldValue>> {
    if value.is_null() {
        return Ok(None);
    }

    match &shape.kind {
        ShapeKind::Object(children) => {
            Ok(decode_object(children, value, path)?.map(FieldValue::Object))
        }
        ShapeKind::List(element) => {
            let items = decode_list(element, value, path)?;
            Ok((!items.is_empty()).then_some(FieldValue::List(items)))
        }
        ShapeKind::Map => {
            let map = decode_map(value, path)?;
            Ok((!map.is_empty()).then_some(FieldValue::Map(map)))
        }
        ShapeKind::Scalar(p) => decode_scalar(*p, value, path).map(Some),
    }
}

/// Decode a list element: always present, never pruned
fn decode_element(shape: &RecordShape, value: &JsonValue, path: &str) -> Result<FieldValue> {
    match &shape.kind {
        ShapeKind::Object(children) => {
            if !value.is_object() {
                return Err(mismatch(path, format!("expected object, got {}", type_of(value))));
            }
            Ok(FieldValue::Object(
                decode_object(children, value, path)?.unwrap_or_default(),
            ))
        }
        ShapeKind::List(element) => decode_list(element, value, path).map(FieldValue::List),
        ShapeKind::Map => decode_map(value, path).map(FieldValue::Map),
        ShapeKind::Scalar(p) => {
            if value.is_null() {
                return Err(mismatch(path, "list elements cannot be null"));
            }
            decode_scalar(*p, value, path)
        }
    }
}

fn decode_list(element: &RecordShape, value: &JsonValue, path: &str) -> Result<Vec<FieldValue>> {
    let items = value
        .as_array()
        .ok_or_else(|| mismatch(path, format!("expected list, got {}", type_of(value))))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| decode_element(element, item, &format!("{}.{}", path, i)))
        .collect()
}

fn decode_map(value: &JsonValue, path: &str) -> Result<BTreeMap<String, String>> {
    let obj = value
        .as_object()
        .ok_or_else(|| mismatch(path, format!("expected map, got {}", type_of(value))))?;

    obj.iter()
        .map(|(k, v)| match v.as_str() {
            Some(s) => Ok((k.clone(), s.to_string())),
            None => Err(mismatch(
                &child_path(path, k),
                format!("expected string map value, got {}", type_of(v)),
            )),
        })
        .collect()
}

fn decode_scalar(primitive: Primitive, value: &JsonValue, path: &str) -> Result<FieldValue> {
    let decoded = match (primitive, value) {
        (Primitive::String, JsonValue::String(s)) => Some(FieldValue::String(s.clone())),
        (Primitive::Boolean, JsonValue::Bool(b)) => Some(FieldValue::Bool(*b)),
        (Primitive::Integer, JsonValue::Number(n)) => integer(n).map(FieldValue::Integer),
        (Primitive::Number, JsonValue::Number(n)) => Some(FieldValue::Number(n.clone())),
        (Primitive::IntOrString, JsonValue::String(s)) => Some(FieldValue::String(s.clone())),
        (Primitive::IntOrString, JsonValue::Number(n)) => integer(n).map(FieldValue::Integer),
        (Primitive::Json, v) => Some(FieldValue::Json(v.clone())),
        _ => None,
    };

    decoded.ok_or_else(|| {
        mismatch(
            path,
            format!("expected {}, got {}", primitive, type_of(value)),
        )
    })
}

/// Integral numbers, including floats with no fractional part (`3.0`)
fn integer(n: &serde_json::Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    // i64::MAX as f64 rounds up to 2^63, which does not fit
    let f = n.as_f64()?;
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

fn type_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "object",
    }
}
