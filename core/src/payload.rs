//! Data payloads and the view validators/actors get of a request half.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde_json::{Map, Value};

use crate::error::InputError;
use crate::target::Target;
use crate::labels::{LabelSet, LabelValue};

/// Filename used for base64 uploads that carry no `filename` label.
pub const DEFAULT_FILENAME: &str = "input";

/// An uploaded file held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePayload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl FilePayload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn extension(&self) -> String {
        extension_of(&self.filename)
    }
}

/// Extension of `filename` including the leading dot, empty when there is none.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

/// The primary content of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum DataPayload {
    File(FilePayload),
    Json(Value),
}

impl DataPayload {
    /// Decode a base64 string, ignoring any data-URI header before the last comma.
    pub fn from_base64(raw: &str, filename: impl Into<String>) -> Result<Self, InputError> {
        let encoded = raw.rsplit(',').next().unwrap_or(raw).trim();
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| InputError::Malformed(format!("invalid base64 payload ({})", e)))?;
        Ok(DataPayload::File(FilePayload::new(filename, bytes)))
    }

    /// Pick the data out of a JSON body: the whole body when `tag` is empty,
    /// otherwise the field named by `tag`.
    pub fn from_json_body(body: Value, tag: &str) -> Result<Self, InputError> {
        let data = if tag.is_empty() {
            body
        } else {
            match body {
                Value::Object(mut map) => map.remove(tag).unwrap_or(Value::Null),
                _ => Value::Null,
            }
        };
        if is_empty_value(&data) {
            return Err(InputError::MissingData(tag.to_string()));
        }
        Ok(DataPayload::Json(data))
    }

    /// Filename of an uploaded file, or the `filename` field of a JSON object.
    pub fn filename(&self) -> Option<&str> {
        match self {
            DataPayload::File(file) => Some(file.filename.as_str()),
            DataPayload::Json(Value::Object(map)) => map.get("filename").and_then(Value::as_str),
            DataPayload::Json(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            DataPayload::File(file) => file.bytes.is_empty(),
            DataPayload::Json(value) => is_empty_value(value),
        }
    }
}

impl fmt::Display for DataPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataPayload::File(file) => write!(
                f,
                "<file '{}' ({} bytes)>",
                file.filename,
                file.bytes.len()
            ),
            DataPayload::Json(value) => write!(f, "{}", value),
        }
    }
}

/// Missing-data rule for request values: null, false, zero, and empty
/// strings/arrays/objects all count as "no data".
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Runtime kind of a field, named after the type vocabulary used in configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Str,
    Int,
    Float,
    Bool,
    Null,
    List,
    Dict,
}

impl ValueKind {
    pub fn of_label(value: &LabelValue) -> Self {
        match value {
            LabelValue::Int(_) => ValueKind::Int,
            LabelValue::Float(_) => ValueKind::Float,
            LabelValue::Bool(_) => ValueKind::Bool,
            LabelValue::Str(_) => ValueKind::Str,
        }
    }

    pub fn of_json(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(n) if n.is_f64() => ValueKind::Float,
            Value::Number(_) => ValueKind::Int,
            Value::String(_) => ValueKind::Str,
            Value::Array(_) => ValueKind::List,
            Value::Object(_) => ValueKind::Dict,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Str => "str",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Bool => "bool",
            ValueKind::Null => "null",
            ValueKind::List => "list",
            ValueKind::Dict => "dict",
        };
        f.write_str(name)
    }
}

/// One half of a request as seen by a validator or actor.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Labels(&'a LabelSet),
    Data(&'a DataPayload),
}

impl<'a> Subject<'a> {
    pub fn target(&self) -> Target {
        match self {
            Subject::Labels(_) => Target::Labels,
            Subject::Data(_) => Target::Data,
        }
    }

    /// Key set of a mapping-shaped subject. Files and non-object JSON have none.
    pub fn keys(&self) -> Option<BTreeSet<&'a str>> {
        match *self {
            Subject::Labels(labels) => Some(labels.keys().collect()),
            Subject::Data(DataPayload::Json(Value::Object(map))) => {
                Some(map.keys().map(String::as_str).collect())
            }
            Subject::Data(_) => None,
        }
    }

    /// Kind of the named field, `None` when the field is absent.
    pub fn field_kind(&self, field: &str) -> Option<ValueKind> {
        match *self {
            Subject::Labels(labels) => labels.get(field).map(ValueKind::of_label),
            Subject::Data(DataPayload::Json(Value::Object(map))) => {
                map.get(field).map(ValueKind::of_json)
            }
            Subject::Data(_) => None,
        }
    }

    pub fn filename(&self) -> Option<String> {
        match *self {
            Subject::Labels(labels) => labels.get("filename").map(ToString::to_string),
            Subject::Data(data) => data.filename().map(str::to_string),
        }
    }

    /// The subject as a JSON object, when it has that shape.
    pub fn to_document(&self) -> Option<Map<String, Value>> {
        match *self {
            Subject::Labels(labels) => Some(labels.to_json_map()),
            Subject::Data(DataPayload::Json(Value::Object(map))) => Some(map.clone()),
            Subject::Data(_) => None,
        }
    }

    pub fn file(&self) -> Option<&'a FilePayload> {
        match *self {
            Subject::Data(DataPayload::File(file)) => Some(file),
            _ => None,
        }
    }
}

impl fmt::Display for Subject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Labels(labels) => write!(f, "{}", labels),
            Subject::Data(data) => write!(f, "{}", data),
        }
    }
}
