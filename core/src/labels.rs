//! Typed labels parsed from request query parameters.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// A single label value after string coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LabelValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl LabelValue {
    /// Coerce a raw query string: integer, then float, then
    /// case-insensitive boolean, otherwise the string itself.
    ///
    /// Numbers may carry surrounding whitespace and single `_` separators
    /// between digits (`" 3"`, `"1_000"`). Non-finite floats ("nan", "inf")
    /// stay strings since they have no JSON form.
    pub fn parse(raw: &str) -> Self {
        if let Some(number) = numeric_text(raw) {
            if let Ok(int) = number.parse::<i64>() {
                return LabelValue::Int(int);
            }
            if let Ok(float) = number.parse::<f64>() {
                if float.is_finite() {
                    return LabelValue::Float(float);
                }
            }
        }
        match raw.to_ascii_lowercase().as_str() {
            "true" => LabelValue::Bool(true),
            "false" => LabelValue::Bool(false),
            _ => LabelValue::Str(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LabelValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            LabelValue::Int(i) => Value::from(*i),
            LabelValue::Float(f) => Value::from(*f),
            LabelValue::Bool(b) => Value::Bool(*b),
            LabelValue::Str(s) => Value::String(s.clone()),
        }
    }
}

/// Trimmed text with digit separators removed, or `None` when an `_` is
/// not flanked by digits on both sides.
fn numeric_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !trimmed.contains('_') {
        return Some(trimmed.to_string());
    }
    let chars: Vec<char> = trimmed.chars().collect();
    let mut out = String::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            let before = i > 0 && chars[i - 1].is_ascii_digit();
            let after = chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
            if !(before && after) {
                return None;
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

impl fmt::Display for LabelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelValue::Int(i) => write!(f, "{}", i),
            LabelValue::Float(v) => write!(f, "{}", v),
            LabelValue::Bool(b) => write!(f, "{}", b),
            LabelValue::Str(s) => f.write_str(s),
        }
    }
}

/// Ordered label map. Keys keep the order in which they first appeared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelSet {
    entries: Vec<(String, LabelValue)>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw query pairs. A repeated key keeps its first value.
    pub fn from_query<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut labels = Self::new();
        for (key, raw) in pairs {
            let key = key.into();
            if labels.contains_key(&key) {
                continue;
            }
            let value = LabelValue::parse(raw.as_ref());
            labels.entries.push((key, value));
        }
        labels
    }

    pub fn insert(&mut self, key: impl Into<String>, value: LabelValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&LabelValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LabelValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json_map(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }
}

impl Serialize for LabelSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", k, v.to_json())?;
        }
        f.write_str("}")
    }
}
