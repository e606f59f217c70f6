use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Value of a [`Datum`]: a single string or a list of strings.
///
/// Servers sometimes emit numeric ids or booleans; those are read back in
/// their string form so callers deal with exactly two shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatumValue {
    Scalar(String),
    List(Vec<String>)
}

impl DatumValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::List(_) => None
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::Scalar(_) => None,
            Self::List(values) => Some(values)
        }
    }

    fn from_json(value: Value) -> Result<Self, String> {
        match value {
            Value::Array(values) => values
                .iter()
                .filter(|v| !v.is_null())
                .map(|v| scalar_text(v).ok_or_else(|| format!("unsupported list element: {v}")))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            other => scalar_text(&other)
                .map(Self::Scalar)
                .ok_or_else(|| format!("unsupported datum value: {other}"))
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None
    }
}

impl Serialize for DatumValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(value) => serializer.serialize_str(value),
            Self::List(values) => serializer.collect_seq(values)
        }
    }
}

impl<'de> Deserialize<'de> for DatumValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Self::from_json(raw).map_err(de::Error::custom)
    }
}

impl fmt::Display for DatumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(value) => f.write_str(value),
            Self::List(values) => f.write_str(&values.join(", "))
        }
    }
}

impl From<String> for DatumValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<&str> for DatumValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<Vec<String>> for DatumValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<&str>> for DatumValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(str::to_string).collect())
    }
}

/// A single named field: `{"name": "loan_number", "value": "0102030407"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datum {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<DatumValue>
}

impl Datum {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<DatumValue>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into())
        }
    }

    /// Builds a datum that is dropped from templates when `value` is `None`.
    #[must_use]
    pub fn optional<V: Into<DatumValue>>(name: impl Into<String>, value: Option<V>) -> Self {
        Self {
            name: name.into(),
            value: value.map(Into::into)
        }
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }

    /// Scalar value as text, `None` for lists and absent values.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.value.as_ref().and_then(DatumValue::as_str)
    }
}

/// Write-side payload. Absent-valued data never reach the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    #[serde(
        default,
        serialize_with = "serialize_present",
        deserialize_with = "crate::null_as_default"
    )]
    pub data: Vec<Datum>
}

#[allow(clippy::ptr_arg)]
fn serialize_present<S: Serializer>(data: &Vec<Datum>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(data.iter().filter(|datum| datum.is_present()))
}

impl Template {
    #[must_use]
    pub fn new(data: Vec<Datum>) -> Self {
        Self { data }
    }

    #[must_use]
    pub fn with(mut self, datum: Datum) -> Self {
        self.data.push(datum);
        self
    }

    /// Data that will actually be serialized.
    pub fn present(&self) -> impl Iterator<Item = &Datum> {
        self.data.iter().filter(|datum| datum.is_present())
    }
}

/// Root object of a write request: `{"template": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateWrapper {
    pub template: Template
}

impl TemplateWrapper {
    #[must_use]
    pub fn new(data: Vec<Datum>) -> Self {
        Self {
            template: Template::new(data)
        }
    }

    pub fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
