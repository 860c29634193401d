//! Domain types shared by the normalizer and every store backend.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::schema::FieldTreatment;

/// One untyped cell of an input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawValue {
    /// Text rendering of the cell, `None` for null.
    ///
    /// Integral floats render without a fractional part so that a count
    /// column exported as `3.0` is indexed as `3`.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            RawValue::Null => None,
            RawValue::Bool(b) => Some(Cow::Owned(b.to_string())),
            RawValue::Int(i) => Some(Cow::Owned(i.to_string())),
            RawValue::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                Some(Cow::Owned(format!("{}", *f as i64)))
            }
            RawValue::Float(f) => Some(Cow::Owned(f.to_string())),
            RawValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self { RawValue::Text(s.to_string()) }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self { RawValue::Text(s) }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self { RawValue::Int(i) }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self { v.map_or(RawValue::Null, Into::into) }
}

/// One row of the input dataset: column name to untyped scalar.
///
/// Missing columns and explicit nulls read the same way; an empty string
/// is a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    columns: BTreeMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, column: &str, value: impl Into<RawValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: impl Into<RawValue>) {
        self.columns.insert(column.to_string(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&RawValue> { self.columns.get(column) }

    /// Text of a column, `None` when it is missing or null.
    pub fn text(&self, column: &str) -> Option<Cow<'_, str>> {
        self.columns.get(column).and_then(RawValue::as_text)
    }

    pub fn len(&self) -> usize { self.columns.len() }

    pub fn is_empty(&self) -> bool { self.columns.is_empty() }
}

/// A typed value ready for the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Analyzed or stored-only text.
    Text(String),
    /// Opaque exact-match token.
    Token(String),
    /// Range-queryable integer.
    Integer(i64),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Token(s) => Some(s),
            FieldValue::Integer(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocField {
    pub name: String,
    pub treatment: FieldTreatment,
    pub value: FieldValue,
    /// Entry of a repeated (multi-valued) field.
    pub repeated: bool,
}

/// The canonical unit committed to a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    fields: Vec<DocField>,
}

impl Document {
    pub fn new() -> Self { Self::default() }

    pub fn add(&mut self, name: &str, treatment: FieldTreatment, value: FieldValue) {
        self.fields.push(DocField { name: name.to_string(), treatment, value, repeated: false });
    }

    pub fn add_repeated(&mut self, name: &str, treatment: FieldTreatment, value: FieldValue) {
        self.fields.push(DocField { name: name.to_string(), treatment, value, repeated: true });
    }

    /// First single-valued entry named `name`.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name && !f.repeated).map(|f| &f.value)
    }

    /// Repeated entries named `name`, in insertion order.
    pub fn repeated(&self, name: &str) -> Vec<&FieldValue> {
        self.fields.iter().filter(|f| f.name == name && f.repeated).map(|f| &f.value).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DocField> { self.fields.iter() }

    pub fn len(&self) -> usize { self.fields.len() }

    pub fn is_empty(&self) -> bool { self.fields.is_empty() }
}

/// How a writer session treats existing store content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenMode {
    /// Discard whatever the store holds and start empty.
    Create,
    /// Keep existing documents and add new ones.
    Append,
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenMode::Create => f.write_str("create"),
            OpenMode::Append => f.write_str("append"),
        }
    }
}

impl FromStr for OpenMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(OpenMode::Create),
            "append" => Ok(OpenMode::Append),
            other => Err(Error::InvalidConfig(format!("unknown open mode '{}', expected create or append", other))),
        }
    }
}
