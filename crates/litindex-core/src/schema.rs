//! Field catalog: which columns become which index fields, and how each
//! field is encoded.
//!
//! A [`Schema`] is fixed for the lifetime of a store. The two built-in
//! catalogs ([`SchemaVariant::Publications`] and [`SchemaVariant::Cord19`])
//! describe different upstream exports and are never merged.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::{Document, FieldValue};

/// Encoding of one index field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldTreatment {
    /// Retrievable, not searchable.
    StoredOnly,
    /// Analyzed full text, retrievable.
    TokenizedStored,
    /// Single exact-match token, retrievable.
    ExactStored,
    /// Single exact-match token, not retrievable.
    ExactNotStored,
    /// Integer indexed for range queries.
    NumericPoint,
}

impl FieldTreatment {
    pub fn name(self) -> &'static str {
        match self {
            FieldTreatment::StoredOnly => "stored-only",
            FieldTreatment::TokenizedStored => "tokenized-stored",
            FieldTreatment::ExactStored => "exact-stored",
            FieldTreatment::ExactNotStored => "exact-not-stored",
            FieldTreatment::NumericPoint => "numeric-point",
        }
    }

    /// Whether `value` has the kind this treatment encodes.
    pub fn accepts(self, value: &FieldValue) -> bool {
        match self {
            FieldTreatment::StoredOnly | FieldTreatment::TokenizedStored => matches!(value, FieldValue::Text(_)),
            FieldTreatment::ExactStored | FieldTreatment::ExactNotStored => matches!(value, FieldValue::Token(_)),
            FieldTreatment::NumericPoint => matches!(value, FieldValue::Integer(_)),
        }
    }

    /// Wrap column text in the value kind this treatment expects.
    pub fn value_from_text(self, field: &str, text: &str) -> Result<FieldValue> {
        match self {
            FieldTreatment::StoredOnly | FieldTreatment::TokenizedStored => Ok(FieldValue::Text(text.to_string())),
            FieldTreatment::ExactStored | FieldTreatment::ExactNotStored => Ok(FieldValue::Token(text.to_string())),
            FieldTreatment::NumericPoint => text
                .trim()
                .parse::<i64>()
                .map(FieldValue::Integer)
                .map_err(|_| Error::ValueMismatch { field: field.to_string(), treatment: self.name() }),
        }
    }
}

impl fmt::Display for FieldTreatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// What the normalizer does with a column beyond copying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldRole {
    Plain,
    /// `YYYY` / `YYYY-MM-DD` text indexed as a `YYYYMMDD` point, with the
    /// raw text kept in `raw_twin` as an exact stored field.
    Date { raw_twin: String },
    /// Delimited string split into repeated exact stored tokens.
    MultiValued,
}

/// One catalog entry: the input column and the index field it feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub column: String,
    pub name: String,
    pub treatment: FieldTreatment,
    pub role: FieldRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    entries: Vec<FieldSpec>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder { SchemaBuilder::default() }

    pub fn for_variant(variant: SchemaVariant) -> Self {
        match variant {
            SchemaVariant::Publications => Self::publications(),
            SchemaVariant::Cord19 => Self::cord19(),
        }
    }

    /// Publication metadata with figure modalities and a figure count.
    pub fn publications() -> Self {
        Self {
            entries: vec![
                plain("docId", FieldTreatment::ExactStored),
                plain("source", FieldTreatment::ExactStored),
                plain("title", FieldTreatment::TokenizedStored),
                plain("abstract", FieldTreatment::TokenizedStored),
                date("pub_date", "publish"),
                plain("journal", FieldTreatment::ExactStored),
                plain("authors", FieldTreatment::TokenizedStored),
                plain("url", FieldTreatment::ExactStored),
                plain("pmcid", FieldTreatment::ExactStored),
                multi("modalities", "modality"),
                plain("num_figures", FieldTreatment::ExactStored),
            ],
        }
    }

    /// CORD-19 metadata export.
    pub fn cord19() -> Self {
        Self {
            entries: vec![
                plain("cord_uid", FieldTreatment::ExactStored),
                plain("source_x", FieldTreatment::ExactStored),
                plain("title", FieldTreatment::TokenizedStored),
                plain("abstract", FieldTreatment::TokenizedStored),
                date("publish_time", "publish"),
                plain("journal", FieldTreatment::ExactStored),
                plain("authors", FieldTreatment::TokenizedStored),
                plain("url", FieldTreatment::ExactStored),
                plain("pmcid", FieldTreatment::ExactStored),
                multi("modalities", "modality"),
            ],
        }
    }

    pub fn entries(&self) -> &[FieldSpec] { &self.entries }

    /// Index-level fields in catalog order, date twins right after their date.
    pub fn fields(&self) -> Vec<(&str, FieldTreatment)> {
        let mut out = Vec::with_capacity(self.entries.len() + 1);
        for spec in &self.entries {
            out.push((spec.name.as_str(), spec.treatment));
            if let FieldRole::Date { raw_twin } = &spec.role {
                out.push((raw_twin.as_str(), FieldTreatment::ExactStored));
            }
        }
        out
    }

    /// Stores built from `self` and `other` hold the same index fields.
    /// Column names do not take part.
    pub fn same_fields(&self, other: &Schema) -> bool { self.fields() == other.fields() }

    pub fn treatment(&self, name: &str) -> Result<FieldTreatment> {
        self.fields()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, t)| t)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    /// Verify that every entry of `doc` is declared here with the same
    /// treatment and carries a value of the matching kind.
    pub fn check(&self, doc: &Document) -> Result<()> {
        for field in doc.iter() {
            let declared = self.treatment(&field.name)?;
            if declared != field.treatment || !declared.accepts(&field.value) {
                return Err(Error::ValueMismatch { field: field.name.clone(), treatment: declared.name() });
            }
        }
        Ok(())
    }
}

fn plain(column: &str, treatment: FieldTreatment) -> FieldSpec {
    FieldSpec { column: column.to_string(), name: column.to_string(), treatment, role: FieldRole::Plain }
}

fn date(column: &str, raw_twin: &str) -> FieldSpec {
    FieldSpec {
        column: column.to_string(),
        name: column.to_string(),
        treatment: FieldTreatment::NumericPoint,
        role: FieldRole::Date { raw_twin: raw_twin.to_string() },
    }
}

fn multi(column: &str, name: &str) -> FieldSpec {
    FieldSpec { column: column.to_string(), name: name.to_string(), treatment: FieldTreatment::ExactStored, role: FieldRole::MultiValued }
}

/// Incremental construction of a custom catalog.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    entries: Vec<FieldSpec>,
}

impl SchemaBuilder {
    pub fn field(mut self, column: &str, treatment: FieldTreatment) -> Self {
        self.entries.push(plain(column, treatment));
        self
    }

    pub fn renamed(mut self, column: &str, name: &str, treatment: FieldTreatment) -> Self {
        self.entries.push(FieldSpec { column: column.to_string(), name: name.to_string(), treatment, role: FieldRole::Plain });
        self
    }

    pub fn date(mut self, column: &str, raw_twin: &str) -> Self {
        self.entries.push(date(column, raw_twin));
        self
    }

    pub fn multi_valued(mut self, column: &str, name: &str) -> Self {
        self.entries.push(multi(column, name));
        self
    }

    /// Fails when two entries would write the same index field.
    pub fn build(self) -> Result<Schema> {
        let schema = Schema { entries: self.entries };
        let mut seen = std::collections::HashSet::new();
        for (name, _) in schema.fields() {
            if !seen.insert(name) {
                return Err(Error::InvalidConfig(format!("field '{}' declared twice", name)));
            }
        }
        Ok(schema)
    }
}

/// Named built-in catalogs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    #[default]
    Publications,
    Cord19,
}

impl FromStr for SchemaVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "publications" => Ok(SchemaVariant::Publications),
            "cord19" => Ok(SchemaVariant::Cord19),
            other => Err(Error::InvalidConfig(format!("unknown schema '{}', expected publications or cord19", other))),
        }
    }
}
