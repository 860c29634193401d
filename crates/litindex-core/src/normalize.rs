//! Raw row to [`Document`] conversion.

use tracing::debug;

use crate::date::DateValue;
use crate::error::{Error, Result};
use crate::schema::{FieldRole, FieldTreatment, Schema};
use crate::types::{Document, FieldValue, RawRecord};

pub const DEFAULT_DELIMITER: &str = " ";

#[derive(Debug, Clone)]
pub struct Normalizer {
    delimiter: String,
}

impl Default for Normalizer {
    fn default() -> Self { Self { delimiter: DEFAULT_DELIMITER.to_string() } }
}

impl Normalizer {
    pub fn new(delimiter: &str) -> Result<Self> {
        if delimiter.is_empty() {
            return Err(Error::InvalidConfig("multi-valued delimiter must not be empty".to_string()));
        }
        Ok(Self { delimiter: delimiter.to_string() })
    }

    /// Build the document for one row, walking the schema in order.
    ///
    /// Columns the schema does not name are ignored. Null or missing columns
    /// are omitted; an empty string still produces a field.
    pub fn normalize(&self, raw: &RawRecord, schema: &Schema) -> Result<Document> {
        let mut doc = Document::new();
        for spec in schema.entries() {
            let Some(text) = raw.text(&spec.column) else {
                debug!(column = %spec.column, "null column omitted");
                continue;
            };
            match &spec.role {
                FieldRole::Plain => {
                    let value = spec.treatment.value_from_text(&spec.name, &text)?;
                    doc.add(&spec.name, spec.treatment, value);
                }
                FieldRole::Date { raw_twin } => {
                    let date = DateValue::parse(&spec.name, &text)?;
                    doc.add(&spec.name, FieldTreatment::NumericPoint, FieldValue::Integer(date.ordinal()));
                    doc.add(raw_twin, FieldTreatment::ExactStored, FieldValue::Token(date.raw().to_string()));
                }
                FieldRole::MultiValued => {
                    for token in text.split(self.delimiter.as_str()).filter(|t| !t.is_empty()) {
                        doc.add_repeated(&spec.name, spec.treatment, FieldValue::Token(token.to_string()));
                    }
                }
            }
        }
        Ok(doc)
    }
}

/// Normalize with the default single-space delimiter.
pub fn normalize(raw: &RawRecord, schema: &Schema) -> Result<Document> {
    Normalizer::default().normalize(raw, schema)
}
