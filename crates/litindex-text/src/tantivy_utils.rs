use tantivy::schema::{IndexRecordOption, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

use litindex_core::{Error, FieldTreatment, Result, Schema};

pub const TEXT_ANALYZER: &str = "publication_text";

/// Hidden per-document insertion counter. Segment merges reorder doc ids,
/// so read-back order comes from this field.
pub const SEQUENCE_FIELD: &str = "_seq";

/// Translate a field catalog into a tantivy schema, one field per
/// index-level name, in catalog order, followed by the sequence field.
pub fn build_schema(schema: &Schema) -> Result<tantivy::schema::Schema> {
	let mut schema_builder = tantivy::schema::Schema::builder();
	for (name, treatment) in schema.fields() {
		if name == SEQUENCE_FIELD {
			return Err(Error::InvalidConfig(format!("field name '{}' is reserved", SEQUENCE_FIELD)));
		}
		match treatment {
			FieldTreatment::StoredOnly => { schema_builder.add_text_field(name, TextOptions::default().set_stored()); }
			FieldTreatment::TokenizedStored => {
				let indexing = TextFieldIndexing::default().set_tokenizer(TEXT_ANALYZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
				schema_builder.add_text_field(name, TextOptions::default().set_indexing_options(indexing).set_stored());
			}
			FieldTreatment::ExactStored => { schema_builder.add_text_field(name, STRING | STORED); }
			FieldTreatment::ExactNotStored => { schema_builder.add_text_field(name, STRING); }
			FieldTreatment::NumericPoint => { schema_builder.add_i64_field(name, INDEXED | FAST); }
		}
	}
	schema_builder.add_u64_field(SEQUENCE_FIELD, INDEXED | FAST | STORED);
	Ok(schema_builder.build())
}

pub fn register_tokenizer(index: &Index) {
	let stop_words = vec![
		"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
	];
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(stop_words.into_iter().map(|s| s.to_string())))
		.build();
	index.tokenizers().register(TEXT_ANALYZER, tokenizer);
}

/// Two tantivy schemas are compatible when their serialized field entries match.
pub fn same_fields(a: &tantivy::schema::Schema, b: &tantivy::schema::Schema) -> bool {
	match (serde_json::to_value(a), serde_json::to_value(b)) {
		(Ok(a), Ok(b)) => a == b,
		_ => false,
	}
}
