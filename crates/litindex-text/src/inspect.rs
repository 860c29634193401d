use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use tantivy::collector::{Count, TopDocs};
use tantivy::query::{AllQuery, Query, QueryParser, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{Index, IndexReader, ReloadPolicy, TantivyDocument, Term};

use crate::tantivy_utils::SEQUENCE_FIELD;

/// Stored fields of one committed document, by field name.
pub type StoredFields = BTreeMap<String, Vec<String>>;

/// Read-only view over a closed store, used to check what a batch committed.
pub struct StoreInspector {
	index: Index,
	reader: IndexReader,
}

impl StoreInspector {
	pub fn open(store: &Path) -> Result<Self, anyhow::Error> {
		let index = Index::open_in_dir(store)?;
		crate::tantivy_utils::register_tokenizer(&index);
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		Ok(Self { index, reader })
	}

	pub fn num_docs(&self) -> u64 { self.reader.searcher().num_docs() }

	/// Every committed document, in insertion order.
	pub fn documents(&self) -> Result<Vec<StoredFields>> { self.collect(&AllQuery) }

	/// Documents whose exact-match field `field` equals `value`, in insertion order.
	pub fn lookup(&self, field: &str, value: &str) -> Result<Vec<StoredFields>> {
		let handle = self.index.schema().get_field(field)?;
		self.collect(&TermQuery::new(Term::from_field_text(handle, value), IndexRecordOption::Basic))
	}

	fn collect(&self, query: &dyn Query) -> Result<Vec<StoredFields>> {
		let schema = self.index.schema();
		let sequence = schema.get_field(SEQUENCE_FIELD)?;
		let searcher = self.reader.searcher();
		let limit = (searcher.num_docs() as usize).max(1);
		let mut docs = Vec::new();
		for (_, addr) in searcher.search(query, &TopDocs::with_limit(limit))? {
			let doc: TantivyDocument = searcher.doc(addr)?;
			let seq = doc.get_first(sequence).and_then(|v| v.as_u64()).ok_or_else(|| anyhow::anyhow!("document without {}", SEQUENCE_FIELD))?;
			docs.push((seq, doc));
		}
		docs.sort_by_key(|(seq, _)| *seq);

		let mut out = Vec::with_capacity(docs.len());
		for (_, doc) in docs {
			let mut stored = StoredFields::new();
			for (handle, entry) in schema.fields() {
				if !entry.is_stored() || handle == sequence { continue; }
				let values: Vec<String> = doc.get_all(handle).filter_map(|v| v.as_str().map(str::to_string)).collect();
				if !values.is_empty() { stored.insert(entry.name().to_string(), values); }
			}
			out.push(stored);
		}
		Ok(out)
	}

	/// Number of documents whose numeric field lies in `[low, high]`.
	pub fn count_range(&self, field: &str, low: i64, high: i64) -> Result<usize> {
		let parser = QueryParser::for_index(&self.index, vec![]);
		let query = parser.parse_query(&format!("{}:[{} TO {}]", field, low, high))?;
		Ok(self.reader.searcher().search(&query, &Count)?)
	}

	/// Number of documents whose exact-match field `field` equals `value`.
	pub fn count_exact(&self, field: &str, value: &str) -> Result<usize> {
		let handle = self.index.schema().get_field(field)?;
		let query = TermQuery::new(Term::from_field_text(handle, value), IndexRecordOption::Basic);
		Ok(self.reader.searcher().search(&query, &Count)?)
	}
}
