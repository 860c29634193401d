use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tantivy::schema::Field;
use tantivy::{Index, IndexWriter, ReloadPolicy, TantivyDocument};
use tracing::{debug, info};

use litindex_core::config::MIN_WRITER_HEAP_BYTES;
use litindex_core::traits::{IndexBackend, WriterSession};
use litindex_core::{Document, Error, FieldTreatment, FieldValue, OpenMode, Result, Schema};

use crate::tantivy_utils::{build_schema, register_tokenizer, same_fields, SEQUENCE_FIELD};

pub const DEFAULT_WRITER_HEAP_BYTES: usize = 50_000_000;

/// Tantivy index directories as document stores.
#[derive(Debug, Clone)]
pub struct TantivyBackend {
	heap_bytes: usize,
}

impl Default for TantivyBackend {
	fn default() -> Self { Self { heap_bytes: DEFAULT_WRITER_HEAP_BYTES } }
}

impl TantivyBackend {
	pub fn new(heap_bytes: usize) -> Self { Self { heap_bytes: heap_bytes.max(MIN_WRITER_HEAP_BYTES) } }

	fn open_index(store: &Path, mode: OpenMode, expected: &tantivy::schema::Schema) -> Result<Index> {
		let unavailable = |e: &dyn std::fmt::Display| Error::store_unavailable(store, e);
		let exists = store.join("meta.json").exists();
		if mode == OpenMode::Append && exists {
			let index = Index::open_in_dir(store).map_err(|e| unavailable(&e))?;
			if !same_fields(&index.schema(), expected) {
				return Err(Error::SchemaMismatch {
					store: store.to_path_buf(),
					reason: "stored field catalog differs from the requested schema".to_string(),
				});
			}
			return Ok(index);
		}
		if mode == OpenMode::Create && store.exists() { std::fs::remove_dir_all(store).map_err(|e| unavailable(&e))?; }
		std::fs::create_dir_all(store).map_err(|e| unavailable(&e))?;
		Index::create_in_dir(store, expected.clone()).map_err(|e| unavailable(&e))
	}

	/// One past the highest sequence number already committed, 0 for an empty store.
	fn next_sequence(index: &Index) -> tantivy::Result<u64> {
		let searcher = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?.searcher();
		let mut next = 0;
		for segment in searcher.segment_readers() {
			if segment.max_doc() == 0 { continue; }
			let column = segment.fast_fields().u64(SEQUENCE_FIELD)?;
			next = next.max(column.max_value() + 1);
		}
		Ok(next)
	}
}

impl IndexBackend for TantivyBackend {
	fn open(&self, store: &Path, mode: OpenMode, schema: &Schema) -> Result<Box<dyn WriterSession>> {
		let expected = build_schema(schema)?;
		let index = Self::open_index(store, mode, &expected)?;
		register_tokenizer(&index);
		let next_seq = Self::next_sequence(&index).map_err(|e| Error::store_unavailable(store, e))?;
		let writer: IndexWriter = index.writer_with_num_threads(1, self.heap_bytes).map_err(|e| Error::store_unavailable(store, e))?;
		let mut fields = HashMap::new();
		for (name, _) in schema.fields() {
			let field = expected.get_field(name).map_err(|e| Error::store_unavailable(store, e))?;
			fields.insert(name.to_string(), field);
		}
		let sequence = expected.get_field(SEQUENCE_FIELD).map_err(|e| Error::store_unavailable(store, e))?;
		info!(store = %store.display(), %mode, next_seq, "opened tantivy store");
		Ok(Box::new(TantivySession {
			store: store.to_path_buf(),
			schema: schema.clone(),
			index,
			writer,
			fields,
			sequence,
			next_seq,
			pending: 0,
		}))
	}
}

pub struct TantivySession {
	store: PathBuf,
	schema: Schema,
	index: Index,
	writer: IndexWriter,
	fields: HashMap<String, Field>,
	sequence: Field,
	next_seq: u64,
	pending: usize,
}

impl TantivySession {
	fn committed_count(&self) -> Result<u64> {
		let reader = self.index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().map_err(|e| Error::store_unavailable(&self.store, e))?;
		Ok(reader.searcher().num_docs())
	}

	fn to_tantivy(&self, doc: &Document) -> Result<TantivyDocument> {
		let mut out = TantivyDocument::default();
		for entry in doc.iter() {
			let field = *self.fields.get(&entry.name).ok_or_else(|| Error::UnknownField(entry.name.clone()))?;
			match (entry.treatment, &entry.value) {
				(FieldTreatment::NumericPoint, FieldValue::Integer(v)) => out.add_i64(field, *v),
				(FieldTreatment::StoredOnly | FieldTreatment::TokenizedStored, FieldValue::Text(s))
				| (FieldTreatment::ExactStored | FieldTreatment::ExactNotStored, FieldValue::Token(s)) => out.add_text(field, s),
				(treatment, _) => return Err(Error::ValueMismatch { field: entry.name.clone(), treatment: treatment.name() }),
			}
		}
		Ok(out)
	}
}

impl WriterSession for TantivySession {
	fn insert(&mut self, doc: Document) -> Result<()> {
		self.schema.check(&doc)?;
		let mut tdoc = self.to_tantivy(&doc)?;
		tdoc.add_u64(self.sequence, self.next_seq);
		self.writer.add_document(tdoc).map_err(|e| Error::store_unavailable(&self.store, e))?;
		self.next_seq += 1;
		self.pending += 1;
		debug!(fields = doc.len(), "document buffered");
		Ok(())
	}

	fn flush(&mut self) -> Result<u64> {
		self.writer.commit().map_err(|e| Error::store_unavailable(&self.store, e))?;
		debug!(documents = self.pending, "committed");
		self.pending = 0;
		self.committed_count()
	}

	fn close(mut self: Box<Self>) -> Result<u64> {
		let committed = self.flush()?;
		let TantivySession { store, writer, .. } = *self;
		writer.wait_merging_threads().map_err(|e| Error::store_unavailable(&store, e))?;
		info!(store = %store.display(), committed, "closed tantivy store");
		Ok(committed)
	}
}
