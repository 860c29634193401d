//! In-process store backend. Stores live in a registry shared by clones of
//! the backend, keyed by path, and follow the same lifecycle rules as the
//! on-disk store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::traits::{IndexBackend, WriterSession};
use crate::types::{Document, OpenMode};

#[derive(Debug)]
struct MemoryStore {
    schema: Schema,
    committed: Vec<Document>,
    open: bool,
}

type Registry = Arc<Mutex<HashMap<PathBuf, MemoryStore>>>;

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    stores: Registry,
    insert_limit: Option<usize>,
    read_only: bool,
}

impl MemoryBackend {
    pub fn new() -> Self { Self::default() }

    /// Fail every insert past the first `limit` of a session with
    /// `StoreUnavailable`, as a full disk would.
    pub fn with_insert_limit(mut self, limit: usize) -> Self {
        self.insert_limit = Some(limit);
        self
    }

    /// Refuse every commit with `StoreUnavailable`, as a store whose disk
    /// turned read-only after opening would.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Committed documents of a store, in commit order.
    pub fn documents(&self, store: &Path) -> Vec<Document> {
        lock(&self.stores, store)
            .ok()
            .and_then(|stores| stores.get(store).map(|s| s.committed.clone()))
            .unwrap_or_default()
    }

    pub fn committed(&self, store: &Path) -> usize { self.documents(store).len() }

    pub fn is_open(&self, store: &Path) -> bool {
        lock(&self.stores, store).map(|stores| stores.get(store).is_some_and(|s| s.open)).unwrap_or(false)
    }
}

fn lock<'a>(stores: &'a Registry, store: &Path) -> Result<MutexGuard<'a, HashMap<PathBuf, MemoryStore>>> {
    stores.lock().map_err(|_| Error::store_unavailable(store, "store registry poisoned"))
}

impl IndexBackend for MemoryBackend {
    fn open(&self, store: &Path, mode: OpenMode, schema: &Schema) -> Result<Box<dyn WriterSession>> {
        let mut stores = lock(&self.stores, store)?;
        if stores.get(store).is_some_and(|s| s.open) {
            return Err(Error::store_unavailable(store, "another writer holds the store"));
        }
        match stores.get_mut(store) {
            Some(existing) if mode == OpenMode::Append => {
                if !existing.schema.same_fields(schema) {
                    return Err(Error::SchemaMismatch {
                        store: store.to_path_buf(),
                        reason: "field catalog differs from the one the store was built with".to_string(),
                    });
                }
                existing.open = true;
            }
            _ => {
                stores.insert(store.to_path_buf(), MemoryStore { schema: schema.clone(), committed: Vec::new(), open: true });
            }
        }
        info!(store = %store.display(), %mode, "opened in-memory store");
        Ok(Box::new(MemorySession {
            stores: Arc::clone(&self.stores),
            store: store.to_path_buf(),
            schema: schema.clone(),
            pending: Vec::new(),
            inserted: 0,
            insert_limit: self.insert_limit,
            read_only: self.read_only,
        }))
    }
}

struct MemorySession {
    stores: Registry,
    store: PathBuf,
    schema: Schema,
    pending: Vec<Document>,
    inserted: usize,
    insert_limit: Option<usize>,
    read_only: bool,
}

impl WriterSession for MemorySession {
    fn insert(&mut self, doc: Document) -> Result<()> {
        if self.insert_limit.is_some_and(|limit| self.inserted >= limit) {
            return Err(Error::store_unavailable(&self.store, "insert limit reached"));
        }
        self.schema.check(&doc)?;
        self.pending.push(doc);
        self.inserted += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<u64> {
        if self.read_only {
            return Err(Error::store_unavailable(&self.store, "store is read-only"));
        }
        let mut stores = lock(&self.stores, &self.store)?;
        let entry = stores.get_mut(&self.store).ok_or_else(|| Error::store_unavailable(&self.store, "store vanished"))?;
        entry.committed.append(&mut self.pending);
        Ok(entry.committed.len() as u64)
    }

    fn close(mut self: Box<Self>) -> Result<u64> {
        // Drop releases the store whether or not the flush succeeds.
        self.flush()
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        if let Ok(mut stores) = self.stores.lock() {
            if let Some(entry) = stores.get_mut(&self.store) {
                entry.open = false;
            }
        }
    }
}
