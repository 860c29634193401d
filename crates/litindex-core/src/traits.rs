use std::path::Path;

use crate::error::Result;
use crate::schema::Schema;
use crate::types::{Document, OpenMode};

/// A concrete index storage engine.
pub trait IndexBackend: Send + Sync {
    /// Acquire exclusive write access to the store at `store`.
    ///
    /// `Create` resets the store before returning. `Append` keeps existing
    /// content and fails with `SchemaMismatch` when it was built with a
    /// different schema.
    fn open(&self, store: &Path, mode: OpenMode, schema: &Schema) -> Result<Box<dyn WriterSession>>;
}

/// One exclusive write session. Dropping a session without `close`
/// releases the store but discards uncommitted inserts.
pub trait WriterSession {
    fn insert(&mut self, doc: Document) -> Result<()>;

    /// Commit everything inserted so far; returns the committed document count.
    fn flush(&mut self) -> Result<u64>;

    /// Commit and release the store; returns the committed document count.
    fn close(self: Box<Self>) -> Result<u64>;
}
